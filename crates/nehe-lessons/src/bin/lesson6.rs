//! Lesson 6: a spinning, texture-mapped cube.
//!
//! The texture is a generated checkerboard with a full mip chain; geometry,
//! the uniform buffer and the texture go up in a single copy pass.

use bytemuck::{Pod, Zeroable};

use nehe::device::gpu::{WgpuBackend, WgpuCommandBuffer, WgpuShader};
use nehe::device::{BufferUsage, GpuBackend, TextureFormat};
use nehe::logging::{init_logging, LoggingConfig};
use nehe::{
    AppConfig, AppImplementation, Context, DirectoryBundle, Mtx, NeHeError, Runtime, ShaderPair, Size,
};

const TEXTURE_SIZE: u32 = 64;
const CHECKER_CELL: u32 = 8;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    texcoord: [f32; 2],
}

const fn v(x: f32, y: f32, z: f32, u: f32, t: f32) -> Vertex {
    Vertex { position: [x, y, z], texcoord: [u, t] }
}

#[rustfmt::skip]
const VERTICES: [Vertex; 24] = [
    // front
    v(-1.0, -1.0,  1.0, 0.0, 1.0), v( 1.0, -1.0,  1.0, 1.0, 1.0), v( 1.0,  1.0,  1.0, 1.0, 0.0), v(-1.0,  1.0,  1.0, 0.0, 0.0),
    // back
    v(-1.0, -1.0, -1.0, 1.0, 1.0), v(-1.0,  1.0, -1.0, 1.0, 0.0), v( 1.0,  1.0, -1.0, 0.0, 0.0), v( 1.0, -1.0, -1.0, 0.0, 1.0),
    // top
    v(-1.0,  1.0, -1.0, 0.0, 0.0), v(-1.0,  1.0,  1.0, 0.0, 1.0), v( 1.0,  1.0,  1.0, 1.0, 1.0), v( 1.0,  1.0, -1.0, 1.0, 0.0),
    // bottom
    v(-1.0, -1.0, -1.0, 1.0, 0.0), v( 1.0, -1.0, -1.0, 0.0, 0.0), v( 1.0, -1.0,  1.0, 0.0, 1.0), v(-1.0, -1.0,  1.0, 1.0, 1.0),
    // right
    v( 1.0, -1.0, -1.0, 1.0, 1.0), v( 1.0,  1.0, -1.0, 1.0, 0.0), v( 1.0,  1.0,  1.0, 0.0, 0.0), v( 1.0, -1.0,  1.0, 0.0, 1.0),
    // left
    v(-1.0, -1.0, -1.0, 0.0, 1.0), v(-1.0, -1.0,  1.0, 1.0, 1.0), v(-1.0,  1.0,  1.0, 1.0, 0.0), v(-1.0,  1.0, -1.0, 0.0, 0.0),
];

const INDICES: [u16; 36] = {
    let mut out = [0u16; 36];
    let mut face = 0;
    while face < 6 {
        let base = (face * 4) as u16;
        let quad = [base, base + 1, base + 2, base, base + 2, base + 3];
        let mut i = 0;
        while i < 6 {
            out[face * 6 + i] = quad[i];
            i += 1;
        }
        face += 1;
    }
    out
};

fn checkerboard() -> Vec<u8> {
    let mut pixels = Vec::with_capacity((TEXTURE_SIZE * TEXTURE_SIZE * 4) as usize);
    for y in 0..TEXTURE_SIZE {
        for x in 0..TEXTURE_SIZE {
            let light = ((x / CHECKER_CELL) + (y / CHECKER_CELL)) % 2 == 0;
            pixels.extend_from_slice(if light { &[0xE0, 0xC0, 0x90, 0xFF] } else { &[0x40, 0x28, 0x18, 0xFF] });
        }
    }
    pixels
}

struct Gpu {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    uniforms: wgpu::Buffer,
    texture: wgpu::Texture,
}

#[derive(Default)]
struct Lesson6 {
    gpu: Option<Gpu>,
    projection: Mtx,
    x_rot: f32,
    y_rot: f32,
    z_rot: f32,
}

impl Lesson6 {
    fn create_pipeline(
        device: &wgpu::Device,
        shaders: &ShaderPair<WgpuShader>,
        color_format: wgpu::TextureFormat,
    ) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout) {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lesson6 bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lesson6 pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("lesson6 pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shaders.vertex.module,
                entry_point: Some(&shaders.vertex.entry_point),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shaders.fragment.module,
                entry_point: Some(&shaders.fragment.entry_point),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth16Unorm,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        (pipeline, bind_group_layout)
    }
}

impl AppImplementation<WgpuBackend> for Lesson6 {
    fn init(&mut self, ctx: &mut Context<WgpuBackend>) -> nehe::Result<()> {
        let shaders = ctx.load_shaders("lesson6", 1, 0, 1)?;
        let backend = ctx.backend();
        let (pipeline, bind_group_layout) =
            Self::create_pipeline(backend.device(), &shaders, backend.surface_format());
        backend.release_shader(shaders.vertex);
        backend.release_shader(shaders.fragment);

        let checker = checkerboard();
        let (vertices, indices, uniforms, texture) = ctx.copy_pass(|pass| {
            Ok((
                pass.create_buffer(BufferUsage::VERTEX, &VERTICES)?,
                pass.create_buffer(BufferUsage::INDEX, &INDICES)?,
                pass.create_buffer(BufferUsage::UNIFORM, &[Mtx::IDENTITY])?,
                pass.create_texture_from_pixels(
                    TextureFormat::CANONICAL_COLOR,
                    TEXTURE_SIZE,
                    TEXTURE_SIZE,
                    &checker,
                    true,
                )?,
            ))
        })?;

        let device = ctx.backend().device();
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lesson6 sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lesson6 bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: uniforms.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(&view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&sampler) },
            ],
        });

        log::info!("cube ready: {} vertices, {}x{} checkerboard", VERTICES.len(), TEXTURE_SIZE, TEXTURE_SIZE);
        self.gpu = Some(Gpu { pipeline, bind_group, vertices, indices, uniforms, texture });
        Ok(())
    }

    fn quit(&mut self, ctx: &mut Context<WgpuBackend>) {
        if let Some(gpu) = self.gpu.take() {
            let backend = ctx.backend();
            backend.release_texture(gpu.texture);
            backend.release_buffer(gpu.uniforms);
            backend.release_buffer(gpu.indices);
            backend.release_buffer(gpu.vertices);
        }
    }

    fn resize(&mut self, _ctx: &mut Context<WgpuBackend>, size: Size<i32>) {
        self.projection = Mtx::perspective(45.0, size.to_u32().aspect(), 0.1, 100.0);
    }

    fn draw(
        &mut self,
        ctx: &mut Context<WgpuBackend>,
        cmd: &mut WgpuCommandBuffer,
        swapchain: &wgpu::TextureView,
        _size: Size<u32>,
    ) -> nehe::Result<()> {
        let Some(gpu) = &self.gpu else { return Ok(()) };
        let depth = ctx
            .depth_texture()
            .ok_or(NeHeError::Fatal("lesson6 needs a depth buffer"))?
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut model_view = Mtx::IDENTITY;
        model_view.translate(0.0, 0.0, -5.0);
        model_view.rotate(self.x_rot, 1.0, 0.0, 0.0);
        model_view.rotate(self.y_rot, 0.0, 1.0, 0.0);
        model_view.rotate(self.z_rot, 0.0, 0.0, 1.0);
        let model_view_proj = self.projection * model_view;
        ctx.backend()
            .queue()
            .write_buffer(&gpu.uniforms, 0, bytemuck::bytes_of(&model_view_proj));

        {
            let mut pass = cmd.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lesson6 cube"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: swapchain,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(&gpu.pipeline);
            pass.set_bind_group(0, &gpu.bind_group, &[]);
            pass.set_vertex_buffer(0, gpu.vertices.slice(..));
            pass.set_index_buffer(gpu.indices.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..INDICES.len() as u32, 0, 0..1);
        }

        self.x_rot += 0.3;
        self.y_rot += 0.2;
        self.z_rot += 0.4;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = AppConfig::new("NeHe's Texture Mapping Tutorial", 640, 480)
        .with_depth_buffer(TextureFormat::D16Unorm)
        .with_bundle(DirectoryBundle::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data")));
    Runtime::run::<Lesson6>(config)
}
