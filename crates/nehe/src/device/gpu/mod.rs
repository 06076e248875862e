//! wgpu implementation of [`GpuBackend`].
//!
//! Owns the wgpu Instance/Adapter/Device/Queue together with the window's
//! surface. Surface configuration follows the window's pixel size lazily, at
//! swapchain acquisition.

mod convert;
mod error_scope;
mod init;
mod mipmap;
mod surface;

use std::borrow::Cow;
use std::sync::Arc;

use winit::window::Window;

use crate::coords::Size;
use crate::device::{
    BufferDesc, GpuBackend, ShaderDesc, ShaderFormats, SwapchainImage, TextureDesc, TextureFormat,
};
use crate::error::{NeHeError, Result};

pub use init::GpuInit;

use error_scope::ErrorScope;
use mipmap::MipmapGenerator;
use surface::SurfaceErrorAction;

/// Command buffer handed to lesson `draw` hooks.
///
/// `encoder` records the lesson's passes; the acquired frame (if any) is
/// presented when the buffer is submitted.
pub struct WgpuCommandBuffer {
    pub encoder: wgpu::CommandEncoder,
    frame: Option<wgpu::SurfaceTexture>,
}

/// Compiled shader stage.
pub struct WgpuShader {
    pub module: wgpu::ShaderModule,
    pub entry_point: String,
}

/// wgpu device, queue and window surface.
///
/// Fields drop in declaration order, which releases the surface before the
/// device and the window last.
pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    mipmaps: MipmapGenerator,
    queue: wgpu::Queue,
    device: wgpu::Device,
    adapter: wgpu::Adapter,
    #[allow(dead_code)]
    instance: wgpu::Instance,
    window: Arc<Window>,
    shader_formats: ShaderFormats,
}

impl WgpuBackend {
    /// Formats wgpu can turn into shader modules.
    pub const SUPPORTED_SHADER_FORMATS: ShaderFormats = ShaderFormats::WGSL.union(ShaderFormats::SPIRV);

    /// Creates the device and claims `window` for presentation.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| NeHeError::backend("create_surface", e))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| NeHeError::backend("request_adapter", e))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("nehe device"),
                required_features: init.features,
                required_limits: init.limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| NeHeError::backend("request_device", e))?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.srgb_surface)
            .ok_or(NeHeError::Fatal("no supported surface formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode(),
            alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.frame_latency,
        };
        surface.configure(&device, &config);

        let info = adapter.get_info();
        log::info!(
            "gpu: {} ({:?}), surface {:?} {}x{}",
            info.name,
            info.backend,
            format,
            config.width,
            config.height
        );

        let mipmaps = MipmapGenerator::new(&device);

        Ok(Self {
            surface,
            config,
            mipmaps,
            queue,
            device,
            adapter,
            instance,
            window,
            shader_formats: init.shader_formats & Self::SUPPORTED_SHADER_FORMATS,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Format of the swapchain images passed to `draw`.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    fn check_extent(&self, operation: &'static str, size: Size<u32>) -> Result<()> {
        let max = self.device.limits().max_texture_dimension_2d;
        if size.is_empty() {
            return Err(NeHeError::backend(operation, "texture has zero size"));
        }
        if size.width > max || size.height > max {
            return Err(NeHeError::backend(
                operation,
                format!("{}x{} exceeds the device limit of {max}", size.width, size.height),
            ));
        }
        Ok(())
    }

    fn check_buffer_size(&self, operation: &'static str, size: u64) -> Result<()> {
        let max = self.device.limits().max_buffer_size;
        if size > max {
            return Err(NeHeError::backend(
                operation,
                format!("{size} bytes exceeds the device limit of {max}"),
            ));
        }
        Ok(())
    }

    fn reconfigure(&mut self, size: Size<u32>) {
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
        log::debug!("surface reconfigured to {}x{}", size.width, size.height);
    }
}

impl GpuBackend for WgpuBackend {
    type Buffer = wgpu::Buffer;
    type Texture = wgpu::Texture;
    type TransferBuffer = wgpu::Buffer;
    type Shader = WgpuShader;
    type CommandBuffer = WgpuCommandBuffer;
    type SwapchainTexture = wgpu::TextureView;

    fn shader_formats(&self) -> ShaderFormats {
        self.shader_formats
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<wgpu::Buffer> {
        let size = convert::align_copy_size(u64::from(desc.size));
        self.check_buffer_size("create_buffer", size)?;

        let scope = ErrorScope::allocation(&self.device, "create_buffer");
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nehe buffer"),
            size,
            usage: convert::buffer_usages(desc.usage),
            mapped_at_creation: false,
        });
        if let Err(err) = scope.end() {
            buffer.destroy();
            return Err(err);
        }
        Ok(buffer)
    }

    fn release_buffer(&self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<wgpu::Texture> {
        self.check_extent("create_texture", desc.size)?;

        let scope = ErrorScope::allocation(&self.device, "create_texture");
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(if desc.format.is_depth() { "nehe depth texture" } else { "nehe texture" }),
            size: wgpu::Extent3d {
                width: desc.size.width,
                height: desc.size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: desc.mip_levels.max(1),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: convert::texture_format(desc.format),
            usage: convert::texture_usages(desc.usage),
            view_formats: &[],
        });
        if let Err(err) = scope.end() {
            texture.destroy();
            return Err(err);
        }
        Ok(texture)
    }

    fn release_texture(&self, texture: wgpu::Texture) {
        texture.destroy();
    }

    fn create_transfer_buffer(&self, size: u32) -> Result<wgpu::Buffer> {
        let size = convert::align_copy_size(u64::from(size));
        self.check_buffer_size("create_transfer_buffer", size)?;

        let scope = ErrorScope::allocation(&self.device, "create_transfer_buffer");
        let transfer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("nehe transfer buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        if let Err(err) = scope.end() {
            transfer.destroy();
            return Err(err);
        }
        Ok(transfer)
    }

    fn write_transfer_buffer(&self, transfer: &mut wgpu::Buffer, data: &[u8]) -> Result<()> {
        let capacity = usize::try_from(transfer.size())
            .map_err(|e| NeHeError::backend("map_transfer_buffer", e))?;
        if data.len() > capacity {
            return Err(NeHeError::backend(
                "map_transfer_buffer",
                format!("{} bytes do not fit a {capacity} byte transfer buffer", data.len()),
            ));
        }

        // The mapped range spans the whole (aligned) buffer.
        let padded: Cow<'_, [u8]> = if data.len() == capacity {
            Cow::Borrowed(data)
        } else {
            let mut bytes = data.to_vec();
            bytes.resize(capacity, 0);
            Cow::Owned(bytes)
        };
        transfer.slice(..).get_mapped_range_mut().copy_from_slice(&padded);
        transfer.unmap();
        Ok(())
    }

    fn release_transfer_buffer(&self, transfer: wgpu::Buffer) {
        transfer.destroy();
    }

    fn texture_row_pitch(&self, format: TextureFormat, width: u32) -> u32 {
        let tight = width * format.bytes_per_texel().unwrap_or(0);
        tight.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
    }

    fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<WgpuShader> {
        let source = if desc.format == ShaderFormats::WGSL {
            let text = std::str::from_utf8(desc.code).map_err(|e| NeHeError::backend("create_shader", e))?;
            wgpu::ShaderSource::Wgsl(Cow::Borrowed(text))
        } else if desc.format == ShaderFormats::SPIRV {
            let words = convert::spirv_words(desc.code)
                .ok_or_else(|| NeHeError::backend("create_shader", "malformed SPIR-V module"))?;
            wgpu::ShaderSource::SpirV(Cow::Owned(words))
        } else {
            return Err(NeHeError::Fatal("shader format not supported by wgpu"));
        };

        let scope = ErrorScope::validation(&self.device, "create_shader");
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.entry_point),
            source,
        });
        scope.end()?;

        Ok(WgpuShader {
            module,
            entry_point: desc.entry_point.to_owned(),
        })
    }

    fn release_shader(&self, shader: WgpuShader) {
        drop(shader);
    }

    fn acquire_command_buffer(&self) -> Result<WgpuCommandBuffer> {
        let encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("nehe command buffer"),
        });
        Ok(WgpuCommandBuffer { encoder, frame: None })
    }

    fn begin_copy_pass(&self, cmd: &mut WgpuCommandBuffer) {
        cmd.encoder.push_debug_group("nehe copy pass");
    }

    fn upload_to_buffer(
        &self,
        cmd: &mut WgpuCommandBuffer,
        source: &wgpu::Buffer,
        destination: &wgpu::Buffer,
        size: u32,
    ) {
        if size == 0 {
            return;
        }
        let size = convert::align_copy_size(u64::from(size));
        cmd.encoder.copy_buffer_to_buffer(source, 0, destination, 0, size);
    }

    fn upload_to_texture(
        &self,
        cmd: &mut WgpuCommandBuffer,
        source: &wgpu::Buffer,
        destination: &wgpu::Texture,
        size: Size<u32>,
        row_pitch: u32,
    ) {
        cmd.encoder.copy_buffer_to_texture(
            wgpu::TexelCopyBufferInfo {
                buffer: source,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(row_pitch),
                    rows_per_image: Some(size.height),
                },
            },
            wgpu::TexelCopyTextureInfo {
                texture: destination,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
        );
    }

    fn end_copy_pass(&self, cmd: &mut WgpuCommandBuffer) {
        cmd.encoder.pop_debug_group();
    }

    fn generate_mipmaps(&self, cmd: &mut WgpuCommandBuffer, texture: &wgpu::Texture) {
        self.mipmaps.generate(&self.device, &mut cmd.encoder, texture);
    }

    fn acquire_swapchain_texture(
        &mut self,
        cmd: &mut WgpuCommandBuffer,
    ) -> Result<Option<SwapchainImage<wgpu::TextureView>>> {
        let size: Size<u32> = self.window.inner_size().into();
        if size.is_empty() {
            return Ok(None);
        }
        if size != Size::new(self.config.width, self.config.height) {
            self.reconfigure(size);
        }

        match self.surface.get_current_texture() {
            Ok(frame) => {
                let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
                let size = Size::new(frame.texture.width(), frame.texture.height());
                cmd.frame = Some(frame);
                Ok(Some(SwapchainImage { texture: view, size }))
            }
            Err(err) => match surface::surface_error_action(&err) {
                SurfaceErrorAction::Reconfigure => {
                    self.reconfigure(size);
                    Ok(None)
                }
                SurfaceErrorAction::SkipFrame => {
                    log::trace!("swapchain acquisition skipped: {err}");
                    Ok(None)
                }
                SurfaceErrorAction::Fatal => Err(NeHeError::backend("acquire_swapchain_texture", err)),
            },
        }
    }

    fn submit(&self, cmd: WgpuCommandBuffer) {
        let WgpuCommandBuffer { encoder, frame } = cmd;
        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(frame) = frame {
            self.window.pre_present_notify();
            frame.present();
        }
    }

    fn cancel(&self, cmd: WgpuCommandBuffer) {
        // Dropping an unfinished encoder discards it; an unpresented frame goes back to the swapchain.
        drop(cmd);
    }
}
