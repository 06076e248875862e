//! Lesson 1: an empty window cleared to black every frame.

use nehe::device::gpu::{WgpuBackend, WgpuCommandBuffer};
use nehe::logging::{init_logging, LoggingConfig};
use nehe::{AppConfig, AppImplementation, Context, Runtime, Size};

#[derive(Default)]
struct Lesson1;

impl AppImplementation<WgpuBackend> for Lesson1 {
    fn draw(
        &mut self,
        _ctx: &mut Context<WgpuBackend>,
        cmd: &mut WgpuCommandBuffer,
        swapchain: &wgpu::TextureView,
        _size: Size<u32>,
    ) -> nehe::Result<()> {
        let _pass = cmd.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lesson1 clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: swapchain,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());
    Runtime::run::<Lesson1>(AppConfig::new("NeHe's OpenGL Framework", 640, 480))
}
