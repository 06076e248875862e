use crate::context::Context;
use crate::coords::Size;
use crate::device::GpuBackend;
use crate::error::Result;
use crate::input::Key;

/// Lesson contract driven by the app runner.
///
/// Every hook defaults to doing nothing. A lesson owns the GPU resources it
/// creates in `init` and hands them back to the backend in `quit`.
pub trait AppImplementation<B: GpuBackend> {
    /// Called once after the context (and depth buffer, if any) exists.
    fn init(&mut self, ctx: &mut Context<B>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called once before the context is torn down.
    fn quit(&mut self, ctx: &mut Context<B>) {
        let _ = ctx;
    }

    /// Called with the window's new size in physical pixels.
    fn resize(&mut self, ctx: &mut Context<B>, size: Size<i32>) {
        let _ = (ctx, size);
    }

    /// Records one frame into `cmd`, targeting `swapchain`.
    fn draw(
        &mut self,
        ctx: &mut Context<B>,
        cmd: &mut B::CommandBuffer,
        swapchain: &B::SwapchainTexture,
        size: Size<u32>,
    ) -> Result<()> {
        let _ = (ctx, cmd, swapchain, size);
        Ok(())
    }

    /// Called for key presses and releases the runner does not handle itself.
    fn key(&mut self, ctx: &mut Context<B>, key: Key, down: bool, repeat: bool) {
        let _ = (ctx, key, down, repeat);
    }
}
