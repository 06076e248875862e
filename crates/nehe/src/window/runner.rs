use crate::context::Context;
use crate::core::{AppConfig, AppImplementation};
use crate::coords::Size;
use crate::device::GpuBackend;
use crate::error::Result;
use crate::input::Key;

use super::events::{AppEvent, WindowControl};

/// Lifecycle of an application run.
///
/// A runner exists only from `Running` on; the window shell reports
/// `Uninitialized` until the runner has been started.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RunState {
    Uninitialized,
    Running,
    ShuttingDown,
    Terminated,
}

/// Platform-independent app lifecycle.
///
/// The window shell feeds it batches of [`AppEvent`]s, one batch per loop
/// iteration; the runner dispatches them to the lesson and renders a frame.
pub struct AppRunner<B: GpuBackend, A: AppImplementation<B>> {
    app: A,
    ctx: Option<Context<B>>,
    state: RunState,
    fullscreen: bool,
}

impl<B: GpuBackend, A: AppImplementation<B>> AppRunner<B, A> {
    /// Builds the context around `backend`, creates the depth buffer if one is
    /// configured, and runs the lesson's `init`.
    ///
    /// `pixel_size` is the window's drawable size at startup; the lesson
    /// receives it through `resize` right after `init`.
    pub fn start(config: &AppConfig, backend: B, pixel_size: Size<u32>, mut app: A) -> Result<Self> {
        let mut ctx = Context::new(backend, config);
        if let Some(format) = config.depth_format {
            ctx.setup_depth_texture(pixel_size, format, 1.0)?;
        }

        // A failed init drops the context without calling `quit`.
        app.init(&mut ctx)?;
        log::info!("'{}' running at {}x{}", config.title, pixel_size.width, pixel_size.height);
        app.resize(&mut ctx, pixel_size.to_i32());

        Ok(Self {
            app,
            ctx: Some(ctx),
            state: RunState::Running,
            fullscreen: false,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    /// `None` once the runner has shut down.
    pub fn context(&self) -> Option<&Context<B>> {
        self.ctx.as_ref()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Runs one loop iteration: dispatch `events`, then draw and submit a frame.
    ///
    /// A quit request stops event processing and skips the frame. Errors from
    /// the backend or the lesson propagate; the caller is expected to shut down.
    pub fn iterate<I>(&mut self, events: I, window: &mut dyn WindowControl) -> Result<RunState>
    where
        I: IntoIterator<Item = AppEvent>,
    {
        if self.state != RunState::Running {
            return Ok(self.state);
        }
        let Some(ctx) = self.ctx.as_mut() else {
            return Ok(self.state);
        };

        for event in events {
            match event {
                AppEvent::Quit => self.state = RunState::ShuttingDown,
                AppEvent::FullscreenEntered => self.fullscreen = true,
                AppEvent::FullscreenLeft => self.fullscreen = false,
                AppEvent::Key { key: Key::EXIT, down: true, .. } => self.state = RunState::ShuttingDown,
                AppEvent::Key { key: Key::TOGGLE_FULLSCREEN, down: true, .. } => {
                    window.set_fullscreen(!self.fullscreen);
                }
                AppEvent::Key { key, down, repeat } => self.app.key(ctx, key, down, repeat),
                AppEvent::PixelSizeChanged(size) => self.app.resize(ctx, size),
            }

            if self.state == RunState::ShuttingDown {
                log::info!("quit requested");
                return Ok(self.state);
            }
        }

        self.frame()?;
        Ok(self.state)
    }

    fn frame(&mut self) -> Result<()> {
        let Some(ctx) = self.ctx.as_mut() else {
            return Ok(());
        };

        let mut cmd = ctx.backend().acquire_command_buffer()?;
        let image = match ctx.backend_mut().acquire_swapchain_texture(&mut cmd) {
            Ok(Some(image)) => image,
            Ok(None) => {
                log::trace!("no swapchain image; frame skipped");
                ctx.backend().cancel(cmd);
                return Ok(());
            }
            Err(err) => {
                ctx.backend().cancel(cmd);
                return Err(err);
            }
        };

        if let Some(format) = ctx.depth_format() {
            if ctx.depth_texture().is_none() || ctx.depth_texture_size() != image.size {
                if let Err(err) = ctx.setup_depth_texture(image.size, format, 1.0) {
                    ctx.backend().cancel(cmd);
                    return Err(err);
                }
            }
        }

        if let Err(err) = self.app.draw(ctx, &mut cmd, &image.texture, image.size) {
            ctx.backend().cancel(cmd);
            return Err(err);
        }

        ctx.backend().submit(cmd);
        Ok(())
    }

    /// Runs the lesson's `quit` and tears the context down. Idempotent.
    pub fn shutdown(&mut self) {
        if self.state == RunState::Terminated {
            return;
        }

        self.state = RunState::ShuttingDown;
        if let Some(mut ctx) = self.ctx.take() {
            self.app.quit(&mut ctx);
            drop(ctx);
        }

        self.state = RunState::Terminated;
        log::debug!("runner terminated");
    }
}

impl<B: GpuBackend, A: AppImplementation<B>> Drop for AppRunner<B, A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
