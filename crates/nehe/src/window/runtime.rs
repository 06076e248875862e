use std::sync::Arc;

use anyhow::Context as _;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::core::{AppConfig, AppImplementation};
use crate::coords::Size;
use crate::device::gpu::{GpuInit, WgpuBackend};
use crate::error::{NeHeError, Result};
use crate::input::Key;

use super::events::{AppEvent, WindowControl};
use super::runner::{AppRunner, RunState};

/// Entry point for lesson binaries.
///
/// Owns the winit event loop and one window; everything between event
/// translation and presentation is delegated to [`AppRunner`].
pub struct Runtime;

impl Runtime {
    /// Runs `A` with the default GPU settings until the user quits.
    pub fn run<A>(config: AppConfig) -> anyhow::Result<()>
    where
        A: AppImplementation<WgpuBackend> + Default + 'static,
    {
        Self::run_with(config, GpuInit::default(), A::default())
    }

    pub fn run_with<A>(config: AppConfig, gpu_init: GpuInit, app: A) -> anyhow::Result<()>
    where
        A: AppImplementation<WgpuBackend> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut shell = Shell::new(config, gpu_init, app);

        event_loop
            .run_app(&mut shell)
            .context("winit event loop terminated with error")?;

        match shell.error.take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

struct WindowHandle<'w>(&'w Window);

impl WindowControl for WindowHandle<'_> {
    fn set_fullscreen(&mut self, fullscreen: bool) {
        log::debug!("fullscreen {}", if fullscreen { "on" } else { "off" });
        self.0.set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
    }
}

struct Shell<A>
where
    A: AppImplementation<WgpuBackend> + 'static,
{
    config: AppConfig,
    gpu_init: GpuInit,
    /// Moved into the runner once the window exists.
    app: Option<A>,

    runner: Option<AppRunner<WgpuBackend, A>>,
    window: Option<Arc<Window>>,

    pending: Vec<AppEvent>,
    fullscreen: bool,
    error: Option<NeHeError>,
}

impl<A> Shell<A>
where
    A: AppImplementation<WgpuBackend> + 'static,
{
    fn new(config: AppConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app: Some(app),
            runner: None,
            window: None,
            pending: Vec::new(),
            fullscreen: false,
            error: None,
        }
    }

    fn state(&self) -> RunState {
        match &self.runner {
            Some(runner) => runner.state(),
            None if self.app.is_some() => RunState::Uninitialized,
            None => RunState::Terminated,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let Some(app) = self.app.take() else {
            return Ok(());
        };

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = event_loop
            .create_window(attrs)
            .map_err(|e| NeHeError::backend("create_window", e))?;
        let window = Arc::new(window);

        let backend = pollster::block_on(WgpuBackend::new(window.clone(), self.gpu_init.clone()))?;
        let pixel_size: Size<u32> = window.inner_size().into();

        self.fullscreen = window.fullscreen().is_some();
        self.window = Some(window);
        self.runner = Some(AppRunner::start(&self.config, backend, pixel_size, app)?);
        Ok(())
    }

    /// Tears down the runner (lesson, context, device) before the window.
    fn teardown(&mut self) {
        if let Some(mut runner) = self.runner.take() {
            runner.shutdown();
        }
        self.window = None;
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: NeHeError) {
        // `run_with` returns it to the caller, which reports it.
        log::debug!("shutting down after error: {err}");
        self.error = Some(err);
        self.teardown();
        event_loop.exit();
    }

    fn track_fullscreen(&mut self) {
        let Some(window) = &self.window else { return };
        let current = window.fullscreen().is_some();
        if let Some(event) = fullscreen_transition(&mut self.fullscreen, current) {
            self.pending.push(event);
        }
    }
}

impl<A> ApplicationHandler for Shell<A>
where
    A: AppImplementation<WgpuBackend> + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state() != RunState::Uninitialized {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.pending.push(AppEvent::Quit),

            WindowEvent::Resized(size) => {
                self.pending.push(AppEvent::PixelSizeChanged(Size::from(size).to_i32()));
            }

            WindowEvent::KeyboardInput { event, .. } => self.pending.push(AppEvent::Key {
                key: map_key(event.physical_key),
                down: event.state == ElementState::Pressed,
                repeat: event.repeat,
            }),

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Fullscreen toggles do not always resize the window.
        self.track_fullscreen();

        let Some(window) = self.window.clone() else { return };
        let Some(runner) = self.runner.as_mut() else { return };

        event_loop.set_control_flow(ControlFlow::Poll);

        let events = std::mem::take(&mut self.pending);
        match runner.iterate(events, &mut WindowHandle(&window)) {
            Ok(RunState::Running) => {}
            Ok(_) => {
                self.teardown();
                event_loop.exit();
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

/// Event for a change between the `tracked` and `current` fullscreen state.
fn fullscreen_transition(tracked: &mut bool, current: bool) -> Option<AppEvent> {
    if *tracked == current {
        return None;
    }
    *tracked = current;
    Some(if current {
        AppEvent::FullscreenEntered
    } else {
        AppEvent::FullscreenLeft
    })
}

fn map_key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        // NativeKeyCode is not a u32 in winit 0.30.
        return Key::Unknown(0);
    };

    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        KeyCode::Digit0 => Key::Digit0,
        KeyCode::Digit1 => Key::Digit1,
        KeyCode::Digit2 => Key::Digit2,
        KeyCode::Digit3 => Key::Digit3,
        KeyCode::Digit4 => Key::Digit4,
        KeyCode::Digit5 => Key::Digit5,
        KeyCode::Digit6 => Key::Digit6,
        KeyCode::Digit7 => Key::Digit7,
        KeyCode::Digit8 => Key::Digit8,
        KeyCode::Digit9 => Key::Digit9,

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,

        other => Key::Unknown(other as u32),
    }
}
