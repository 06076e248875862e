use crate::coords::Size;
use crate::input::Key;

/// Platform-agnostic events consumed by the app runner.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppEvent {
    /// The window was asked to close.
    Quit,
    FullscreenEntered,
    FullscreenLeft,
    Key { key: Key, down: bool, repeat: bool },
    /// Drawable size in physical pixels changed.
    PixelSizeChanged(Size<i32>),
}

/// Window operations the runner needs while dispatching events.
pub trait WindowControl {
    fn set_fullscreen(&mut self, fullscreen: bool);
}

