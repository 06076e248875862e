use std::fmt;

/// Keyboard key identifier, by physical position.
///
/// Covers the keys the lessons bind. Anything else arrives as
/// `Key::Unknown(u32)` carrying the platform code.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Space,

    Home,
    End,
    PageUp,
    PageDown,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Digits
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Function keys
    F1, F2, F3, F4, F5, F6,
    F7, F8, F9, F10, F11, F12,

    /// Platform-dependent key not represented here.
    Unknown(u32),
}

impl Key {
    /// Ends the application when pressed.
    pub const EXIT: Key = Key::Escape;
    /// Toggles fullscreen when pressed; never forwarded to lessons.
    pub const TOGGLE_FULLSCREEN: Key = Key::F1;
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
