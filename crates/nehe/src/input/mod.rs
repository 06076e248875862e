//! Input vocabulary.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The window runtime translates platform key events into [`Key`]s.

mod key;

pub use key::Key;
