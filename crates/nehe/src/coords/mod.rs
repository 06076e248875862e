//! Pixel-space value types.
//!
//! Sizes reported by the window and the swapchain are physical (backing-store)
//! pixels; lessons derive their projection aspect ratio from them.

mod size;

pub use size::Size;
