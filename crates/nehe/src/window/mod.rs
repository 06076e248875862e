//! Window + runtime loop.
//!
//! `AppRunner` is the platform-independent lifecycle; `Runtime` owns the
//! winit event loop and window and feeds the runner.

mod events;
mod runner;
mod runtime;

pub use events::{AppEvent, WindowControl};
pub use runner::{AppRunner, RunState};
pub use runtime::Runtime;
