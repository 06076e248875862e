//! Shared runtime for the NeHe lessons.
//!
//! A lesson implements [`AppImplementation`], describes its window with an
//! [`AppConfig`] and hands both to [`Runtime::run`]. The runtime owns the
//! window, the GPU device, the depth buffer and the frame loop; the lesson
//! only records uploads (through a [`CopyPass`]) and draws.

pub mod assets;
pub mod context;
pub mod coords;
pub mod core;
pub mod device;
pub mod error;
pub mod input;
pub mod logging;
pub mod math;
pub mod window;

pub use crate::assets::{AssetBundle, Bitmap, DirectoryBundle, MemoryBundle};
pub use crate::context::{Context, CopyPass, ShaderPair};
pub use crate::coords::Size;
pub use crate::core::{AppConfig, AppImplementation};
pub use crate::error::{NeHeError, Result};
pub use crate::input::Key;
pub use crate::math::{Mtx, Random};
pub use crate::window::Runtime;
