//! Lesson assets: where they come from and how bitmaps are decoded.

mod bitmap;
mod bundle;

pub use bitmap::Bitmap;
pub use bundle::{AssetBundle, DirectoryBundle, MemoryBundle};
