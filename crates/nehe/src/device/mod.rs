//! GPU device abstraction.
//!
//! This module is responsible for:
//! - the explicit GPU API the runtime core is written against (`GpuBackend`)
//! - the resource descriptors and format/usage vocabulary shared by backends
//! - the wgpu implementation (`gpu`) used by the lesson binaries

mod backend;
mod format;
pub mod gpu;

#[cfg(test)]
pub(crate) mod fake;

pub use backend::{BufferDesc, GpuBackend, ShaderDesc, SwapchainImage, TextureDesc};
pub use format::{BufferUsage, ShaderFormats, ShaderStage, TextureFormat, TextureUsage};
