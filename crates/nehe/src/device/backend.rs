use crate::coords::Size;
use crate::error::Result;

use super::format::{BufferUsage, ShaderFormats, ShaderStage, TextureFormat, TextureUsage};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BufferDesc {
    pub usage: BufferUsage,
    /// Size in bytes.
    pub size: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TextureDesc {
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub size: Size<u32>,
    pub mip_levels: u32,
    /// Depth value the backend should assume for clears of a depth target.
    ///
    /// Some backends default this inconsistently; backends without that
    /// problem ignore the hint.
    pub clear_depth: Option<f32>,
}

/// One shader stage handed to [`GpuBackend::create_shader`].
#[derive(Debug, Copy, Clone)]
pub struct ShaderDesc<'a> {
    pub code: &'a [u8],
    pub entry_point: &'a str,
    /// Exactly one format, always one the backend advertised.
    pub format: ShaderFormats,
    pub stage: ShaderStage,
    pub num_samplers: u32,
    pub num_storage_buffers: u32,
    pub num_uniform_buffers: u32,
}

/// A presentable frame image acquired for one command buffer.
#[derive(Debug, Clone)]
pub struct SwapchainImage<T> {
    pub texture: T,
    pub size: Size<u32>,
}

/// Explicit GPU API the runtime is written against.
///
/// Resources are created with explicit usage, uploads are staged through
/// transfer buffers, and work is recorded into command buffers that are
/// either submitted or cancelled exactly once. Handles are exclusively owned
/// by whoever created them and must be handed back to the matching
/// `release_*` call.
pub trait GpuBackend {
    type Buffer: Clone;
    type Texture: Clone;
    type TransferBuffer;
    type Shader;
    type CommandBuffer;
    type SwapchainTexture;

    /// Shader formats this device can consume.
    fn shader_formats(&self) -> ShaderFormats;

    fn create_buffer(&self, desc: &BufferDesc) -> Result<Self::Buffer>;
    fn release_buffer(&self, buffer: Self::Buffer);

    fn create_texture(&self, desc: &TextureDesc) -> Result<Self::Texture>;
    fn release_texture(&self, texture: Self::Texture);

    /// CPU-visible staging buffer of `size` bytes.
    fn create_transfer_buffer(&self, size: u32) -> Result<Self::TransferBuffer>;
    /// Maps `transfer`, copies `data` to its start, and unmaps it.
    fn write_transfer_buffer(&self, transfer: &mut Self::TransferBuffer, data: &[u8]) -> Result<()>;
    fn release_transfer_buffer(&self, transfer: Self::TransferBuffer);

    /// Bytes between rows of a staged texture upload.
    ///
    /// Defaults to tightly packed rows.
    fn texture_row_pitch(&self, format: TextureFormat, width: u32) -> u32 {
        width * format.bytes_per_texel().unwrap_or(0)
    }

    fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<Self::Shader>;
    fn release_shader(&self, shader: Self::Shader);

    fn acquire_command_buffer(&self) -> Result<Self::CommandBuffer>;

    fn begin_copy_pass(&self, cmd: &mut Self::CommandBuffer);
    fn upload_to_buffer(
        &self,
        cmd: &mut Self::CommandBuffer,
        source: &Self::TransferBuffer,
        destination: &Self::Buffer,
        size: u32,
    );
    fn upload_to_texture(
        &self,
        cmd: &mut Self::CommandBuffer,
        source: &Self::TransferBuffer,
        destination: &Self::Texture,
        size: Size<u32>,
        row_pitch: u32,
    );
    fn end_copy_pass(&self, cmd: &mut Self::CommandBuffer);

    /// Fills mip levels `1..` of `texture` from its base level.
    fn generate_mipmaps(&self, cmd: &mut Self::CommandBuffer, texture: &Self::Texture);

    /// Blocks until the next presentable image is available.
    ///
    /// `Ok(None)` means no image can be had right now (minimized or occluded
    /// window, outdated swapchain); the caller should cancel `cmd` and retry
    /// on the next iteration.
    fn acquire_swapchain_texture(
        &mut self,
        cmd: &mut Self::CommandBuffer,
    ) -> Result<Option<SwapchainImage<Self::SwapchainTexture>>>;

    /// Hands the recorded work to the GPU and presents any acquired image.
    fn submit(&self, cmd: Self::CommandBuffer);
    /// Discards the recorded work without executing it.
    fn cancel(&self, cmd: Self::CommandBuffer);
}
