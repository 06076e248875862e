use crate::device::{BufferUsage, TextureFormat, TextureUsage};

pub(crate) fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
        TextureFormat::D16Unorm => wgpu::TextureFormat::Depth16Unorm,
        TextureFormat::D24Unorm => wgpu::TextureFormat::Depth24Plus,
        TextureFormat::D24UnormS8Uint => wgpu::TextureFormat::Depth24PlusStencil8,
        TextureFormat::D32Float => wgpu::TextureFormat::Depth32Float,
    }
}

/// Buffers are always upload destinations.
pub(crate) fn buffer_usages(usage: BufferUsage) -> wgpu::BufferUsages {
    let mut out = wgpu::BufferUsages::COPY_DST;
    if usage.contains(BufferUsage::VERTEX) {
        out |= wgpu::BufferUsages::VERTEX;
    }
    if usage.contains(BufferUsage::INDEX) {
        out |= wgpu::BufferUsages::INDEX;
    }
    if usage.contains(BufferUsage::UNIFORM) {
        out |= wgpu::BufferUsages::UNIFORM;
    }
    if usage.contains(BufferUsage::STORAGE) {
        out |= wgpu::BufferUsages::STORAGE;
    }
    if usage.contains(BufferUsage::INDIRECT) {
        out |= wgpu::BufferUsages::INDIRECT;
    }
    out
}

pub(crate) fn texture_usages(usage: TextureUsage) -> wgpu::TextureUsages {
    let mut out = wgpu::TextureUsages::empty();
    if usage.contains(TextureUsage::SAMPLER) {
        out |= wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
    }
    if usage.intersects(TextureUsage::COLOR_TARGET | TextureUsage::DEPTH_STENCIL_TARGET) {
        out |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    out
}

/// Rounds a copy size up to wgpu's buffer copy granularity.
pub(crate) fn align_copy_size(size: u64) -> u64 {
    size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT).max(wgpu::COPY_BUFFER_ALIGNMENT)
}

/// Reinterprets little-endian SPIR-V bytes as words, checking the magic number.
pub(crate) fn spirv_words(code: &[u8]) -> Option<Vec<u32>> {
    const MAGIC: u32 = 0x0723_0203;

    if code.len() % 4 != 0 {
        return None;
    }
    let words: Vec<u32> = code
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect();
    (words.first() == Some(&MAGIC)).then_some(words)
}
