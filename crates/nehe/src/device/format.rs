use bitflags::bitflags;

/// Texel formats the runtime knows how to create and upload.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Bgra8Unorm,
    Rgba16Float,
    Rgba32Float,
    D16Unorm,
    D24Unorm,
    D24UnormS8Uint,
    D32Float,
}

impl TextureFormat {
    /// Canonical layout every unsupported bitmap format is converted to.
    pub const CANONICAL_COLOR: Self = Self::Rgba8Unorm;

    /// Size of one texel in bytes, `None` for depth formats (never uploaded from the CPU).
    pub const fn bytes_per_texel(self) -> Option<u32> {
        match self {
            Self::Rgba8Unorm | Self::Bgra8Unorm => Some(4),
            Self::Rgba16Float => Some(8),
            Self::Rgba32Float => Some(16),
            Self::D16Unorm | Self::D24Unorm | Self::D24UnormS8Uint | Self::D32Float => None,
        }
    }

    pub const fn is_depth(self) -> bool {
        matches!(self, Self::D16Unorm | Self::D24Unorm | Self::D24UnormS8Uint | Self::D32Float)
    }

    /// Whether a linear sampler can read the format without optional device features.
    ///
    /// Mipmap generation blits through such a sampler.
    pub const fn is_filterable(self) -> bool {
        matches!(self, Self::Rgba8Unorm | Self::Bgra8Unorm | Self::Rgba16Float)
    }
}

bitflags! {
    /// How a GPU buffer will be bound.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX  = 1 << 0;
        const INDEX   = 1 << 1;
        const UNIFORM = 1 << 2;
        const STORAGE = 1 << 3;
        const INDIRECT = 1 << 4;
    }
}

bitflags! {
    /// How a GPU texture will be bound.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct TextureUsage: u32 {
        const SAMPLER              = 1 << 0;
        const COLOR_TARGET         = 1 << 1;
        const DEPTH_STENCIL_TARGET = 1 << 2;
    }
}

bitflags! {
    /// Shader binary formats a device can consume.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct ShaderFormats: u32 {
        /// Precompiled native shader library (`.metallib`).
        const METALLIB = 1 << 0;
        /// Metal shading language source.
        const MSL      = 1 << 1;
        /// WebGPU shading language source.
        const WGSL     = 1 << 2;
        /// Portable intermediate bytecode.
        const SPIRV    = 1 << 3;
        /// DirectX intermediate language.
        const DXIL     = 1 << 4;
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}
