use crate::device::ShaderFormats;

/// Device and surface settings for [`WgpuBackend`](super::WgpuBackend).
///
/// The defaults give every lesson a vsynced, non-sRGB swapchain and let the
/// shader loader pick any format wgpu can consume.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// `Fifo` when set, `AutoNoVsync` otherwise.
    pub vsync: bool,
    /// Lesson colors are written to the swapchain unconverted unless this is set.
    pub srgb_surface: bool,
    /// Falls back to the surface's first supported mode.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,
    pub features: wgpu::Features,
    pub limits: wgpu::Limits,
    /// Hint; backends may clamp it.
    pub frame_latency: u32,
    /// Narrowed to WGSL and SPIR-V by the backend.
    pub shader_formats: ShaderFormats,
}

impl GpuInit {
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_shader_formats(mut self, formats: ShaderFormats) -> Self {
        self.shader_formats = formats;
        self
    }

    pub(crate) fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            vsync: true,
            srgb_surface: false,
            alpha_mode: None,
            features: wgpu::Features::empty(),
            limits: wgpu::Limits::default(),
            frame_latency: 2,
            shader_formats: ShaderFormats::all(),
        }
    }
}
