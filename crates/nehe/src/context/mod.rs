//! Per-application GPU context.
//!
//! Owns the backend (and through it the device and window), the managed
//! depth buffer and the asset bundle. Lessons receive it by `&mut` in every
//! hook.

mod copy_pass;
mod shaders;

use std::sync::Arc;

use crate::assets::AssetBundle;
use crate::core::AppConfig;
use crate::coords::Size;
use crate::device::{GpuBackend, TextureDesc, TextureFormat, TextureUsage};
use crate::error::{NeHeError, Result};

pub use copy_pass::{mip_level_count, CopyPass};
pub use shaders::ShaderPair;

pub struct Context<B: GpuBackend> {
    depth_texture: Option<B::Texture>,
    depth_texture_size: Size<u32>,
    depth_format: Option<TextureFormat>,
    bundle: Option<Arc<dyn AssetBundle>>,
    backend: B,
}

impl<B: GpuBackend> Context<B> {
    /// Wraps an initialized backend. The depth buffer is created separately
    /// through [`setup_depth_texture`](Self::setup_depth_texture).
    pub fn new(backend: B, config: &AppConfig) -> Self {
        Self {
            depth_texture: None,
            depth_texture_size: Size::default(),
            depth_format: config.depth_format,
            bundle: config.bundle.clone(),
            backend,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Managed depth buffer, present when a depth format is configured.
    pub fn depth_texture(&self) -> Option<&B::Texture> {
        self.depth_texture.as_ref()
    }

    pub fn depth_texture_size(&self) -> Size<u32> {
        self.depth_texture_size
    }

    pub fn depth_format(&self) -> Option<TextureFormat> {
        self.depth_format
    }

    pub fn bundle(&self) -> Result<&dyn AssetBundle> {
        self.bundle
            .as_deref()
            .ok_or(NeHeError::Fatal("no asset bundle configured"))
    }

    /// Replaces the depth buffer with a new `size` texture of `format`.
    ///
    /// The previous texture is released before the new one is created, so at
    /// most one depth texture is ever alive.
    pub fn setup_depth_texture(&mut self, size: Size<u32>, format: TextureFormat, clear_depth: f32) -> Result<()> {
        if let Some(old) = self.depth_texture.take() {
            self.backend.release_texture(old);
        }
        self.depth_texture_size = Size::default();

        let texture = self.backend.create_texture(&TextureDesc {
            format,
            usage: TextureUsage::DEPTH_STENCIL_TARGET,
            size,
            mip_levels: 1,
            clear_depth: Some(clear_depth),
        })?;

        log::debug!("depth texture {format:?} {}x{}", size.width, size.height);
        self.depth_texture = Some(texture);
        self.depth_texture_size = size;
        Ok(())
    }

    /// Starts a batch of uploads.
    pub fn begin_copy_pass(&self) -> CopyPass<'_, B> {
        CopyPass::new(self)
    }

    /// Runs `record` against a fresh copy pass and submits it if `record` succeeds.
    pub fn copy_pass<T>(&self, record: impl FnOnce(&mut CopyPass<'_, B>) -> Result<T>) -> Result<T> {
        let mut pass = self.begin_copy_pass();
        let out = record(&mut pass)?;
        pass.submit()?;
        Ok(out)
    }
}

impl<B: GpuBackend> Drop for Context<B> {
    fn drop(&mut self) {
        if let Some(depth) = self.depth_texture.take() {
            self.backend.release_texture(depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::fake::{Call, FakeBackend};

    fn context(backend: &FakeBackend) -> Context<FakeBackend> {
        let config = AppConfig::new("test", 640, 480).with_depth_buffer(TextureFormat::D16Unorm);
        Context::new(backend.clone(), &config)
    }

    #[test]
    fn depth_setup_twice_releases_the_first_texture_once() {
        let backend = FakeBackend::new();
        let mut ctx = context(&backend);

        ctx.setup_depth_texture(Size::new(640, 480), TextureFormat::D16Unorm, 1.0).unwrap();
        ctx.setup_depth_texture(Size::new(800, 600), TextureFormat::D16Unorm, 1.0).unwrap();

        let calls = backend.calls();
        let Call::CreateTexture { id: first, .. } = calls[0] else { panic!("{calls:?}") };
        assert_eq!(calls[1], Call::ReleaseTexture(first));
        assert!(matches!(calls[2], Call::CreateTexture { size, .. } if size == Size::new(800, 600)));
        assert_eq!(calls.iter().filter(|c| **c == Call::ReleaseTexture(first)).count(), 1);
        assert_eq!(backend.max_live_textures(), 1);
        assert_eq!(ctx.depth_texture_size(), Size::new(800, 600));
    }

    #[test]
    fn depth_request_carries_clear_hint() {
        let backend = FakeBackend::new();
        let mut ctx = context(&backend);
        ctx.setup_depth_texture(Size::new(4, 4), TextureFormat::D32Float, 1.0).unwrap();

        assert_eq!(
            backend.calls()[0],
            Call::CreateTexture {
                id: 1,
                format: TextureFormat::D32Float,
                usage: TextureUsage::DEPTH_STENCIL_TARGET,
                size: Size::new(4, 4),
                mip_levels: 1,
                clear_depth: Some(1.0),
            }
        );
    }

    #[test]
    fn failed_depth_setup_leaves_no_texture() {
        let backend = FakeBackend::new();
        let mut ctx = context(&backend);
        ctx.setup_depth_texture(Size::new(4, 4), TextureFormat::D16Unorm, 1.0).unwrap();

        backend.fail_on("create_texture");
        let err = ctx.setup_depth_texture(Size::new(8, 8), TextureFormat::D16Unorm, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "create_texture: injected failure");
        assert!(ctx.depth_texture().is_none());
        assert_eq!(ctx.depth_texture_size(), Size::default());
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn drop_releases_depth_texture() {
        let backend = FakeBackend::new();
        {
            let mut ctx = context(&backend);
            ctx.setup_depth_texture(Size::new(4, 4), TextureFormat::D16Unorm, 1.0).unwrap();
        }
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn missing_bundle_is_fatal() {
        let backend = FakeBackend::new();
        let ctx = Context::new(backend, &AppConfig::new("test", 1, 1));
        assert_eq!(ctx.bundle().err().map(|e| e.to_string()).as_deref(), Some("no asset bundle configured"));
    }
}
