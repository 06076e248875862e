use std::borrow::Cow;

use bytemuck::Pod;

use crate::assets::Bitmap;
use crate::coords::Size;
use crate::device::{BufferDesc, BufferUsage, GpuBackend, TextureDesc, TextureFormat, TextureUsage};
use crate::error::{NeHeError, Result};

use super::Context;

/// Number of mip levels in a full chain for `size`: `floor(log2(max(w, h))) + 1`.
pub fn mip_level_count(size: Size<u32>) -> u32 {
    size.width.max(size.height).max(1).ilog2() + 1
}

enum Target<B: GpuBackend> {
    Buffer {
        buffer: B::Buffer,
        size: u32,
    },
    Texture {
        texture: B::Texture,
        size: Size<u32>,
        row_pitch: u32,
        generate_mipmaps: bool,
    },
}

struct PendingCopy<B: GpuBackend> {
    transfer: B::TransferBuffer,
    target: Target<B>,
}

/// Batch of CPU to GPU uploads submitted together.
///
/// Resources are created immediately and can be used once the pass has been
/// submitted. Staging memory lives until the pass is submitted or dropped;
/// a pass dropped without [`submit`](Self::submit) uploads nothing.
pub struct CopyPass<'a, B: GpuBackend> {
    ctx: &'a Context<B>,
    copies: Vec<PendingCopy<B>>,
    submitted: bool,
}

impl<'a, B: GpuBackend> CopyPass<'a, B> {
    pub(super) fn new(ctx: &'a Context<B>) -> Self {
        Self {
            ctx,
            copies: Vec::new(),
            submitted: false,
        }
    }

    /// Number of uploads recorded so far.
    pub fn len(&self) -> usize {
        self.copies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copies.is_empty()
    }

    /// Creates a GPU buffer holding `elements`.
    pub fn create_buffer<E: Pod>(&mut self, usage: BufferUsage, elements: &[E]) -> Result<B::Buffer> {
        let bytes: &[u8] = bytemuck::cast_slice(elements);
        let size = u32::try_from(bytes.len()).map_err(|_| NeHeError::Fatal("buffer larger than 4 GiB"))?;

        let ctx = self.ctx;
        let backend = ctx.backend();
        let buffer = backend.create_buffer(&BufferDesc { usage, size })?;
        let transfer = match self.stage(bytes) {
            Ok(transfer) => transfer,
            Err(err) => {
                backend.release_buffer(buffer);
                return Err(err);
            }
        };

        self.copies.push(PendingCopy {
            transfer,
            target: Target::Buffer {
                buffer: buffer.clone(),
                size,
            },
        });
        Ok(buffer)
    }

    /// Creates a sampled texture from tightly packed `pixels`.
    ///
    /// With `generate_mipmaps` the texture gets a full mip chain, filled from
    /// the uploaded base level after the copy.
    pub fn create_texture_from_pixels(
        &mut self,
        format: TextureFormat,
        width: u32,
        height: u32,
        pixels: &[u8],
        generate_mipmaps: bool,
    ) -> Result<B::Texture> {
        let texel = format
            .bytes_per_texel()
            .ok_or(NeHeError::Fatal("depth textures cannot be uploaded"))?;
        if generate_mipmaps && !format.is_filterable() {
            return Err(NeHeError::Fatal("format cannot be mipmapped"));
        }
        let size = Size::new(width, height);
        if size.is_empty() {
            return Err(NeHeError::Fatal("texture has zero size"));
        }

        let tight_pitch = width
            .checked_mul(texel)
            .ok_or(NeHeError::Fatal("texture row larger than 4 GiB"))?;
        let expected = tight_pitch as usize * height as usize;
        if pixels.len() < expected {
            return Err(NeHeError::Fatal("pixel data smaller than the texture"));
        }

        let (usage, mip_levels) = if generate_mipmaps {
            (TextureUsage::SAMPLER | TextureUsage::COLOR_TARGET, mip_level_count(size))
        } else {
            (TextureUsage::SAMPLER, 1)
        };

        let ctx = self.ctx;
        let backend = ctx.backend();
        let row_pitch = backend.texture_row_pitch(format, width);
        let staged = repack_rows(&pixels[..expected], tight_pitch, row_pitch, height);

        let texture = backend.create_texture(&TextureDesc {
            format,
            usage,
            size,
            mip_levels,
            clear_depth: None,
        })?;
        let transfer = match self.stage(&staged) {
            Ok(transfer) => transfer,
            Err(err) => {
                backend.release_texture(texture);
                return Err(err);
            }
        };

        self.copies.push(PendingCopy {
            transfer,
            target: Target::Texture {
                texture: texture.clone(),
                size,
                row_pitch,
                generate_mipmaps,
            },
        });
        Ok(texture)
    }

    pub fn create_texture_from_bitmap(&mut self, bitmap: &Bitmap, generate_mipmaps: bool) -> Result<B::Texture> {
        self.create_texture_from_pixels(
            bitmap.format,
            bitmap.size.width,
            bitmap.size.height,
            &bitmap.pixels,
            generate_mipmaps,
        )
    }

    /// Loads `<name>.bmp` from the asset bundle and uploads it.
    pub fn create_texture_from_bitmap_resource(
        &mut self,
        name: &str,
        flip_vertically: bool,
        generate_mipmaps: bool,
    ) -> Result<B::Texture> {
        let bytes = self.ctx.bundle()?.load(name, "bmp")?;
        let bitmap = Bitmap::decode(&bytes, flip_vertically)?;
        self.create_texture_from_bitmap(&bitmap, generate_mipmaps)
    }

    /// Records every upload in one copy phase, then mipmap generation, and submits.
    pub fn submit(mut self) -> Result<()> {
        self.submitted = true;
        let backend = self.ctx.backend();
        let mut cmd = backend.acquire_command_buffer()?;

        backend.begin_copy_pass(&mut cmd);
        for copy in &self.copies {
            match &copy.target {
                Target::Buffer { buffer, size } => {
                    backend.upload_to_buffer(&mut cmd, &copy.transfer, buffer, *size);
                }
                Target::Texture { texture, size, row_pitch, .. } => {
                    backend.upload_to_texture(&mut cmd, &copy.transfer, texture, *size, *row_pitch);
                }
            }
        }
        backend.end_copy_pass(&mut cmd);

        let mut mipmapped = 0;
        for copy in &self.copies {
            if let Target::Texture { texture, generate_mipmaps: true, .. } = &copy.target {
                backend.generate_mipmaps(&mut cmd, texture);
                mipmapped += 1;
            }
        }

        backend.submit(cmd);
        log::debug!("copy pass submitted: {} uploads, {mipmapped} mip chains", self.copies.len());
        Ok(())
    }

    /// Abandons the pass, releasing staging memory without uploading.
    ///
    /// Resources already returned stay alive but hold undefined contents.
    pub fn discard(mut self) {
        self.submitted = true;
        log::debug!("copy pass discarded with {} pending uploads", self.copies.len());
    }

    fn stage(&self, bytes: &[u8]) -> Result<B::TransferBuffer> {
        let size = u32::try_from(bytes.len()).map_err(|_| NeHeError::Fatal("upload larger than 4 GiB"))?;
        let backend = self.ctx.backend();

        let mut transfer = backend.create_transfer_buffer(size)?;
        if let Err(err) = backend.write_transfer_buffer(&mut transfer, bytes) {
            backend.release_transfer_buffer(transfer);
            return Err(err);
        }
        Ok(transfer)
    }
}

impl<B: GpuBackend> Drop for CopyPass<'_, B> {
    fn drop(&mut self) {
        if !self.submitted && !self.copies.is_empty() {
            log::warn!("copy pass dropped without submit; {} uploads lost", self.copies.len());
        }

        let backend = self.ctx.backend();
        while let Some(copy) = self.copies.pop() {
            backend.release_transfer_buffer(copy.transfer);
        }
    }
}

fn repack_rows(pixels: &[u8], tight_pitch: u32, row_pitch: u32, height: u32) -> Cow<'_, [u8]> {
    if row_pitch == tight_pitch {
        return Cow::Borrowed(pixels);
    }

    let mut out = vec![0u8; row_pitch as usize * height as usize];
    for (src, dst) in pixels
        .chunks_exact(tight_pitch as usize)
        .zip(out.chunks_exact_mut(row_pitch as usize))
    {
        dst[..src.len()].copy_from_slice(src);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryBundle;
    use crate::core::AppConfig;
    use crate::device::fake::{Call, FakeBackend};

    fn context(backend: &FakeBackend) -> Context<FakeBackend> {
        Context::new(backend.clone(), &AppConfig::new("test", 64, 64))
    }

    fn position(calls: &[Call], pred: impl Fn(&Call) -> bool) -> usize {
        calls.iter().position(pred).expect("call not recorded")
    }

    // ── mip levels ──

    #[test]
    fn mip_count_follows_the_larger_side() {
        assert_eq!(mip_level_count(Size::new(1, 1)), 1);
        assert_eq!(mip_level_count(Size::new(256, 256)), 9);
        assert_eq!(mip_level_count(Size::new(256, 128)), 9);
        assert_eq!(mip_level_count(Size::new(640, 480)), 10);
        assert_eq!(mip_level_count(Size::new(1, 1000)), 10);
    }

    // ── submission ──

    #[test]
    fn empty_pass_submits_without_uploads() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);
        ctx.begin_copy_pass().submit().unwrap();

        let calls = backend.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Submit(_))).count(), 1);
        assert!(!calls.iter().any(|c| matches!(c, Call::UploadBuffer { .. } | Call::UploadTexture { .. })));
    }

    #[test]
    fn buffers_share_one_submission_and_one_copy_phase() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);

        let mut pass = ctx.begin_copy_pass();
        let a = pass.create_buffer(BufferUsage::VERTEX, &[1.0f32, 2.0, 3.0]).unwrap();
        let b = pass.create_buffer(BufferUsage::INDEX, &[0u16, 1, 2]).unwrap();
        let c = pass.create_buffer(BufferUsage::UNIFORM, &[0u32; 16]).unwrap();
        assert_eq!(pass.len(), 3);
        pass.submit().unwrap();

        let calls = backend.calls();
        let count = |pred: fn(&Call) -> bool| calls.iter().filter(|c| pred(c)).count();
        assert_eq!(count(|c| matches!(c, Call::Submit(_))), 1);
        assert_eq!(count(|c| matches!(c, Call::BeginCopyPass(_))), 1);
        assert_eq!(count(|c| matches!(c, Call::EndCopyPass(_))), 1);

        let uploads: Vec<(u32, u32)> = calls
            .iter()
            .filter_map(|c| match c {
                Call::UploadBuffer { buffer, size, .. } => Some((*buffer, *size)),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, [(a, 12), (b, 6), (c, 64)]);

        let begin = position(&calls, |c| matches!(c, Call::BeginCopyPass(_)));
        let end = position(&calls, |c| matches!(c, Call::EndCopyPass(_)));
        let first = position(&calls, |c| matches!(c, Call::UploadBuffer { .. }));
        assert!(begin < first && end > first);
    }

    #[test]
    fn staged_bytes_match_elements() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);
        ctx.copy_pass(|pass| pass.create_buffer(BufferUsage::VERTEX, &[1u16, 2])).unwrap();

        assert!(backend.calls().contains(&Call::WriteTransfer { id: 2, data: vec![1, 0, 2, 0] }));
    }

    #[test]
    fn mipmaps_are_generated_once_after_the_copy_phase() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);
        let pixels = vec![255u8; 8 * 8 * 4];

        let mut pass = ctx.begin_copy_pass();
        let plain = pass
            .create_texture_from_pixels(TextureFormat::Rgba8Unorm, 8, 8, &pixels, false)
            .unwrap();
        let mipped = pass
            .create_texture_from_pixels(TextureFormat::Rgba8Unorm, 8, 8, &pixels, true)
            .unwrap();
        pass.submit().unwrap();

        let calls = backend.calls();
        let mips: Vec<&Call> = calls.iter().filter(|c| matches!(c, Call::GenerateMipmaps { .. })).collect();
        assert_eq!(mips.len(), 1);
        assert!(matches!(mips[0], Call::GenerateMipmaps { texture, .. } if *texture == mipped));

        let end = position(&calls, |c| matches!(c, Call::EndCopyPass(_)));
        let mip = position(&calls, |c| matches!(c, Call::GenerateMipmaps { .. }));
        let submit = position(&calls, |c| matches!(c, Call::Submit(_)));
        assert!(end < mip && mip < submit);

        assert!(calls.iter().any(|c| matches!(
            c,
            Call::CreateTexture { id, mip_levels: 1, usage, .. } if *id == plain && *usage == TextureUsage::SAMPLER
        )));
        assert!(calls.iter().any(|c| matches!(
            c,
            Call::CreateTexture { id, mip_levels: 4, .. } if *id == mipped
        )));
    }

    #[test]
    fn rows_are_repacked_to_the_backend_pitch() {
        let backend = FakeBackend::new().with_row_alignment(8);
        let ctx = context(&backend);
        let pixels: Vec<u8> = (0..12).collect(); // one texel per row

        ctx.copy_pass(|pass| pass.create_texture_from_pixels(TextureFormat::Rgba8Unorm, 1, 3, &pixels, false))
            .unwrap();

        let calls = backend.calls();
        let staged = calls
            .iter()
            .find_map(|c| match c {
                Call::WriteTransfer { data, .. } => Some(data.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(staged, [0, 1, 2, 3, 0, 0, 0, 0, 4, 5, 6, 7, 0, 0, 0, 0, 8, 9, 10, 11, 0, 0, 0, 0]);
        assert!(calls.iter().any(|c| matches!(c, Call::UploadTexture { row_pitch: 8, .. })));
    }

    #[test]
    fn bitmap_resources_come_from_the_bundle() {
        use std::io::Cursor;

        let mut encoded = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 2))
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Bmp)
            .unwrap();

        let backend = FakeBackend::new();
        let config = AppConfig::new("test", 64, 64).with_bundle(MemoryBundle::new().with("NeHe.bmp", encoded));
        let ctx = Context::new(backend.clone(), &config);

        ctx.copy_pass(|pass| pass.create_texture_from_bitmap_resource("NeHe", true, true)).unwrap();

        assert!(backend.calls().iter().any(|c| matches!(
            c,
            Call::CreateTexture { format: TextureFormat::Rgba8Unorm, size, mip_levels: 3, .. }
                if *size == Size::new(4, 2)
        )));
    }

    // ── teardown ──

    #[test]
    fn transfers_are_released_once_in_reverse_order() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);

        let mut pass = ctx.begin_copy_pass();
        for n in 0..3u32 {
            pass.create_buffer(BufferUsage::VERTEX, &[n]).unwrap();
        }
        pass.submit().unwrap();

        let calls = backend.calls();
        let created: Vec<u32> = calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateTransfer { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        let released: Vec<u32> = calls
            .iter()
            .filter_map(|c| match c {
                Call::ReleaseTransfer(id) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(released, created.into_iter().rev().collect::<Vec<_>>());

        let submit = position(&calls, |c| matches!(c, Call::Submit(_)));
        let first_release = position(&calls, |c| matches!(c, Call::ReleaseTransfer(_)));
        assert!(submit < first_release);
    }

    #[test]
    fn abandoned_pass_releases_staging_without_uploading() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);

        {
            let mut pass = ctx.begin_copy_pass();
            pass.create_buffer(BufferUsage::VERTEX, &[1u32, 2]).unwrap();
            pass.create_buffer(BufferUsage::VERTEX, &[3u32]).unwrap();
        }
        let mut pass = ctx.begin_copy_pass();
        pass.create_buffer(BufferUsage::VERTEX, &[4u32]).unwrap();
        pass.discard();

        let calls = backend.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::ReleaseTransfer(_))).count(), 3);
        assert!(!calls.iter().any(|c| matches!(
            c,
            Call::AcquireCommandBuffer(_) | Call::UploadBuffer { .. } | Call::Submit(_)
        )));
    }

    // ── failures ──

    #[test]
    fn failed_mapping_releases_only_that_resource() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);

        let mut pass = ctx.begin_copy_pass();
        let kept = pass.create_buffer(BufferUsage::VERTEX, &[1u32]).unwrap();

        backend.fail_on("map_transfer_buffer");
        let err = pass.create_buffer(BufferUsage::VERTEX, &[2u32]).unwrap_err();
        assert_eq!(err.to_string(), "map_transfer_buffer: injected failure");
        backend.recover("map_transfer_buffer");

        assert_eq!(pass.len(), 1);
        pass.submit().unwrap();

        let calls = backend.calls();
        // buffer 1, transfer 2 succeed; buffer 3 and transfer 4 are the failed pair
        assert!(calls.contains(&Call::ReleaseBuffer(3)));
        assert!(calls.contains(&Call::ReleaseTransfer(4)));
        assert!(!calls.contains(&Call::ReleaseBuffer(kept)));
        assert!(calls.iter().any(|c| matches!(c, Call::UploadBuffer { buffer, .. } if *buffer == kept)));
    }

    #[test]
    fn failed_staging_allocation_releases_the_texture() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);
        backend.fail_on("create_transfer_buffer");

        let mut pass = ctx.begin_copy_pass();
        let err = pass
            .create_texture_from_pixels(TextureFormat::Rgba8Unorm, 2, 2, &[0; 16], true)
            .unwrap_err();
        assert_eq!(err.to_string(), "create_transfer_buffer: injected failure");
        assert_eq!(backend.live_textures(), 0);
        assert!(pass.is_empty());
    }

    #[test]
    fn invalid_pixel_uploads_are_rejected_before_allocation() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);
        let mut pass = ctx.begin_copy_pass();

        assert!(pass.create_texture_from_pixels(TextureFormat::Rgba8Unorm, 0, 4, &[], false).is_err());
        assert!(pass.create_texture_from_pixels(TextureFormat::Rgba8Unorm, 2, 2, &[0; 8], false).is_err());
        assert!(pass.create_texture_from_pixels(TextureFormat::D16Unorm, 2, 2, &[0; 8], false).is_err());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn unfilterable_formats_cannot_request_mipmaps() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);
        let pixels = [0u8; 4 * 4 * 16];

        let err = ctx
            .copy_pass(|pass| pass.create_texture_from_pixels(TextureFormat::Rgba32Float, 4, 4, &pixels, true))
            .unwrap_err();
        assert_eq!(err.to_string(), "format cannot be mipmapped");
        assert!(backend.calls().is_empty());

        ctx.copy_pass(|pass| pass.create_texture_from_pixels(TextureFormat::Rgba32Float, 4, 4, &pixels, false))
            .unwrap();
        assert!(!backend.calls().iter().any(|c| matches!(c, Call::GenerateMipmaps { .. })));
    }

    #[test]
    fn failed_command_buffer_still_releases_staging() {
        let backend = FakeBackend::new();
        let ctx = context(&backend);
        backend.fail_on("acquire_command_buffer");

        let err = ctx.copy_pass(|pass| pass.create_buffer(BufferUsage::VERTEX, &[1u32])).unwrap_err();
        assert_eq!(err.to_string(), "acquire_command_buffer: injected failure");
        assert_eq!(
            backend.calls().iter().filter(|c| matches!(c, Call::ReleaseTransfer(_))).count(),
            1
        );
    }
}
