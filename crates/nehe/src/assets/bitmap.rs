use image::DynamicImage;

use crate::coords::Size;
use crate::device::TextureFormat;
use crate::error::{NeHeError, Result};

/// Decoded pixels ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    pub size: Size<u32>,
    pub format: TextureFormat,
    /// Tightly packed rows, top row first.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Decodes an encoded image (BMP) held in memory.
    pub fn decode(bytes: &[u8], flip_vertically: bool) -> Result<Self> {
        let image = image::load_from_memory(bytes).map_err(|e| NeHeError::backend("decode_bitmap", e))?;
        Ok(Self::from_image(image, flip_vertically))
    }

    /// Normalizes any pixel layout other than RGBA8 to RGBA8.
    pub fn from_image(image: DynamicImage, flip_vertically: bool) -> Self {
        let image = if flip_vertically { image.flipv() } else { image };
        let size = Size::new(image.width(), image.height());

        let pixels = match image {
            DynamicImage::ImageRgba8(buffer) => buffer.into_raw(),
            other => {
                log::debug!("converting {:?} bitmap to RGBA8", other.color());
                other.to_rgba8().into_raw()
            }
        };

        Self {
            size,
            format: TextureFormat::CANONICAL_COLOR,
            pixels,
        }
    }
}
