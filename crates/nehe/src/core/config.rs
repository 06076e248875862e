use std::fmt;
use std::sync::Arc;

use crate::assets::AssetBundle;
use crate::device::TextureFormat;

/// Window and runtime configuration of one lesson.
#[derive(Clone)]
pub struct AppConfig {
    pub title: String,
    /// Initial window width in logical pixels.
    pub width: u32,
    /// Initial window height in logical pixels.
    pub height: u32,
    /// Depth format of the managed depth buffer; `None` disables it.
    pub depth_format: Option<TextureFormat>,
    pub bundle: Option<Arc<dyn AssetBundle>>,
}

impl AppConfig {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            depth_format: None,
            bundle: None,
        }
    }

    pub fn with_depth_buffer(mut self, format: TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_bundle(mut self, bundle: impl AssetBundle + 'static) -> Self {
        self.bundle = Some(Arc::new(bundle));
        self
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("title", &self.title)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth_format", &self.depth_format)
            .field("bundle", &self.bundle.is_some())
            .finish()
    }
}
