use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{NeHeError, Result};

/// Read-only source of lesson assets (shaders, bitmaps, world files).
pub trait AssetBundle {
    /// Returns the bytes of `<name>.<extension>`.
    ///
    /// A missing asset is reported as an [`NeHeError::Io`] whose
    /// [`is_not_found`](NeHeError::is_not_found) is true.
    fn load(&self, name: &str, extension: &str) -> Result<Vec<u8>>;
}

/// Bundle backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `Data/` next to the running executable.
    pub fn beside_executable() -> Result<Self> {
        let exe = std::env::current_exe().map_err(|e| NeHeError::io("<current executable>", e))?;
        let dir = exe
            .parent()
            .ok_or(NeHeError::Fatal("executable path has no parent directory"))?;
        Ok(Self::new(dir.join("Data")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, name: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{name}.{extension}"))
    }
}

impl AssetBundle for DirectoryBundle {
    fn load(&self, name: &str, extension: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name, extension);
        log::debug!("loading asset {}", path.display());
        std::fs::read(&path).map_err(|e| NeHeError::io(path, e))
    }
}

/// Bundle held entirely in memory, keyed by `<name>.<extension>`.
#[derive(Debug, Clone, Default)]
pub struct MemoryBundle {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(file, bytes);
        self
    }

    pub fn insert(&mut self, file: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(file.into(), bytes.into());
    }
}

impl AssetBundle for MemoryBundle {
    fn load(&self, name: &str, extension: &str) -> Result<Vec<u8>> {
        let key = format!("{name}.{extension}");
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| NeHeError::io(key, std::io::ErrorKind::NotFound.into()))
    }
}
