use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the runtime.
///
/// Nothing here is retried: every variant propagates to the lesson's `main`
/// and terminates the program after being reported.
#[derive(Debug, Error)]
pub enum NeHeError {
    /// Programmer or configuration mistake (missing bundle, no usable shader format, ...).
    #[error("{0}")]
    Fatal(&'static str),

    /// A GPU or windowing call failed.
    #[error("{operation}: {diagnostic}")]
    Backend {
        operation: &'static str,
        diagnostic: String,
    },

    /// Reading an asset from disk failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl NeHeError {
    /// Builds a backend error from the failing operation and the backend's diagnostic.
    pub fn backend(operation: &'static str, diagnostic: impl ToString) -> Self {
        Self::Backend {
            operation,
            diagnostic: diagnostic.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error is an asset that simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T, E = NeHeError> = std::result::Result<T, E>;
