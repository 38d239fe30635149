//! Errors of the export directory manager.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while preparing or archiving an export directory.
#[derive(Debug, Error)]
pub enum ExportDirError {
    /// A tag job's directory does not exist. Recorded, not fatal.
    #[error("export directory does not exist: {}", path.display())]
    Missing { path: PathBuf },

    /// Filesystem failure on `path`.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the archive failed.
    #[error("failed to write archive {}: {source}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl ExportDirError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn zip(path: &Path, source: zip::result::ZipError) -> Self {
        Self::Zip {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether this is the non-fatal missing-directory condition.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}
