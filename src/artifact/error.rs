//! Errors of the artifact writer.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while writing documents and reports.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// I/O error writing `path`.
    #[error("I/O error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("JSON serialization error writing {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The spreadsheet library rejected the report.
    #[error("failed to write report {}: {source}", path.display())]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

impl ArtifactError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn spreadsheet(path: &Path, source: rust_xlsxwriter::XlsxError) -> Self {
        Self::Spreadsheet {
            path: path.to_path_buf(),
            source,
        }
    }
}
