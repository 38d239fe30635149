//! Per-document files: the downloaded PDF and the raw detail record.
//!
//! An existing file of the same name is overwritten; two documents with the
//! same title in one job therefore leave only the last one's files.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, instrument};

use super::error::ArtifactError;

/// Writes `<base>.json`: the detail record as returned by the API, UTF-8,
/// indented by four spaces, non-ASCII characters kept as-is.
///
/// # Errors
///
/// Returns [`ArtifactError`] on I/O or serialization failure.
#[instrument(skip(dir, detail), fields(component = "artifact", operation = "write_document_json"))]
pub fn write_document_json(dir: &Path, base: &str, detail: &Value) -> Result<PathBuf, ArtifactError> {
    let path = dir.join(format!("{base}.json"));
    let file = File::create(&path).map_err(|e| ArtifactError::io(&path, e))?;
    let mut writer = BufWriter::new(file);

    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    detail
        .serialize(&mut serializer)
        .map_err(|e| ArtifactError::json(&path, e))?;
    writer.flush().map_err(|e| ArtifactError::io(&path, e))?;

    debug!(path = %path.display(), "document JSON written");
    Ok(path)
}

/// Writes `<base>.pdf` with the downloaded bytes.
///
/// # Errors
///
/// Returns [`ArtifactError::Io`] when the file cannot be written.
#[instrument(skip(dir, bytes), fields(component = "artifact", operation = "write_document_pdf", bytes = bytes.len()))]
pub fn write_document_pdf(dir: &Path, base: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
    let path = dir.join(format!("{base}.pdf"));
    fs::write(&path, bytes).map_err(|e| ArtifactError::io(&path, e))?;
    debug!(path = %path.display(), "document PDF written");
    Ok(path)
}
