//! Artifact writer: per-document PDF and JSON files plus the per-job report.

mod error;
mod filename;
mod files;
mod report;

pub use error::ArtifactError;
pub use filename::{MAX_TITLE_CHARS, artifact_base_name, report_path, sanitize_title};
pub use files::{write_document_json, write_document_pdf};
pub use report::{ReportContext, SHEET_NAME, SpreadsheetReport};
