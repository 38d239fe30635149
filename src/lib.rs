//! Tag Exporter Core Library
//!
//! Exports the documents of a Paperless-ngx style document-management
//! server into one directory per tag: the original files, the raw JSON
//! detail records and a formatted spreadsheet report per tag.
//!
//! # Architecture
//!
//! - [`api`] - Paginated REST client (tags, documents, custom fields, downloads)
//! - [`normalize`] - Dates, currency and custom fields to flat report rows
//! - [`export_dir`] - Tag/directory reconciliation, daily skip, archive-then-clear
//! - [`artifact`] - PDF/JSON files and the `.xlsx` report
//! - [`orchestrator`] - The job loop tying everything together
//! - [`run_log`] / [`progress`] - The persistent run log and terminal progress

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod artifact;
pub mod export_dir;
pub mod host;
pub mod job;
pub mod normalize;
pub mod orchestrator;
pub mod progress;
pub mod run_log;
mod user_agent;

/// Program name used in report banners and run log file names.
pub const PROGRAM_NAME: &str = "tag-exporter";

// Re-export commonly used types
pub use api::{ApiClient, DEFAULT_AUTH_SCHEME, DownloadFailure, FetchError};
pub use export_dir::{ExportDirError, ExportRoot};
pub use host::HostInfo;
pub use job::{ALL_DOCUMENTS_DIR, ExportJob};
pub use normalize::CurrencyLocale;
pub use orchestrator::{ExportError, ExportOptions, Exporter, JobOutcome, RunSummary};
pub use progress::ProgressReporter;
pub use run_log::RunLog;
