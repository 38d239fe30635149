//! Remote data fetcher for the document-management REST API.
//!
//! # Endpoints
//!
//! - `GET {base}/{tags,documents,custom_fields}/?page=N` (paginated)
//! - `GET {base}/documents/{id}/` (detail record)
//! - `GET {base}/documents/{id}/download/` (binary content)
//! - `GET {base}/{correspondents,document_types,storage_paths}/{id}/` (name lookups)

mod client;
mod error;
mod models;

pub use client::{
    ApiClient, CONNECT_TIMEOUT_SECS, DEFAULT_AUTH_SCHEME, READ_TIMEOUT_SECS, UNKNOWN_NAME,
};
pub use error::{DownloadFailure, FetchError};
pub use models::{
    CustomFieldDefinition, CustomFieldDefinitions, CustomFieldValue, DocumentDetail,
    DocumentSummary, FieldDataType, Tag, TagMap,
};
