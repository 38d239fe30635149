//! Error types for the remote API module.
//!
//! [`FetchError`] covers every failure talking to a collection or detail
//! endpoint and is fatal for an export run. [`DownloadFailure`] wraps the same
//! causes for the binary download endpoint, where the caller logs and moves on.

use thiserror::Error;

/// Errors that can occur while fetching records from the remote API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS, timeout).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body was not the JSON document the endpoint should return.
    #[error("undecodable response from {url}: {source}")]
    Decode {
        /// The URL whose body could not be decoded.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The configured API base URL is not a valid http(s) URL.
    #[error("invalid API base URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The token cannot be sent as an HTTP header value.
    #[error("API token contains characters that are not allowed in an HTTP header")]
    InvalidToken,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an invalid base URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Returns the HTTP status when the failure was a status error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A document's binary content could not be retrieved.
///
/// Non-fatal: the metadata export of the document still proceeds.
#[derive(Debug, Error)]
#[error("failed to download document {document_id}: {source}")]
pub struct DownloadFailure {
    /// The document whose content was requested.
    pub document_id: i64,
    /// What went wrong on the wire.
    #[source]
    pub source: FetchError,
}
