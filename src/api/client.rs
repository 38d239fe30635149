//! HTTP client for the document-management REST API.
//!
//! All requests are plain sequential GETs carrying a static token in the
//! `Authorization` header. Collection endpoints are paginated with
//! `?page=N` and a `next` link; the client follows pages until `next` is
//! empty.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::{DownloadFailure, FetchError};
use super::models::{
    CustomFieldDefinitions, DocumentSummary, NamedRecord, Page, RawCustomField, Tag,
};
use crate::user_agent;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large documents).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Authorization scheme used by Paperless-ngx style servers.
pub const DEFAULT_AUTH_SCHEME: &str = "Token";

/// Placeholder returned by [`ApiClient::resolve_name_by_id`] when the lookup misses.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Client for the remote API.
///
/// Create once per run and reuse for every request (connection pooling).
///
/// # Example
///
/// ```no_run
/// use tag_exporter_core::ApiClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ApiClient::new("https://dms.example.com/api", "secret", "Token")?;
/// let tags = client.fetch_tags().await?;
/// println!("{} tags", tags.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the base URL is not http(s), the token is
    /// not a valid header value, or the HTTP client cannot be built.
    pub fn new(base_url: &str, token: &str, auth_scheme: &str) -> Result<Self, FetchError> {
        Self::with_timeouts(
            base_url,
            token,
            auth_scheme,
            CONNECT_TIMEOUT_SECS,
            READ_TIMEOUT_SECS,
        )
    }

    /// Creates a client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_timeouts(
        base_url: &str,
        token: &str,
        auth_scheme: &str,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, FetchError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url).map_err(|_| FetchError::invalid_url(&base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(&base_url));
        }

        let mut authorization = HeaderValue::from_str(&format!("{auth_scheme} {token}"))
            .map_err(|_| FetchError::InvalidToken)?;
        authorization.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);

        let client = Client::builder()
            .user_agent(user_agent::default_user_agent())
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;

        Ok(Self { client, base_url })
    }

    /// The API base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The web UI root: the base URL with a trailing `/api` segment removed.
    #[must_use]
    pub fn web_base_url(&self) -> &str {
        self.base_url
            .strip_suffix("/api")
            .unwrap_or(&self.base_url)
    }

    /// Link to a document's details page in the web UI.
    #[must_use]
    pub fn details_page_url(&self, document_id: i64) -> String {
        format!("{}/documents/{document_id}/details", self.web_base_url())
    }

    /// Fetches every record of a paginated collection endpoint.
    ///
    /// Requests `{base}/{endpoint}/?page=1`, `?page=2`, ... and concatenates
    /// each page's `results`, stopping at the first page without `next`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if any page fails or is not the expected JSON.
    #[instrument(skip(self), fields(component = "api", operation = "fetch_collection"))]
    pub async fn fetch_collection<T: DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<Vec<T>, FetchError> {
        let mut records = Vec::new();
        let mut page_number: u32 = 1;
        loop {
            let url = format!("{}/{endpoint}/?page={page_number}", self.base_url);
            let page: Page<T> = self.get_json(&url).await?;
            let has_next = page.has_next();
            records.extend(page.results);
            debug!(page = page_number, total = records.len(), "fetched page");
            if !has_next {
                break;
            }
            page_number += 1;
        }
        info!(endpoint, records = records.len(), "collection fetched");
        Ok(records)
    }

    /// Fetches all tags.
    ///
    /// # Errors
    ///
    /// See [`fetch_collection`](Self::fetch_collection).
    pub async fn fetch_tags(&self) -> Result<Vec<Tag>, FetchError> {
        self.fetch_collection("tags").await
    }

    /// Fetches all document summaries.
    ///
    /// # Errors
    ///
    /// See [`fetch_collection`](Self::fetch_collection).
    pub async fn fetch_documents(&self) -> Result<Vec<DocumentSummary>, FetchError> {
        self.fetch_collection("documents").await
    }

    /// Fetches custom-field definitions and resolves select options.
    ///
    /// # Errors
    ///
    /// See [`fetch_collection`](Self::fetch_collection).
    pub async fn fetch_custom_field_definitions(
        &self,
    ) -> Result<CustomFieldDefinitions, FetchError> {
        let raw: Vec<RawCustomField> = self.fetch_collection("custom_fields").await?;
        Ok(CustomFieldDefinitions::new(
            raw.into_iter().map(RawCustomField::into_definition),
        ))
    }

    /// Fetches the full detail record of a document as raw JSON.
    ///
    /// The raw value is kept so the JSON sidecar is an exact copy of what the
    /// server returned; decode it with
    /// [`DocumentDetail::from_json`](super::DocumentDetail::from_json).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failure, non-success status, or a
    /// body that is not JSON.
    #[instrument(skip(self), fields(component = "api", operation = "fetch_document_detail"))]
    pub async fn fetch_document_detail(&self, document_id: i64) -> Result<Value, FetchError> {
        let url = format!("{}/documents/{document_id}/", self.base_url);
        self.get_json(&url).await
    }

    /// Best-effort reverse lookup of a record's display name.
    ///
    /// Returns an empty string when `id` is absent and [`UNKNOWN_NAME`] on any
    /// failure; never fails.
    #[instrument(skip(self), fields(component = "api", operation = "resolve_name_by_id"))]
    pub async fn resolve_name_by_id(&self, endpoint: &str, id: Option<i64>) -> String {
        let Some(id) = id else {
            return String::new();
        };
        let url = format!("{}/{endpoint}/{id}/", self.base_url);
        match self.get_json::<NamedRecord>(&url).await {
            Ok(record) => record.name,
            Err(error) => {
                debug!(%error, status = ?error.status(), "name lookup missed");
                UNKNOWN_NAME.to_string()
            }
        }
    }

    /// Downloads a document's binary content.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadFailure`] on transport failure or non-success status.
    #[instrument(skip(self), fields(component = "api", operation = "download_document"))]
    pub async fn download_document(&self, document_id: i64) -> Result<Vec<u8>, DownloadFailure> {
        let url = format!("{}/documents/{document_id}/download/", self.base_url);
        let wrap = |source| DownloadFailure {
            document_id,
            source,
        };
        let response = self.send(&url, None).await.map_err(wrap)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| wrap(FetchError::network(&url, e)))?;
        debug!(bytes = bytes.len(), "document downloaded");
        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.send(url, Some("application/json")).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::network(url, e))?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(
                url,
                preview = %String::from_utf8_lossy(&body[..body.len().min(200)]),
                "response is not the expected JSON"
            );
            FetchError::decode(url, e)
        })
    }

    async fn send(&self, url: &str, accept: Option<&'static str>) -> Result<Response, FetchError> {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = ApiClient::new("https://dms.example.com/api/", "t", "Token").unwrap();
        assert_eq!(client.base_url(), "https://dms.example.com/api");
    }

    #[test]
    fn test_web_base_strips_api_suffix() {
        let client = ApiClient::new("https://dms.example.com/api", "t", "Token").unwrap();
        assert_eq!(
            client.details_page_url(12),
            "https://dms.example.com/documents/12/details"
        );
    }

    #[test]
    fn test_web_base_keeps_paths_without_api_suffix() {
        // only a whole trailing `/api` segment is removed, unlike a character strip
        let client = ApiClient::new("https://dms.example.com/pia", "t", "Token").unwrap();
        assert_eq!(client.web_base_url(), "https://dms.example.com/pia");
    }

    #[test]
    fn test_new_rejects_non_http_url() {
        let result = ApiClient::new("ftp://dms.example.com/api", "t", "Token");
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
        let result = ApiClient::new("not a url", "t", "Token");
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn test_new_rejects_token_with_newline() {
        let result = ApiClient::new("https://dms.example.com/api", "abc\ndef", "Token");
        assert!(matches!(result, Err(FetchError::InvalidToken)));
    }
}
