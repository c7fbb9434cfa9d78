//! Upstream fetch pipeline for map tile requests.
//!
//! ### Requests
//! - Absolute http(s) URLs only; fragments are dropped, query strings kept.
//! - Method and headers are forwarded as given.
//!
//! ### Responses
//! - Snapshot of status, headers and the full body as [`Bytes`].
//! - Cloning a response shares the body buffer without consuming it, so the
//!   caller's copy and the cached copy stay independently readable.
//!
//! ### Upstream
//! - [`Upstream`] is the seam between the worker and the network.
//! - [`HttpUpstream`] is the reqwest implementation. It applies no timeout:
//!   tile fetches are governed by the network stack alone.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use sha2::{Digest, Sha256};
use std::time::Instant;

pub use url::{UrlError, parse_request_url};

use looproute_core::CachedResponse;

/// Errors raised while talking to the upstream.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Transport failure: DNS, connect, TLS, reset, or body read.
    #[error("network error: {0}")]
    Network(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// Method, URL or header could not form a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// A request as seen by the fetch handler.
#[derive(Debug, Clone)]
pub struct TileRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl TileRequest {
    /// Build a request with no extra headers.
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, headers: HeaderMap::new() }
    }

    /// Parse `url` and build a GET request for it.
    pub fn get(url: &str) -> Result<Self, UrlError> {
        Ok(Self::new(Method::GET, parse_request_url(url)?))
    }

    /// Build a request from loosely typed parts.
    ///
    /// The method is uppercased before parsing; headers keep their order.
    pub fn from_parts(method: &str, url: &str, headers: &[(String, String)]) -> Result<Self, FetchError> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| FetchError::InvalidRequest(format!("invalid method: {method}")))?;
        let url = parse_request_url(url).map_err(|e| FetchError::InvalidRequest(e.to_string()))?;

        let mut map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| FetchError::InvalidRequest(format!("invalid header name: {name}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| FetchError::InvalidRequest(format!("invalid value for header {name}")))?;
            map.append(name, value);
        }

        Ok(Self { method, url, headers: map })
    }

    /// Target hostname, lowercase.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }
}

/// Distinguishes real responses from the generic network-error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Basic,
    Error,
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct TileResponse {
    pub kind: ResponseKind,
    /// HTTP status; 0 for network-error responses.
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TileResponse {
    /// The generic network-error response: status 0, no headers, empty body.
    pub fn network_error() -> Self {
        Self { kind: ResponseKind::Error, status: 0, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// True for 2xx responses.
    pub fn is_ok(&self) -> bool {
        (200..=299).contains(&self.status)
    }

    /// Content-Type header, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Hex SHA-256 of the body.
    pub fn body_sha256(&self) -> String {
        hex::encode(Sha256::digest(&self.body))
    }

    /// Snapshot this response for storage under `request` in `cache_name`.
    ///
    /// The body buffer is shared, not moved, so `self` stays readable.
    pub fn to_cached(&self, cache_name: &str, request: &TileRequest) -> CachedResponse {
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
            .collect();

        CachedResponse {
            cache_name: cache_name.to_string(),
            method: request.method.as_str().to_string(),
            url: request.url.to_string(),
            status_code: self.status,
            headers,
            body: self.body.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl From<CachedResponse> for TileResponse {
    fn from(entry: CachedResponse) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in &entry.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => tracing::debug!(header = %name, "skipping unreadable cached header"),
            }
        }

        Self { kind: ResponseKind::Basic, status: entry.status_code, headers, body: Bytes::from(entry.body) }
    }
}

/// Anything that can perform a network fetch for the worker.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Perform the request.
    ///
    /// Non-success statuses are returned as responses; only transport
    /// failures are errors.
    async fn fetch(&self, request: &TileRequest) -> Result<TileResponse, FetchError>;
}

/// Upstream backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    http: Client,
}

impl HttpUpstream {
    /// Create an upstream that identifies itself with `user_agent`.
    pub fn new(user_agent: &str) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: &TileRequest) -> Result<TileResponse, FetchError> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(format!("failed to read response: {e}")))?;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(TileResponse { kind: ResponseKind::Basic, status: status.as_u16(), headers, body })
    }
}
