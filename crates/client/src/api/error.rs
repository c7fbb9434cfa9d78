//! Route backend client error types.

use std::sync::Arc;

/// Errors from the route-planning backend client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request rejected before any network call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Backend answered with a non-success status or an unreadable body.
    ///
    /// `message` is the best message available: the body's `detail`, then
    /// its `error`, then a per-operation fallback.
    #[error("{message} (status {status})")]
    Upstream { status: u16, message: String },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Success status but the body does not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// A route came back without any coordinates.
    #[error("No route coordinates found.")]
    MissingCoordinates,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ApiError::Timeout } else { ApiError::Network(Arc::new(err)) }
    }
}

impl From<ApiError> for looproute_core::Error {
    fn from(err: ApiError) -> Self {
        use looproute_core::Error;

        match err {
            ApiError::InvalidRequest(msg) => Error::InvalidInput(msg),
            ApiError::Upstream { message, .. } => Error::Upstream(message),
            ApiError::Timeout => Error::Network("backend request timed out".into()),
            ApiError::Network(e) => Error::Network(e.to_string()),
            ApiError::Parse(msg) => Error::InvalidResponse(msg),
            ApiError::MissingCoordinates => Error::MissingCoordinates("No route coordinates found.".into()),
        }
    }
}
