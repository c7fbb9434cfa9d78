//! Unified error types for looproute.
//!
//! Every layer converts into [`Error`], which in turn maps onto MCP error
//! codes for the tool server.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for looproute.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., latitude out of range).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The tile cache worker is not in a state that allows the operation.
    #[error("WORKER_STATE: {0}")]
    WorkerState(String),

    /// Transport failure talking to an upstream service.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Upstream answered with a non-success status.
    #[error("UPSTREAM_ERROR: {0}")]
    Upstream(String),

    /// Upstream answered with a body that could not be used.
    #[error("INVALID_RESPONSE: {0}")]
    InvalidResponse(String),

    /// Save requested while no generated route is waiting to be saved.
    #[error("NO_PENDING_ROUTE: generate a route first")]
    NoPendingRoute,

    /// Favorite id is not present in the loaded favorites list.
    #[error("FAVORITE_NOT_FOUND: {0}")]
    FavoriteNotFound(String),

    /// Route or favorite has no coordinates to draw.
    #[error("MISSING_COORDINATES: {0}")]
    MissingCoordinates(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::WorkerState(msg) => (-32004, msg.clone()),
            Error::Network(msg) => (-32005, msg.clone()),
            Error::Upstream(msg) => (-32006, msg.clone()),
            Error::InvalidResponse(msg) => (-32007, msg.clone()),
            Error::NoPendingRoute => (-32008, "Generate a route before saving it".to_string()),
            Error::FavoriteNotFound(id) => (-32009, format!("favorite {id} not found; reload the favorites list")),
            Error::MissingCoordinates(msg) => (-32010, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
