//! Unified error types for taskshell.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the store, the worker, and the fetch layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty goal).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A request path that cannot be normalized.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// No cached response for the given path under the current tag.
    #[error("cache miss: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("cache store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("cache store migration failed: {0}")]
    MigrationFailed(String),

    /// A non-success HTTP status where only success is acceptable
    /// (manifest population during install).
    #[error("http status {status} for {path}")]
    HttpStatus { path: String, status: u16 },

    /// A lifecycle transition attempted out of order.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Transport-level network failure (connection refused, DNS, timeout).
    ///
    /// HTTP error statuses are not transport failures; they travel as
    /// ordinary captured responses.
    #[error("network error: {0}")]
    Network(String),

    /// Response body exceeded the configured size limit.
    #[error("response too large: {0}")]
    TooLarge(String),
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
