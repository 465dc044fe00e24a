//! Proxy client error types.

/// Errors from the task generation proxy client.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Goal was empty after trimming.
    #[error("goal must not be empty")]
    EmptyGoal,

    /// Non-success HTTP status from the proxy.
    #[error("proxy error: status {status}")]
    HttpError { status: u16 },

    /// Response body did not parse as the expected JSON shape.
    #[error("parse error: {0}")]
    Parse(String),

    /// Transport failure while reaching the proxy.
    #[error(transparent)]
    Transport(#[from] taskshell_core::Error),
}
