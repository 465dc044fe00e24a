//! Client for the same-origin task generation proxy.
//!
//! The proxy hides the upstream generation service and its API key behind a
//! fixed same-origin endpoint.
//!
//! ### Specification
//!
//! - **Endpoint**: `POST {origin}/api/gemini`
//! - **Body**: JSON `{goal, prompt}`
//! - **Response**: JSON `{text}` with the generated free-form text
//! - **Errors**: any non-success status surfaces as `ProxyError::HttpError`
//!   carrying the status code; a single attempt, no retry.
//!
//! The call goes through whatever [`Fetch`] transport it is given — in the
//! application that is the shell worker, whose API-prefix route sends it
//! straight to the network, uncached.

pub mod error;
pub mod request;
pub mod response;

pub use error::ProxyError;
pub use request::TaskRequest;
pub use response::TaskResponse;

use crate::fetch::{Fetch, ShellRequest};

/// Fixed same-origin path of the proxy endpoint.
pub const PROXY_PATH: &str = "/api/gemini";

/// Client for the task generation proxy.
#[derive(Debug, Clone)]
pub struct ProxyClient<F: Fetch> {
    transport: F,
}

impl<F: Fetch> ProxyClient<F> {
    /// Create a client over the given transport.
    pub fn new(transport: F) -> Self {
        Self { transport }
    }

    /// Submit a goal and return the raw generated text.
    ///
    /// Single attempt; the caller decides how to present failures.
    pub async fn submit(&self, goal: &str) -> Result<String, ProxyError> {
        let task_request = TaskRequest::for_goal(goal)?;

        tracing::debug!("submitting goal to proxy: {}", task_request.goal);

        let request = ShellRequest::post_json(PROXY_PATH, &task_request)?;
        let response = self.transport.fetch(&request).await?;

        if !response.status.is_success() {
            return Err(ProxyError::HttpError { status: response.status.as_u16() });
        }

        let parsed: TaskResponse = serde_json::from_slice(&response.body).map_err(|e| ProxyError::Parse(e.to_string()))?;

        tracing::debug!("proxy answered with {} bytes of text", parsed.text.len());

        Ok(parsed.text)
    }
}
