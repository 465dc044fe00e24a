//! Proxy response body.

use serde::{Deserialize, Serialize};

/// JSON body the proxy answers with.
///
/// A missing `text` field deserializes to an empty string; the normalizer
/// turns that into an empty task list downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    #[serde(default)]
    pub text: String,
}
