//! Same-origin HTTP fetch layer.
//!
//! Every outbound request is a path resolved against the configured origin.
//! Transport failures (DNS, refused connection, timeout) surface as
//! [`Error::Network`]; HTTP error statuses do not — they are captured
//! responses the caller inspects, so the worker can store and serve them
//! like any other response.
//!
//! The [`Fetch`] trait is the seam between the worker and the real network;
//! tests substitute a stub transport behind it.

pub mod path;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, StatusCode, header};
use serde::Serialize;
use url::Url;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub use path::PathError;

use taskshell_core::Error;

/// How a request reaches the shell: a top-level page navigation or an
/// ordinary subresource fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    Resource,
}

/// An outbound same-origin request.
#[derive(Debug, Clone)]
pub struct ShellRequest {
    pub method: Method,
    /// Origin-relative path, possibly with a query string.
    pub path: String,
    pub mode: RequestMode,
    pub body: Option<Bytes>,
    pub content_type: Option<String>,
}

impl ShellRequest {
    /// A plain GET for a subresource.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            mode: RequestMode::Resource,
            body: None,
            content_type: None,
        }
    }

    /// A top-level page navigation.
    pub fn navigate(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            mode: RequestMode::Navigate,
            body: None,
            content_type: None,
        }
    }

    /// A POST carrying a JSON body.
    pub fn post_json(path: impl Into<String>, body: &impl Serialize) -> Result<Self, Error> {
        let bytes = serde_json::to_vec(body).map_err(|e| Error::InvalidInput(format!("failed to serialize body: {e}")))?;
        Ok(Self {
            method: Method::POST,
            path: path.into(),
            mode: RequestMode::Resource,
            body: Some(Bytes::from(bytes)),
            content_type: Some("application/json".to_string()),
        })
    }
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "taskshell/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "taskshell/0.1".to_string(), max_bytes: 5 * 1024 * 1024, timeout: Duration::from_millis(20000) }
    }
}

/// Response from a fetch operation (network or cache).
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// Normalized origin-relative path the response answers.
    pub path: String,
    /// HTTP status code.
    pub status: StatusCode,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Response headers as (name, value) pairs; values that are not valid
    /// UTF-8 are skipped.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Bytes,
    /// Time taken to fetch in milliseconds; zero when served from the store.
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// UTF-8 view of the body, lossy for invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport seam for outbound requests.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, request: &ShellRequest) -> Result<FetchResponse, Error>;
}

#[async_trait]
impl<T: Fetch + ?Sized> Fetch for Arc<T> {
    async fn fetch(&self, request: &ShellRequest) -> Result<FetchResponse, Error> {
        (**self).fetch(request).await
    }
}

/// HTTP fetch client bound to one origin.
pub struct FetchClient {
    http: Client,
    base: Url,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client for the given origin.
    pub fn new(base_url: &str, config: FetchConfig) -> Result<Self, Error> {
        let base = Url::parse(base_url).map_err(|e| Error::InvalidInput(format!("invalid base URL: {e}")))?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, base, config })
    }

    /// The origin requests are resolved against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetch for FetchClient {
    /// Fetch a path from the origin, returning raw bytes and metadata.
    ///
    /// Respects the byte limit; never turns an HTTP error status into an Err.
    async fn fetch(&self, request: &ShellRequest) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let normalized = path::normalize(&request.path).map_err(|e| Error::InvalidPath(e.to_string()))?;
        let url = self
            .base
            .join(&normalized)
            .map_err(|e| Error::InvalidPath(format!("{normalized}: {e}")))?;

        let mut builder = self.http.request(request.method.clone(), url.clone());
        if let Some(content_type) = &request.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("timeout fetching {normalized}"))
            } else {
                Error::Network(format!("{normalized}: {e}"))
            }
        })?;

        let status = response.status();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::TooLarge(format!("{len} bytes exceeds {}", self.config.max_bytes)));
        }

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect();

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response body: {e}")))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::TooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", normalized, status, fetch_ms, body.len());

        Ok(FetchResponse { path: normalized, status, content_type, headers, body, fetch_ms })
    }
}
