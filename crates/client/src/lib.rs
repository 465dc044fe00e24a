//! Client code for taskshell.
//!
//! This crate provides the same-origin HTTP fetch layer, the offline shell
//! worker that routes and caches requests, the proxy client for the task
//! generation endpoint, and the free-text task normalizer.

pub mod fetch;
pub mod proxy;
pub mod tasks;
pub mod worker;

pub use fetch::{Fetch, FetchClient, FetchConfig, FetchResponse, RequestMode, ShellRequest};
pub use proxy::{PROXY_PATH, ProxyClient, ProxyError};
pub use tasks::normalize;
pub use worker::{API_PREFIX, ShellWorker};
