//! Core types and shared functionality for taskshell.
//!
//! This crate provides:
//! - Versioned response store with SQLite backend
//! - Asset manifest for the offline shell
//! - Unified error types
//! - Configuration structures

pub mod config;
pub mod error;
pub mod manifest;
pub mod store;

pub use config::AppConfig;
pub use error::Error;
pub use manifest::{AssetManifest, CACHE_VERSION};
pub use store::{CachedResponse, StoreDb};
