//! SQLite-backed response store for the offline shell.
//!
//! This module provides the persistent, versioned key-value store behind the
//! cache manager, with async access via tokio-rusqlite. It supports:
//!
//! - One row per (store tag, request path), addressed by SHA-256 key
//! - Atomic all-or-nothing population of a tag (install)
//! - Best-effort sweep of stale tags (activate)
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod key;
pub mod migrations;
pub mod responses;

pub use crate::Error;

pub use connection::StoreDb;
pub use responses::CachedResponse;
