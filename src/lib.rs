//! WAL KV - A single-node in-memory key-value store
//!
//! Bounded LRU cache whose mutations are made durable in a write-ahead log
//! before they are applied, and replayed from it on startup.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod wal;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{DeleteOutcome, KvStore};
