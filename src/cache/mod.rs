//! Cache Module
//!
//! Provides the bounded in-memory LRU cache: an entry table of node handles
//! over an arena-backed access-order list.

mod entry;
mod list;
mod stats;
mod store;


// Re-export public types
pub use entry::{Entry, NodeHandle};
pub use list::AccessOrderList;
pub use stats::CacheStats;
pub use store::LruCache;
