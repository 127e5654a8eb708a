//! Response DTOs for the store API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (POST /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Outcome, always "success"
    pub status: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            key: key.into(),
        }
    }
}

/// Response body for the DELETE operation (DELETE /delete/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Outcome, always "deleted"
    pub status: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            status: "deleted".to_string(),
            key: key.into(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Configured entry limit
    pub capacity: usize,
    /// Records appended to the WAL since startup
    pub wal_appends: u64,
    /// Records replayed from the WAL at startup
    pub wal_replayed: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Seconds since the store was opened
    pub uptime_seconds: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from store statistics
    pub fn new(stats: &CacheStats, capacity: usize, uptime: Duration) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            capacity,
            wal_appends: stats.wal_appends,
            wal_replayed: stats.wal_replayed,
            hit_rate: stats.hit_rate(),
            uptime_seconds: uptime.as_secs_f64(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
