//! Configuration Module
//!
//! Handles loading and managing store configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::error::{CacheError, Result};

/// Store and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub capacity: usize,
    /// Location of the write-ahead log
    pub wal_path: PathBuf,
    /// Whether every WAL append is fsynced before returning
    pub wal_sync: bool,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum cache entries (default: 100)
    /// - `WAL_PATH` - Write-ahead log file (default: data/wal.log)
    /// - `WAL_SYNC` - fsync each append, `true`/`false` (default: true)
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.capacity),
            wal_path: env::var("WAL_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.wal_path),
            wal_sync: env::var("WAL_SYNC")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.wal_sync),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Builds a config for the given capacity and log path, other fields defaulted.
    pub fn new(capacity: usize, wal_path: impl Into<PathBuf>) -> Self {
        Self {
            capacity,
            wal_path: wal_path.into(),
            ..Self::default()
        }
    }

    /// Rejects configurations the store cannot be built from.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 100,
            wal_path: PathBuf::from("data/wal.log"),
            wal_sync: true,
            server_port: 8000,
        }
    }
}
