//! Store Module
//!
//! Durable key-value store: the LRU cache and the write-ahead log behind a
//! single lock, plus startup recovery.

mod recovery;

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, LruCache};
use crate::config::Config;
use crate::error::Result;
use crate::wal::{FileSink, WalRecord, WriteAheadLog};

pub use recovery::{recover, replay_into, RecoveryReport};

// == Delete Outcome ==
/// Result of a delete that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// State guarded by the store lock.
#[derive(Debug)]
struct StoreInner {
    cache: LruCache<String, String>,
    wal: WriteAheadLog,
    stats: CacheStats,
}

// == KV Store ==
/// Thread-safe, crash-recoverable key-value store.
///
/// Every operation runs under one exclusive lock. For mutations the lock
/// covers both the WAL append and the in-memory change, so the log order is
/// the order in which effects become visible, and nothing is applied unless
/// its record was appended first.
#[derive(Debug)]
pub struct KvStore {
    inner: Mutex<StoreInner>,
    capacity: usize,
    recovery: RecoveryReport,
    started: Instant,
}

impl KvStore {
    // == Open ==
    /// Opens the store described by `config`, replaying its WAL.
    ///
    /// No operation can reach the store until replay has finished, since
    /// the handle only exists once this returns. A damaged tail is cut off
    /// the log before it is reopened for appending.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let path = config.wal_path.as_path();

        info!("Store state: recovering from {}", path.display());
        let mut cache = LruCache::new(config.capacity)?;
        let mut report = recover(path, &mut cache)?;

        let mut sink = FileSink::open(path, config.wal_sync)?;
        report.discarded_bytes = sink.discard_after(report.valid_len)?;
        if report.discarded_bytes > 0 {
            warn!(
                "Discarded {} trailing WAL bytes after byte {}",
                report.discarded_bytes, report.valid_len
            );
        }

        let mut stats = CacheStats::new();
        stats.wal_replayed = report.applied;
        stats.set_total_entries(cache.len());

        info!(
            "Store state: serving ({} records replayed, {} entries, capacity {})",
            report.applied,
            cache.len(),
            config.capacity
        );

        let wal = WriteAheadLog::from_file_sink(sink, path);
        Ok(Self::from_parts(cache, wal, stats, report))
    }

    /// Builds an empty store over an already opened log, without replay.
    pub fn with_wal(capacity: usize, wal: WriteAheadLog) -> Result<Self> {
        let cache = LruCache::new(capacity)?;
        Ok(Self::from_parts(
            cache,
            wal,
            CacheStats::new(),
            RecoveryReport::default(),
        ))
    }

    fn from_parts(
        cache: LruCache<String, String>,
        wal: WriteAheadLog,
        stats: CacheStats,
        recovery: RecoveryReport,
    ) -> Self {
        let capacity = cache.capacity();
        Self {
            inner: Mutex::new(StoreInner { cache, wal, stats }),
            capacity,
            recovery,
            started: Instant::now(),
        }
    }

    // == Set ==
    /// Stores a key-value pair.
    ///
    /// Any key and value are accepted. The record is appended to the WAL
    /// first; if that fails (including a record too large to frame) the call
    /// returns `PersistenceFailure` and the cache is left untouched.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        let value = value.into();

        let mut inner = self.inner.lock();
        if let Err(err) = inner.wal.append(&WalRecord::set(key.as_str(), value.as_str())) {
            warn!("SET '{}' aborted, WAL append failed: {}", key, err);
            return Err(err);
        }
        inner.stats.record_append();

        if let Some((evicted, _)) = inner.cache.put(key, value) {
            debug!("Evicted least recently used key '{}'", evicted);
            inner.stats.record_eviction();
        }
        let len = inner.cache.len();
        inner.stats.set_total_entries(len);
        Ok(())
    }

    // == Get ==
    /// Retrieves a value, promoting the key to most recently used.
    ///
    /// Reads are not logged.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        let value = inner.cache.get(key).cloned();
        match value {
            Some(_) => inner.stats.record_hit(),
            None => inner.stats.record_miss(),
        }
        value
    }

    // == Delete ==
    /// Removes a key.
    ///
    /// Deleting an absent key is reported as `NotFound` and writes nothing
    /// to the log.
    pub fn delete(&self, key: &str) -> Result<DeleteOutcome> {
        let mut inner = self.inner.lock();
        if !inner.cache.contains_key(key) {
            return Ok(DeleteOutcome::NotFound);
        }

        if let Err(err) = inner.wal.append(&WalRecord::delete(key)) {
            warn!("DELETE '{}' aborted, WAL append failed: {}", key, err);
            return Err(err);
        }
        inner.stats.record_append();

        inner.cache.remove(key);
        let len = inner.cache.len();
        inner.stats.set_total_entries(len);
        Ok(DeleteOutcome::Deleted)
    }

    // == Introspection ==
    /// Returns the current number of entries.
    pub fn size(&self) -> usize {
        self.inner.lock().cache.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().cache.keys()
    }

    /// Returns a snapshot of the store statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.cache.len());
        stats
    }

    /// Time since the store was opened.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Returns what happened while replaying the log at open.
    pub fn recovery_report(&self) -> &RecoveryReport {
        &self.recovery
    }

    // == Lifecycle ==
    /// Forces the log to stable storage.
    pub fn flush(&self) -> Result<()> {
        self.inner.lock().wal.flush()
    }

    /// Flushes the log and releases the store.
    pub fn close(self) -> Result<()> {
        let mut inner = self.inner.into_inner();
        inner.wal.flush()?;
        info!("Store closed after {} WAL appends", inner.wal.appended());
        Ok(())
    }
}
