//! Recovery Module
//!
//! Rebuilds cache state by replaying the write-ahead log.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use tracing::{info, warn};

use crate::cache::LruCache;
use crate::error::{CacheError, Result};
use crate::wal::{WalRecord, WalReplay};

// == Recovery Report ==
/// Outcome of one replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records applied to the cache
    pub applied: u64,
    /// Length of the log prefix made of complete records
    pub valid_len: u64,
    /// Bytes cut from the end of the log after replay
    pub discarded_bytes: u64,
    /// Why replay stopped early, if it did
    pub corruption: Option<String>,
}

/// Replays the log at `path` into `cache`. A missing log is an empty log.
pub fn recover(path: &Path, cache: &mut LruCache<String, String>) -> Result<RecoveryReport> {
    match File::open(path) {
        Ok(file) => replay_into(WalReplay::new(BufReader::new(file)), cache),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("No WAL found at {}, starting empty", path.display());
            Ok(RecoveryReport::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Applies every complete record through the normal cache operations.
///
/// Replay goes straight to the cache, so nothing is logged again, and
/// `put` evicts exactly as it did when the records were first written.
/// A corrupt or truncated frame ends replay without failing it.
pub fn replay_into<R: Read>(
    mut replay: WalReplay<R>,
    cache: &mut LruCache<String, String>,
) -> Result<RecoveryReport> {
    let mut report = RecoveryReport::default();

    for record in replay.by_ref() {
        match record {
            Ok(WalRecord::Set { key, value }) => {
                cache.put(key, value);
            }
            Ok(WalRecord::Delete { key }) => {
                cache.remove(&key);
            }
            Err(CacheError::CorruptLogRecord { offset, reason }) => {
                warn!(
                    "Stopping WAL replay at byte {}: {}; discarding the rest of the log",
                    offset, reason
                );
                report.corruption = Some(reason);
                break;
            }
            Err(err) => return Err(err),
        }
        report.applied += 1;
    }

    report.valid_len = replay.valid_len();
    Ok(report)
}
