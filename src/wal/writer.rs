//! WAL Writer Module
//!
//! Append-only durable log of mutations.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::error::Result;
use crate::wal::{WalRecord, MAX_FRAME_SIZE};

// == Log Sink ==
/// Destination for encoded frames.
///
/// `append` must not return until the frame is as durable as the sink
/// promises; on error, no part of the frame may remain visible to replay.
pub trait LogSink: Send {
    fn append(&mut self, frame: &[u8]) -> io::Result<()>;

    fn sync(&mut self) -> io::Result<()>;
}

// == File Sink ==
/// Log file opened in append mode.
#[derive(Debug)]
pub struct FileSink {
    file: File,
    /// Length of the committed prefix
    len: u64,
    /// fsync after every append
    sync_each: bool,
    /// Set when a torn frame could not be rolled back
    poisoned: bool,
}

impl FileSink {
    /// Opens (creating if needed) the log file and its parent directory.
    pub fn open(path: &Path, sync_each: bool) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            len,
            sync_each,
            poisoned: false,
        })
    }

    /// Drops every byte past `valid_len`, returning how many were discarded.
    pub fn discard_after(&mut self, valid_len: u64) -> io::Result<u64> {
        if self.len <= valid_len {
            return Ok(0);
        }

        let discarded = self.len - valid_len;
        self.file.set_len(valid_len)?;
        self.file.sync_all()?;
        self.len = valid_len;
        Ok(discarded)
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once a failed append left bytes behind that could not be removed.
    /// A poisoned sink refuses every further append until the log is reopened.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}

impl LogSink for FileSink {
    fn append(&mut self, frame: &[u8]) -> io::Result<()> {
        if self.poisoned {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "WAL holds an unrecoverable torn frame; reopen the store",
            ));
        }

        let written = self.file.write_all(frame).and_then(|_| {
            if self.sync_each {
                self.file.sync_data()
            } else {
                Ok(())
            }
        });

        if let Err(err) = written {
            // Cut off whatever part of the frame reached the file
            if let Err(rollback) = self.file.set_len(self.len) {
                error!(
                    "Failed to roll back torn WAL frame at byte {}: {}; refusing further appends",
                    self.len, rollback
                );
                self.poisoned = true;
            }
            return Err(err);
        }

        self.len += frame.len() as u64;
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.sync_data()
    }
}

// == Write-Ahead Log ==
/// Durable, append-only record of mutating operations.
pub struct WriteAheadLog {
    sink: Box<dyn LogSink>,
    path: Option<PathBuf>,
    /// Records appended since open
    appended: u64,
}

impl std::fmt::Debug for WriteAheadLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteAheadLog")
            .field("path", &self.path)
            .field("appended", &self.appended)
            .finish()
    }
}

impl WriteAheadLog {
    // == Constructor ==
    /// Opens a file-backed log for appending.
    pub fn open(path: impl AsRef<Path>, sync_each: bool) -> Result<Self> {
        let path = path.as_ref();
        let sink = FileSink::open(path, sync_each)?;
        Ok(Self::from_file_sink(sink, path))
    }

    pub(crate) fn from_file_sink(sink: FileSink, path: &Path) -> Self {
        Self {
            sink: Box::new(sink),
            path: Some(path.to_path_buf()),
            appended: 0,
        }
    }

    /// Wraps an arbitrary sink.
    pub fn with_sink(sink: Box<dyn LogSink>) -> Self {
        Self {
            sink,
            path: None,
            appended: 0,
        }
    }

    // == Append ==
    /// Durably appends one record.
    ///
    /// Fails with `PersistenceFailure`; on failure nothing was logged.
    /// Records whose payload exceeds `MAX_FRAME_SIZE` are refused unwritten.
    pub fn append(&mut self, record: &WalRecord) -> Result<()> {
        let payload_len = record.payload_len();
        if payload_len > MAX_FRAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "record of {} bytes exceeds WAL frame limit of {} bytes",
                    payload_len, MAX_FRAME_SIZE
                ),
            )
            .into());
        }

        let frame = record.encode();
        self.sink.append(&frame)?;
        self.appended += 1;
        debug!("WAL append: {} byte frame for key '{}'", frame.len(), record.key());
        Ok(())
    }

    // == Flush ==
    /// Forces buffered log data to stable storage.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.sync()?;
        Ok(())
    }

    /// Number of records appended since the log was opened.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::wal::WalReplay;
    use std::io::BufReader;
    use tempfile::tempdir;

    fn replay_file(path: &Path) -> Vec<WalRecord> {
        let file = File::open(path).unwrap();
        WalReplay::new(BufReader::new(file))
            .map(|r| r.unwrap())
            .collect()
    }

    /// Sink whose writes always fail.
    struct FailingSink;

    impl LogSink for FailingSink {
        fn append(&mut self, _frame: &[u8]) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn sync(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("wal.log");

        let wal = WriteAheadLog::open(&path, true).unwrap();

        assert!(path.exists());
        assert_eq!(wal.path(), Some(path.as_path()));
        assert_eq!(wal.appended(), 0);
    }

    #[test]
    fn test_append_then_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        let mut wal = WriteAheadLog::open(&path, true).unwrap();
        wal.append(&WalRecord::set("a", "1")).unwrap();
        wal.append(&WalRecord::delete("a")).unwrap();
        wal.flush().unwrap();

        assert_eq!(wal.appended(), 2);
        assert_eq!(
            replay_file(&path),
            vec![WalRecord::set("a", "1"), WalRecord::delete("a")]
        );
    }

    #[test]
    fn test_reopen_appends_after_existing_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        {
            let mut wal = WriteAheadLog::open(&path, false).unwrap();
            wal.append(&WalRecord::set("a", "1")).unwrap();
        }
        {
            let mut wal = WriteAheadLog::open(&path, false).unwrap();
            wal.append(&WalRecord::set("b", "2")).unwrap();
        }

        assert_eq!(
            replay_file(&path),
            vec![WalRecord::set("a", "1"), WalRecord::set("b", "2")]
        );
    }

    #[test]
    fn test_discard_after_truncates_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        let good = WalRecord::set("a", "1").encode();
        let mut bytes = good.clone();
        bytes.extend_from_slice(&[0xAB; 5]);
        fs::write(&path, &bytes).unwrap();

        let mut sink = FileSink::open(&path, true).unwrap();
        assert_eq!(sink.discard_after(good.len() as u64).unwrap(), 5);
        assert_eq!(sink.len(), good.len() as u64);
        assert_eq!(fs::metadata(&path).unwrap().len(), good.len() as u64);

        // Nothing left to discard the second time
        assert_eq!(sink.discard_after(good.len() as u64).unwrap(), 0);
    }

    #[test]
    fn test_failed_rollback_poisons_sink() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let good = WalRecord::set("a", "1").encode();
        fs::write(&path, &good).unwrap();

        // Read-only handle: the write fails and so does the truncate
        let mut sink = FileSink {
            file: File::open(&path).unwrap(),
            len: good.len() as u64,
            sync_each: false,
            poisoned: false,
        };
        assert!(sink.append(&WalRecord::set("b", "2").encode()).is_err());
        assert!(sink.is_poisoned());

        // Even a writable file is refused once poisoned
        sink.file = OpenOptions::new().append(true).open(&path).unwrap();
        let err = sink.append(&WalRecord::set("c", "3").encode()).unwrap_err();
        assert!(err.to_string().contains("reopen"));
        assert_eq!(fs::metadata(&path).unwrap().len(), good.len() as u64);

        // A fresh sink over the same file works again
        let mut reopened = FileSink::open(&path, false).unwrap();
        assert!(!reopened.is_poisoned());
        reopened.append(&WalRecord::set("c", "3").encode()).unwrap();
        assert_eq!(
            replay_file(&path),
            vec![WalRecord::set("a", "1"), WalRecord::set("c", "3")]
        );
    }

    #[test]
    fn test_oversized_record_refused_before_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let mut wal = WriteAheadLog::open(&path, false).unwrap();
        wal.append(&WalRecord::set("a", "1")).unwrap();
        let len_before = fs::metadata(&path).unwrap().len();

        let huge = WalRecord::set("big", "x".repeat(MAX_FRAME_SIZE));
        let err = wal.append(&huge).unwrap_err();

        match err {
            CacheError::PersistenceFailure(source) => {
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(wal.appended(), 1);
        assert_eq!(fs::metadata(&path).unwrap().len(), len_before);

        // The log still accepts records within the limit
        wal.append(&WalRecord::set("b", "2")).unwrap();
        assert_eq!(
            replay_file(&path),
            vec![WalRecord::set("a", "1"), WalRecord::set("b", "2")]
        );
    }

    #[test]
    fn test_failed_append_reports_persistence_failure() {
        let mut wal = WriteAheadLog::with_sink(Box::new(FailingSink));

        let result = wal.append(&WalRecord::set("a", "1"));

        assert!(matches!(result, Err(CacheError::PersistenceFailure(_))));
        assert_eq!(wal.appended(), 0);
        assert!(wal.path().is_none());
    }
}
