//! WAL Replay Module
//!
//! Lazy, single-pass reader over a write-ahead log.

use std::io::{self, Read};

use crate::error::{CacheError, Result};
use crate::wal::record::{FrameHeader, WalRecord, HEADER_SIZE, MAX_FRAME_SIZE};

// == WAL Replay ==
/// Iterator yielding logged records in append order.
///
/// Iteration ends at a clean end of log, or after yielding one
/// `CorruptLogRecord` for the first truncated or damaged frame. Read
/// failures are yielded as `PersistenceFailure`. Nothing is yielded after
/// an error.
pub struct WalReplay<R> {
    reader: R,
    /// Byte offset just past the last complete frame
    offset: u64,
    done: bool,
}

impl<R: Read> WalReplay<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Length of the log prefix made of complete, verified frames.
    pub fn valid_len(&self) -> u64 {
        self.offset
    }

    fn corrupt(&self, reason: impl Into<String>) -> CacheError {
        CacheError::CorruptLogRecord {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    fn read_frame(&mut self) -> Result<Option<WalRecord>> {
        let mut header = [0u8; HEADER_SIZE];
        let read = read_full(&mut self.reader, &mut header)?;
        if read == 0 {
            return Ok(None);
        }
        if read < HEADER_SIZE {
            return Err(self.corrupt(format!(
                "truncated header ({} of {} bytes)",
                read, HEADER_SIZE
            )));
        }

        let header = FrameHeader::parse(&header);
        let len = header.len as usize;
        if len > MAX_FRAME_SIZE {
            return Err(self.corrupt(format!("frame length {} exceeds limit", len)));
        }

        let mut payload = vec![0u8; len];
        let read = read_full(&mut self.reader, &mut payload)?;
        if read < len {
            return Err(self.corrupt(format!("truncated payload ({} of {} bytes)", read, len)));
        }
        if !header.verify(&payload) {
            return Err(self.corrupt("checksum mismatch"));
        }

        let record = WalRecord::decode_payload(&payload).map_err(|reason| self.corrupt(reason))?;
        self.offset += (HEADER_SIZE + len) as u64;
        Ok(Some(record))
    }
}

impl<R: Read> Iterator for WalReplay<R> {
    type Item = Result<WalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_frame() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Reads until `buf` is full or the reader is exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
