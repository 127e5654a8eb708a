//! WAL Module
//!
//! Write-ahead log: every mutation is framed, checksummed and appended
//! before it is applied in memory, and replayed in order at startup.

mod record;
mod replay;
mod writer;

pub use record::{FrameHeader, WalRecord, HEADER_SIZE, MAX_FRAME_SIZE};
pub use replay::WalReplay;
pub use writer::{FileSink, LogSink, WriteAheadLog};
