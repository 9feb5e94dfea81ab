//! # WAL — Write-Ahead Log
//!
//! Provides crash-safe durability for the storage engine. Every mutation
//! (`Put` or `Delete`) is serialized into a binary record and appended to
//! the WAL **before** the corresponding in-memory update. On restart the
//! WAL is replayed to reconstruct the memtable and tombstone set, so no
//! acknowledged write is lost.
//!
//! Records are framed and encoded by the [`codec`] crate
//! ([`codec::DbOperation`]); this crate only owns the file handling —
//! opening, appending, flushing, truncating, and sequential replay.
//!
//! ## Example
//!
//! ```rust,no_run
//! use codec::DbOperation;
//! use wal::{WalWriter, WalReader};
//!
//! let mut w = WalWriter::create("wal.log", true).unwrap();
//! w.append(&DbOperation::Put {
//!     key: b"hello".to_vec(),
//!     value: b"world".to_vec(),
//! }).unwrap();
//! drop(w);
//!
//! let mut r = WalReader::open("wal.log").unwrap();
//! r.replay(|op| println!("{:?}", op)).unwrap();
//! ```

use codec::{CodecError, DbOperation};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use thiserror::Error;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record failed to decode (unknown opcode, inconsistent length field).
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<CodecError> for WalError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Io(io_err) => WalError::Io(io_err),
            CodecError::Corrupt(msg) => WalError::Corrupt(msg),
        }
    }
}

/// Append-only WAL writer.
///
/// Each record is serialized via [`codec::DbOperation::encode`] into a
/// reusable scratch buffer and written to the underlying file with a single
/// `write_all` call. When `sync` is `true`, every append is followed by
/// `sync_all()` (fsync) to guarantee the record is durable on disk before
/// the call returns.
pub struct WalWriter {
    file: File,
    sync: bool,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl WalWriter {
    /// Opens (or creates) a WAL file in append mode.
    ///
    /// # Arguments
    ///
    /// * `path` - file system path for the WAL (created if it does not exist).
    /// * `sync` - if true, every `append` call is followed by `fsync`.
    pub fn create<P: AsRef<Path>>(path: P, sync: bool) -> Result<Self, WalError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;
        Ok(Self {
            file,
            sync,
            buf: Vec::with_capacity(256),
        })
    }

    /// Serializes `op` and appends it to the WAL file.
    pub fn append(&mut self, op: &DbOperation) -> Result<(), WalError> {
        self.buf.clear();
        op.encode(&mut self.buf)?;

        self.file.write_all(&self.buf)?;
        self.file.flush()?;

        if self.sync {
            self.file.sync_all()?;
        }

        Ok(())
    }

    /// Forces all buffered data to be written to disk via `sync_all()`.
    ///
    /// Useful when `sync` is `false` (batched mode) and the caller wants to
    /// ensure durability at a specific point (e.g., before acknowledging a batch).
    pub fn sync_to_disk(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Truncates the WAL file at `path` to zero bytes.
    ///
    /// Called after a successful SSTable flush, once the data the WAL was
    /// protecting is durable elsewhere. The caller must open a fresh
    /// [`WalWriter`] afterward — this function does not touch `self`.
    pub fn truncate<P: AsRef<Path>>(path: P) -> Result<(), WalError> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(())
    }
}

/// Sequential WAL reader that yields valid records.
///
/// The reader is generic over any `Read` implementor, allowing it to be used
/// with real files (`WalReader<File>`) or in-memory buffers for testing.
///
/// A truncated tail record (e.g., from a crash mid-write) is treated as a
/// clean EOF — all fully-written records before it are still returned.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
}

impl WalReader<File> {
    /// Opens an existing WAL file for sequential replay.
    ///
    /// Returns `WalError::Io` if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> WalReader<R> {
    /// Constructs a reader from any `Read` implementor.
    ///
    /// Useful for unit tests that supply an in-memory buffer (e.g., `Cursor<Vec<u8>>`).
    pub fn from_reader(reader: R) -> Self {
        WalReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Replays every valid record in the WAL, calling `apply` for each one.
    ///
    /// # Termination
    ///
    /// - **Clean EOF** (no more bytes) -> returns `Ok(())`.
    /// - **Truncated tail** (partial record at end, e.g., crash mid-write) ->
    ///   returns `Ok(())` after yielding all complete records before it.
    /// - **Malformed record** (bad opcode, inconsistent length field) ->
    ///   returns `Err(WalError::Corrupt)`.
    /// - **I/O error** -> returns `Err(WalError::Io(...))`.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), WalError>
    where
        F: FnMut(DbOperation),
    {
        loop {
            match DbOperation::decode(&mut self.rdr)? {
                Some(op) => apply(op),
                None => return Ok(()),
            }
        }
    }
}
