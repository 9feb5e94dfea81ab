//! # SSTable — sorted-string table
//!
//! Immutable, on-disk storage files for the storage engine. When the
//! memtable and tombstone [`skiplist::SkipList`]s are flushed, they are
//! merge-sorted into a single file: a payload region of length-framed
//! `(key, value)` entries followed by a sparse directory that samples one
//! `(key, offset)` anchor roughly every [`writer::SPARSE_INDEX_THRESHOLD`]
//! bytes of payload.
//!
//! ## File layout
//!
//! ```text
//! offset 0  : end_of_data_offset (u64 LE)
//! offset 8  : directory_length_bytes (u64 LE)
//! offset 16 : payload (key_len | key | value_len | [value]) *
//! end_of_data_offset .. +directory_length_bytes : directory (key_len | key | offset) *
//! ```
//!
//! A zero-length value in the payload denotes a tombstone. There is no
//! footer, no checksum, and no versioning — this is the whole file.
//!
//! Once written, a file is never modified; compaction and multi-level
//! merging are out of scope (see the crate-level docs in `engine`).

mod format;
mod reader;
mod writer;

pub use reader::{Lookup, RangeScanIter, SSTableReader};
pub use writer::SSTableWriter;

use std::io;
use thiserror::Error;

/// Errors raised while writing or reading an SSTable file.
#[derive(Debug, Error)]
pub enum SSTableError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The file's bytes do not form a well-formed SSTable.
    #[error("corrupt sstable: {0}")]
    Corrupt(String),
    /// The memtable and tombstone skiplists both contained the same key at
    /// flush time — a programming error upstream, since the engine is
    /// responsible for keeping the two disjoint (see `skiplist`'s
    /// `allow_empty_value` split).
    #[error("invariant violation: key {0:?} present in both memtable and tombstones")]
    InvariantViolation(Vec<u8>),
}

impl From<codec::CodecError> for SSTableError {
    fn from(e: codec::CodecError) -> Self {
        match e {
            codec::CodecError::Io(io_err) => SSTableError::Io(io_err),
            codec::CodecError::Corrupt(msg) => SSTableError::Corrupt(msg),
        }
    }
}

#[cfg(test)]
mod tests;
