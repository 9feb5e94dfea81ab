//! # Engine — the storage engine
//!
//! The central orchestrator tying [`skiplist`], [`wal`], and [`sstable`]
//! into a single-node, ordered key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   |
//!   v
//! ┌─────────────────────────────────────────────────┐
//! │                    ENGINE                        │
//! │                                                   │
//! │ write.rs  → WAL append → memtable/tombstone       │
//! │               insert (skiplist)                   │
//! │                                                    │
//! │ flush()   → merge memtable + tombstones           │
//! │               → new SSTable, memtable/tombstones   │
//! │               reset, WAL truncated                 │
//! │                                                    │
//! │ read.rs   → memtable/tombstones → SSTables         │
//! │               (newest first); first match wins    │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module      | Purpose                                              |
//! |-------------|-------------------------------------------------------|
//! | `lib.rs`    | `Engine` struct, `open`, accessors, `Drop`             |
//! | `recovery`  | WAL replay, SSTable directory scan, tmp file cleanup   |
//! | `write`     | `put`, `delete`, `flush`                               |
//! | `read`      | `get`, `has`, `range_scan`                             |
//!
//! ## Crash safety
//!
//! Every mutation is appended to the WAL, and the append is flushed to disk,
//! *before* the in-memory skip lists are touched (§4.3 of the storage
//! spec this engine implements). SSTables are published via temp-file +
//! atomic rename (see `sstable::SSTableWriter`); the WAL is only truncated
//! after that rename succeeds.
//!
//! ## Out of scope
//!
//! Multi-level compaction and cross-SSTable merge are not implemented:
//! sealed SSTables accumulate as a flat, newest-first list, and reads fall
//! through them in order. `range_scan` does not merge across the memtable
//! and multiple SSTables — see [`read`] for the exact, intentionally
//! limited contract.
mod read;
mod recovery;
mod write;

pub use recovery::{load_sstables, replay_wal};

use config::EngineConfig;
use skiplist::SkipList;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use wal::WalWriter;

/// Errors surfaced by the [`Engine`] public API.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A mutating call received an empty key, or `put` received an empty
    /// value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A WAL record or SSTable byte stream failed to decode as anything
    /// other than a clean truncated tail.
    #[error("corrupt format: {0}")]
    CorruptFormat(String),
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<skiplist::SkipListError> for EngineError {
    fn from(e: skiplist::SkipListError) -> Self {
        EngineError::InvalidArgument(e.to_string())
    }
}

impl From<wal::WalError> for EngineError {
    fn from(e: wal::WalError) -> Self {
        match e {
            wal::WalError::Io(io_err) => EngineError::Io(io_err),
            wal::WalError::Corrupt(msg) => EngineError::CorruptFormat(msg),
        }
    }
}

impl From<sstable::SSTableError> for EngineError {
    fn from(e: sstable::SSTableError) -> Self {
        match e {
            sstable::SSTableError::Io(io_err) => EngineError::Io(io_err),
            sstable::SSTableError::Corrupt(msg) => EngineError::CorruptFormat(msg),
            sstable::SSTableError::InvariantViolation(key) => {
                panic!("invariant violation: key {key:?} present in both memtable and tombstones")
            }
        }
    }
}

/// The central storage engine: one memtable, one tombstone set, a WAL, and
/// zero or more sealed SSTables.
///
/// # Write path
///
/// 1. Append the operation to the WAL and flush it to disk.
/// 2. Apply the mutation to the memtable/tombstone skip lists.
/// 3. If `flush_threshold` is set and exceeded, flush to a new SSTable.
///
/// # Read path
///
/// 1. Check the memtable, then the tombstone set.
/// 2. Check sealed SSTables, newest to oldest. First match (live or
///    tombstoned) wins.
///
/// # Recovery
///
/// On [`Engine::open`], the WAL is replayed into a fresh memtable +
/// tombstone pair, and `sst_dir` is scanned for `.sst` files, loaded
/// newest-first by filename order.
pub struct Engine {
    pub(crate) memtable: SkipList,
    pub(crate) tombstones: SkipList,
    /// Sealed SSTables, newest first.
    pub(crate) sstables: Vec<sstable::SSTableReader>,
    pub(crate) wal_path: PathBuf,
    pub(crate) sst_dir: PathBuf,
    pub(crate) wal_writer: WalWriter,
    pub(crate) config: EngineConfig,
    /// Monotonic counter used only to generate unique, sortable SSTable
    /// filenames (`sst-{flush_seq:020}-{timestamp_ms}.sst`). Not part of
    /// the on-disk data model — purely a naming device.
    pub(crate) flush_seq: u64,
    /// Running estimate of memtable + tombstone byte size, used to decide
    /// when to auto-flush. Reset to 0 on flush.
    pub(crate) approx_size: usize,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("wal_path", &self.wal_path)
            .field("sst_dir", &self.sst_dir)
            .field("memtable_entries", &self.memtable.len())
            .field("tombstone_entries", &self.tombstones.len())
            .field("sstable_count", &self.sstables.len())
            .field("approx_size", &self.approx_size)
            .finish()
    }
}

impl Engine {
    /// Opens the engine at the paths named in `config`, performing full
    /// recovery: WAL replay into a fresh memtable/tombstone pair, then
    /// loading any existing `.sst` files from `config.sst_dir`.
    ///
    /// Creates `config.sst_dir` if it does not already exist. Leftover
    /// `.sst.tmp` files from an interrupted flush are removed.
    pub fn open(config: EngineConfig) -> Result<Self, EngineError> {
        std::fs::create_dir_all(&config.sst_dir)?;
        recovery::cleanup_tmp_files(&config.sst_dir);

        let mut memtable = SkipList::new(false);
        let mut tombstones = SkipList::new(true);
        replay_wal(&config.wal_path, &mut memtable, &mut tombstones)?;

        let wal_writer = WalWriter::create(&config.wal_path, config.wal_sync)?;
        let sstables = load_sstables(&config.sst_dir)?;
        let flush_seq = recovery::next_flush_seq(&sstables_filenames(&config.sst_dir)?);

        let approx_size = recovery::approx_size(&memtable, &tombstones);

        Ok(Self {
            memtable,
            tombstones,
            sstables,
            wal_path: config.wal_path.clone(),
            sst_dir: config.sst_dir.clone(),
            wal_writer,
            config,
            flush_seq,
            approx_size,
        })
    }

    /// Number of sealed SSTables backing this engine.
    #[must_use]
    pub fn sstable_count(&self) -> usize {
        self.sstables.len()
    }

    /// Number of live entries currently in the memtable.
    #[must_use]
    pub fn memtable_len(&self) -> usize {
        self.memtable.len()
    }
}

fn sstables_filenames(sst_dir: &std::path::Path) -> Result<Vec<String>, EngineError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(sst_dir)? {
        let entry = entry?;
        if let Some(name) = entry.path().file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".sst") {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Best-effort flush on drop: any data left in the memtable/tombstones is
/// flushed to an SSTable so it isn't silently discarded. Errors are ignored
/// since `Drop` cannot propagate them — the WAL still has the data, and the
/// next [`Engine::open`] will recover it.
impl Drop for Engine {
    fn drop(&mut self) {
        if !self.memtable.is_empty() || !self.tombstones.is_empty() {
            let _ = self.flush();
        }
    }
}

#[cfg(test)]
mod tests;
