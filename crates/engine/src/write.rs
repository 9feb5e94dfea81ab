//! Write path: `put`, `delete`, and the internal `flush`.
//!
//! Every mutation is appended to the WAL and flushed to disk *before* the
//! in-memory skip lists are touched, so a crash between the two can never
//! lose an acknowledged write — recovery just replays the WAL.
use crate::{Engine, EngineError};
use codec::DbOperation;
use log::debug;
use sstable::SSTableWriter;
use std::time::{SystemTime, UNIX_EPOCH};

impl Engine {
    /// Inserts `key -> value`.
    ///
    /// Removes `key` from the tombstone set before inserting it into the
    /// memtable, keeping the two disjoint. Returns
    /// [`EngineError::InvalidArgument`] if `key` or `value` is empty — both
    /// must be non-empty for a live entry (see the storage spec's data
    /// model).
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), EngineError> {
        if key.is_empty() {
            return Err(EngineError::InvalidArgument("key must not be empty".into()));
        }
        if value.is_empty() {
            return Err(EngineError::InvalidArgument("value must not be empty".into()));
        }

        self.wal_writer.append(&DbOperation::Put {
            key: key.clone(),
            value: value.clone(),
        })?;

        self.tombstones.delete(&key);
        let size_delta = key.len() + value.len();
        self.memtable.insert(key, value)?;
        self.approx_size += size_delta;

        self.maybe_auto_flush()
    }

    /// Deletes `key` by inserting a tombstone.
    ///
    /// Deleting an absent key is a no-op, not an error — `delete` always
    /// succeeds once the WAL append itself succeeds. Returns
    /// [`EngineError::InvalidArgument`] if `key` is empty.
    pub fn delete(&mut self, key: Vec<u8>) -> Result<(), EngineError> {
        if key.is_empty() {
            return Err(EngineError::InvalidArgument("key must not be empty".into()));
        }

        self.wal_writer.append(&DbOperation::Delete { key: key.clone() })?;

        self.memtable.delete(&key);
        let size_delta = key.len();
        self.tombstones.insert(key, Vec::new())?;
        self.approx_size += size_delta;

        self.maybe_auto_flush()
    }

    /// Forces a flush of the memtable and tombstone set to a new SSTable,
    /// regardless of `config.flush_threshold`. A no-op if both are empty.
    pub fn force_flush(&mut self) -> Result<(), EngineError> {
        if self.memtable.is_empty() && self.tombstones.is_empty() {
            return Ok(());
        }
        self.flush()
    }

    fn maybe_auto_flush(&mut self) -> Result<(), EngineError> {
        if let Some(threshold) = self.config.flush_threshold {
            if self.approx_size >= threshold {
                return self.flush();
            }
        }
        Ok(())
    }

    /// Merges the memtable and tombstone skip lists into a new SSTable,
    /// truncates the WAL, and resets both skip lists.
    ///
    /// # Steps
    ///
    /// 1. Write the merged SSTable via [`SSTableWriter::write_with_threshold`]
    ///    at a temp path, then atomically rename into place.
    /// 2. Truncate the WAL to zero bytes — only after the SSTable write
    ///    above has succeeded, so a crash mid-flush still has the WAL to
    ///    recover from.
    /// 3. Open a fresh [`wal::WalWriter`] in append mode.
    /// 4. Reset the memtable and tombstone skip lists.
    /// 5. Open the new SSTable and insert it at position 0 (newest-first).
    pub(crate) fn flush(&mut self) -> Result<(), EngineError> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_millis();
        let sst_name = format!("sst-{:020}-{}.sst", self.flush_seq, ts);
        let sst_path = self.sst_dir.join(&sst_name);
        self.flush_seq += 1;

        debug!(
            "flush starting: {} memtable entries, {} tombstones -> {}",
            self.memtable.len(),
            self.tombstones.len(),
            sst_name
        );

        SSTableWriter::write_with_threshold(
            &sst_path,
            &self.memtable,
            &self.tombstones,
            self.config.sparse_index_threshold,
        )?;

        wal::WalWriter::truncate(&self.wal_path)?;
        self.wal_writer = wal::WalWriter::create(&self.wal_path, self.config.wal_sync)?;

        self.memtable.clear();
        self.tombstones.clear();
        self.approx_size = 0;

        let reader = sstable::SSTableReader::open(&sst_path)?;
        self.sstables.insert(0, reader);

        debug!("flush complete: {} sealed sstables", self.sstables.len());

        Ok(())
    }
}
