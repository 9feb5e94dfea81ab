//! Read path: `get`, `has`, `range_scan`.
//!
//! Point lookups check the memtable and tombstone set first (freshest
//! data), then fall through sealed SSTables newest to oldest — the first
//! match, live or tombstoned, wins.
//!
//! `range_scan` is intentionally narrower: cross-source range merging
//! (memtable + multiple SSTables) is not part of this engine's contract.
//! A scan is served entirely from the memtable (filtered against the
//! tombstone set) when the memtable is non-empty, and otherwise delegates
//! to the single newest SSTable. A scan never merges memtable and SSTable
//! data, nor does it merge across more than one SSTable.
use crate::{Engine, EngineError};
use sstable::Lookup;

impl Engine {
    /// Looks up `key`. Returns `Ok(None)` if the key is absent or tombstoned
    /// anywhere visible to this engine.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        if let Some(value) = self.memtable.get(key) {
            return Ok(Some(value.to_vec()));
        }
        if self.tombstones.contains_key(key) {
            return Ok(None);
        }

        for sst in &self.sstables {
            match sst.lookup(key)? {
                Lookup::Found(value) => return Ok(Some(value)),
                Lookup::Tombstone => return Ok(None),
                Lookup::Absent => continue,
            }
        }

        Ok(None)
    }

    /// `true` if [`get`](Self::get) would return a value.
    pub fn has(&self, key: &[u8]) -> Result<bool, EngineError> {
        Ok(self.get(key)?.is_some())
    }

    /// Scans keys in `[start, limit]`, ascending, skipping tombstones.
    ///
    /// If the memtable holds any entries, the scan is served entirely from
    /// the memtable — sealed SSTables are not consulted. Otherwise, the
    /// scan delegates to the single newest SSTable, if any. See the module
    /// docs above for why this is narrower than a full cross-source merge.
    pub fn range_scan(&self, start: &[u8], limit: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, EngineError> {
        if !self.memtable.is_empty() {
            return Ok(self
                .memtable
                .range_from(start)
                .take_while(|(k, _)| *k <= limit)
                .filter(|(k, _)| !self.tombstones.contains_key(k))
                .map(|(k, v)| (k.to_vec(), v.to_vec()))
                .collect());
        }

        match self.sstables.first() {
            Some(sst) => Ok(sst.range_scan(start, limit)?.collect()),
            None => Ok(Vec::new()),
        }
    }
}
