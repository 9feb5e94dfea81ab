use codec::Entry;
use std::cmp::Ordering;
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::format::{write_directory_entry, write_prefix, DATA_OFFSET};
use crate::SSTableError;
use skiplist::SkipList;

/// Number of payload bytes between sparse index anchors. The writer pushes a
/// new `(key, offset)` directory entry once the running byte count since the
/// last anchor exceeds this threshold.
pub const SPARSE_INDEX_THRESHOLD: u64 = 1024;

/// Flushes a memtable and its tombstone set to a new immutable SSTable file.
///
/// The writer is stateless: [`write`](SSTableWriter::write) does the whole
/// job in one call — merge, directory construction, and an atomic
/// temp-file-then-rename publish so a crash mid-write never leaves a
/// half-written file at the real path.
pub struct SSTableWriter;

impl SSTableWriter {
    /// Merges `memtable` and `tombstones` (both already key-sorted) into a
    /// new SSTable at `path`.
    ///
    /// Uses the default [`SPARSE_INDEX_THRESHOLD`]. See
    /// [`write_with_threshold`](SSTableWriter::write_with_threshold) to
    /// override it (tests force small thresholds to exercise the directory).
    ///
    /// # Errors
    ///
    /// Returns [`SSTableError::InvariantViolation`] if the same key appears
    /// in both `memtable` and `tombstones` — the two are expected to be
    /// disjoint at all times (see `skiplist`'s `allow_empty_value` split,
    /// enforced by the engine). Returns [`SSTableError::Io`] on any
    /// underlying file operation failure; the target path is left untouched
    /// in that case.
    pub fn write(path: &Path, memtable: &SkipList, tombstones: &SkipList) -> Result<(), SSTableError> {
        Self::write_with_threshold(path, memtable, tombstones, SPARSE_INDEX_THRESHOLD)
    }

    /// As [`write`](SSTableWriter::write), with an explicit sparse index
    /// threshold in bytes.
    pub fn write_with_threshold(
        path: &Path,
        memtable: &SkipList,
        tombstones: &SkipList,
        sparse_index_threshold: u64,
    ) -> Result<(), SSTableError> {
        let tmp_path = path.with_extension("sst.tmp");
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);
        file.seek(SeekFrom::Start(DATA_OFFSET))?;

        let mut mem_iter = memtable.iter();
        let mut tomb_iter = tombstones.iter();
        let mut mem_head = mem_iter.next();
        let mut tomb_head = tomb_iter.next();

        let mut directory: Vec<(Vec<u8>, u64)> = Vec::new();
        let mut bytes_since_anchor: u64 = 0;

        loop {
            let (key, value) = match (mem_head, tomb_head) {
                (None, None) => break,
                (Some(m), None) => {
                    mem_head = mem_iter.next();
                    m
                }
                (None, Some(t)) => {
                    tomb_head = tomb_iter.next();
                    t
                }
                (Some(m), Some(t)) => match m.0.cmp(t.0) {
                    Ordering::Less => {
                        mem_head = mem_iter.next();
                        m
                    }
                    Ordering::Greater => {
                        tomb_head = tomb_iter.next();
                        t
                    }
                    Ordering::Equal => return Err(SSTableError::InvariantViolation(m.0.to_vec())),
                },
            };

            let entry_offset = file.stream_position()?;
            let entry = Entry {
                key: key.to_vec(),
                value: value.to_vec(),
            };
            let mut encoded = Vec::new();
            entry.encode(&mut encoded)?;
            file.write_all(&encoded)?;
            bytes_since_anchor += encoded.len() as u64;

            if bytes_since_anchor > sparse_index_threshold {
                directory.push((key.to_vec(), entry_offset));
                bytes_since_anchor = 0;
            }
        }

        let end_of_data_offset = file.stream_position()?;

        let mut directory_buf = Vec::new();
        for (key, offset) in &directory {
            write_directory_entry(&mut directory_buf, key, *offset)?;
        }
        file.write_all(&directory_buf)?;

        file.seek(SeekFrom::Start(0))?;
        write_prefix(&mut file, end_of_data_offset, directory_buf.len() as u64)?;

        file.flush()?;
        file.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        rename(&tmp_path, path)?;
        if let Some(parent) = path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }
}
