//! WAL replay and SSTable directory loading — the cold-start path.
use crate::EngineError;
use codec::DbOperation;
use log::{debug, warn};
use skiplist::SkipList;
use sstable::SSTableReader;
use std::path::Path;
use wal::WalReader;

/// Replays `wal_path` into `memtable`/`tombstones`, reconstructing the state
/// a restarted engine should see. If the file does not exist yet (fresh
/// database), this is a no-op.
///
/// A torn trailing record — a crash mid-append — is discarded by
/// [`wal::WalReader::replay`] itself; everything before it still replays.
pub fn replay_wal(
    wal_path: &Path,
    memtable: &mut SkipList,
    tombstones: &mut SkipList,
) -> Result<(), EngineError> {
    let mut reader = match WalReader::open(wal_path) {
        Ok(r) => r,
        Err(wal::WalError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no WAL at {} yet, starting with an empty memtable", wal_path.display());
            return Ok(());
        }
        Err(e) => {
            warn!("failed to open WAL at {}: {e}", wal_path.display());
            return Err(e.into());
        }
    };

    debug!("replaying WAL from {}", wal_path.display());
    let mut applied = 0u64;
    reader.replay(|op| {
        applied += 1;
        match op {
            DbOperation::Put { key, value } => {
                tombstones.delete(&key);
                let _ = memtable.insert(key, value);
            }
            DbOperation::Delete { key } => {
                memtable.delete(&key);
                let _ = tombstones.insert(key, Vec::new());
            }
        }
    })?;
    debug!(
        "WAL replay complete: {applied} operations applied ({} keys live, {} tombstoned)",
        memtable.len(),
        tombstones.len()
    );

    Ok(())
}

/// Loads every `.sst` file in `sst_dir`, newest first.
///
/// SSTable filenames are `sst-{flush_seq:020}-{timestamp_ms}.sst`; sorting
/// filenames descending is equivalent to sorting by recency, since
/// `flush_seq` is monotonic and zero-padded.
pub fn load_sstables(sst_dir: &Path) -> Result<Vec<SSTableReader>, EngineError> {
    let mut paths: Vec<_> = std::fs::read_dir(sst_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "sst").unwrap_or(false))
        .collect();
    paths.sort();
    paths.reverse();

    let mut readers = Vec::with_capacity(paths.len());
    for path in &paths {
        readers.push(SSTableReader::open(path)?);
    }
    Ok(readers)
}

/// Parses the `flush_seq` out of each `sst-{flush_seq:020}-*.sst` filename
/// and returns one past the highest value found, so a freshly opened engine
/// continues the sequence rather than reusing a name.
pub fn next_flush_seq(filenames: &[String]) -> u64 {
    filenames
        .iter()
        .filter_map(|name| name.strip_prefix("sst-"))
        .filter_map(|rest| rest.split('-').next())
        .filter_map(|seq_str| seq_str.parse::<u64>().ok())
        .max()
        .map(|max| max + 1)
        .unwrap_or(0)
}

/// Rough byte-size estimate of the memtable and tombstone set combined,
/// used to seed `Engine::approx_size` after WAL replay.
pub fn approx_size(memtable: &SkipList, tombstones: &SkipList) -> usize {
    let mem_bytes: usize = memtable.iter().map(|(k, v)| k.len() + v.len()).sum();
    let tomb_bytes: usize = tombstones.iter().map(|(k, v)| k.len() + v.len()).sum();
    mem_bytes + tomb_bytes
}

/// Removes leftover `.sst.tmp` files from an interrupted flush.
pub(crate) fn cleanup_tmp_files(sst_dir: &Path) {
    if let Ok(entries) = std::fs::read_dir(sst_dir) {
        for entry in entries.flatten() {
            let p = entry.path();
            if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(".sst.tmp") {
                    warn!("discarding leftover tmp file from an interrupted flush: {}", p.display());
                    let _ = std::fs::remove_file(&p);
                }
            }
        }
    }
}
