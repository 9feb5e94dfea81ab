//! # config — engine configuration
//!
//! A small struct of tunables for opening an [`engine::Engine`], with
//! environment-variable-backed defaults in the shape the project's old
//! interactive shell used to read directly off `std::env` (`RIPTIDE_*`).
//! Relocated here now that the shell itself is out of scope — the engine
//! library should not read the process environment on its own behalf, but a
//! caller wiring one up from a process environment still wants the same
//! defaulting convention.

use std::path::PathBuf;

/// Default directory for SSTable files, relative to the caller's CWD.
pub const DEFAULT_SST_DIR: &str = "data/sst";
/// Default WAL file path, relative to the caller's CWD.
pub const DEFAULT_WAL_PATH: &str = "wal.log";
/// Default sparse index threshold in bytes — one directory anchor roughly
/// every 1 KiB of SSTable payload (spec default).
pub const DEFAULT_SPARSE_INDEX_THRESHOLD: u64 = 1024;

/// Tunables for [`engine::Engine::open`].
///
/// `flush_threshold` is the one setting with no spec mandate either way: the
/// core storage spec this engine implements leaves auto-flush unspecified,
/// so it defaults to `None` (the caller must call `flush()` explicitly) and
/// opting in is additive, not a divergence from anything the spec requires.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the write-ahead log file.
    pub wal_path: PathBuf,
    /// Directory containing sealed `.sst` files.
    pub sst_dir: PathBuf,
    /// Memtable byte-size threshold that triggers an automatic flush.
    /// `None` disables auto-flush; the caller must call `flush()` itself.
    pub flush_threshold: Option<usize>,
    /// Byte spacing between sparse index anchors in new SSTables.
    pub sparse_index_threshold: u64,
    /// If `true`, every WAL append is followed by `fsync`.
    pub wal_sync: bool,
}

impl EngineConfig {
    /// Builds a config from the given directory, with every other field at
    /// its default.
    pub fn new<P: Into<PathBuf>>(sst_dir: P) -> Self {
        let sst_dir = sst_dir.into();
        let wal_path = sst_dir.join(DEFAULT_WAL_PATH);
        Self {
            wal_path,
            sst_dir,
            flush_threshold: None,
            sparse_index_threshold: DEFAULT_SPARSE_INDEX_THRESHOLD,
            wal_sync: true,
        }
    }

    /// Builds a config from `RIPTIDE_*` environment variables, falling back
    /// to defaults for any that are unset or unparsable.
    ///
    /// ```text
    /// RIPTIDE_WAL_PATH        WAL file path                (default: "wal.log")
    /// RIPTIDE_SST_DIR         SSTable directory             (default: "data/sst")
    /// RIPTIDE_FLUSH_KB        Flush threshold in KiB         (default: unset / disabled)
    /// RIPTIDE_SPARSE_INDEX_B  Sparse index threshold, bytes (default: 1024)
    /// RIPTIDE_WAL_SYNC        fsync every WAL append        (default: "true")
    /// ```
    pub fn from_env() -> Self {
        let wal_path = PathBuf::from(env_or("RIPTIDE_WAL_PATH", DEFAULT_WAL_PATH));
        let sst_dir = PathBuf::from(env_or("RIPTIDE_SST_DIR", DEFAULT_SST_DIR));
        let flush_threshold = std::env::var("RIPTIDE_FLUSH_KB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .map(|kb| kb * 1024);
        let sparse_index_threshold = std::env::var("RIPTIDE_SPARSE_INDEX_B")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_SPARSE_INDEX_THRESHOLD);
        let wal_sync = env_or("RIPTIDE_WAL_SYNC", "true") == "true";

        Self {
            wal_path,
            sst_dir,
            flush_threshold,
            sparse_index_threshold,
            wal_sync,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_wal_path_from_sst_dir() {
        let cfg = EngineConfig::new("/tmp/mydb");
        assert_eq!(cfg.sst_dir, PathBuf::from("/tmp/mydb"));
        assert_eq!(cfg.wal_path, PathBuf::from("/tmp/mydb/wal.log"));
        assert_eq!(cfg.flush_threshold, None);
        assert_eq!(cfg.sparse_index_threshold, DEFAULT_SPARSE_INDEX_THRESHOLD);
        assert!(cfg.wal_sync);
    }
}
