use std::fs;
use std::path::Path;

/// Initializes `env_logger` once per test binary so `RUST_LOG=debug` shows
/// the engine's flush/recovery narration; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

pub fn count_sst_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext == "sst")
                .unwrap_or(false)
        })
        .count()
}
