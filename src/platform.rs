//! Cross-platform default locations.
//!
//! The cache lives in the platform cache directory, trend history in the
//! local data directory and the config file in the config directory, each
//! under a `baseline-scan` subdirectory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "baseline-scan";

/// Returns the directory holding cached reports.
///
/// - Linux: `~/.cache/baseline-scan/reports/`
/// - macOS: `~/Library/Caches/baseline-scan/reports/`
/// - Windows: `%LOCALAPPDATA%\baseline-scan\reports\`
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR)
        .join("reports")
}

/// Returns the directory holding trend snapshots and rollups.
pub fn trends_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("trends")
}

/// Returns the default configuration file path.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

/// Writes `bytes` to a temporary sibling of `path` and renames it into
/// place, so readers never observe a partially written file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, bytes)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
