//! Configuration file handling.
//!
//! A scan is driven by a [`ScanConfig`], loaded from TOML (or JSON when the
//! file ends in `.json`). Every field has a default, so an empty file and a
//! missing file both give the default configuration.
//!
//! # Configuration Location
//!
//! Without `--config`, the file is looked up at:
//! - Linux: `~/.config/baseline-scan/config.toml`
//! - macOS: `~/Library/Application Support/baseline-scan/config.toml`
//! - Windows: `%APPDATA%\baseline-scan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! patterns = ["**/*.{css,scss,js,ts}"]
//! ignore = ["**/node_modules/**"]
//! batch_size = 10
//! max_file_size = 1048576
//! cache = true
//!
//! [rules]
//! preset = "recommended"
//! frameworks = ["react"]
//!
//! [[rules.custom_rules]]
//! name = "css-view-transition-name"
//! pattern = "view-transition-name\\s*:"
//! category = "css"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::platform::config_path;
use crate::rules::RuleOptions;

/// Default number of files processed concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Files above this size are skipped.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Scan configuration.
///
/// Field order is stable and there are no hash maps, so the serialized form
/// is deterministic and can be hashed into a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns for files to scan, relative to each root.
    pub patterns: Vec<String>,

    /// Glob patterns to exclude.
    pub ignore: Vec<String>,

    /// How many files are read and matched concurrently.
    ///
    /// Default: 10
    pub batch_size: usize,

    /// Files larger than this many bytes are skipped.
    ///
    /// Default: 1 MiB
    pub max_file_size: u64,

    /// Whether to reuse reports for identical inputs.
    ///
    /// Default: true
    pub cache: bool,

    /// How long a cached report stays valid, in hours.
    ///
    /// Default: 24 hours
    pub cache_ttl_hours: u64,

    /// Whether each scan is recorded in the trend store.
    ///
    /// Default: true
    pub trends: bool,

    /// Rule selection.
    pub rules: RuleOptions,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                "**/*.{js,jsx,ts,tsx,mjs,cjs,css,scss,sass,less,html,htm,vue,svelte}".to_string(),
            ],
            ignore: vec![
                "**/node_modules/**".to_string(),
                "**/.git/**".to_string(),
                "**/dist/**".to_string(),
                "**/build/**".to_string(),
                "**/coverage/**".to_string(),
                "**/*.min.js".to_string(),
                "**/*.min.css".to_string(),
            ],
            batch_size: DEFAULT_BATCH_SIZE,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            cache: true,
            cache_ttl_hours: 24,
            trends: true,
            rules: RuleOptions::default(),
        }
    }
}

impl ScanConfig {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// A missing or malformed file is not an error: a warning is logged and
    /// the default configuration is returned.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

        if !path.exists() {
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                Self::default()
            }
        }
    }

    /// Parses a config file, choosing the format by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config: ScanConfig = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content)?
        };
        Ok(config.normalized())
    }

    /// Clamps values that would stall the scanner.
    pub fn normalized(mut self) -> Self {
        if self.batch_size == 0 {
            warn!("batch_size must be at least 1, using {}", DEFAULT_BATCH_SIZE);
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        self
    }

    /// Saves the configuration as TOML, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        config_path()
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        toml::to_string_pretty(&ScanConfig::default()).unwrap_or_default()
    }
}
