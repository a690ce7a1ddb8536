//! Fatal scan errors.
//!
//! Only the variants here abort a scan. Per-file and per-rule problems are
//! counted in the report metadata and logged instead.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Cannot write output to {}: {source}", path.display())]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScanError {
    /// Process exit code the CLI uses for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScanError::Cancelled => 130,
            _ => 1,
        }
    }
}
