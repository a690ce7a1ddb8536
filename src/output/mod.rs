mod cli;
mod json;

pub use cli::{print_report_table, print_rules_table, print_trends_table};
pub use json::print_json;

use std::path::Path;

use crate::error::{Result, ScanError};
use crate::model::Report;
use crate::platform::write_atomic;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for programmatic use
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use 'table' or 'json'", s)),
        }
    }
}

/// Writes `report` as pretty JSON to `path`.
///
/// The file is replaced atomically; on failure no partial file is left.
pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    let json = serde_json::to_vec_pretty(report)?;
    write_atomic(path, &json).map_err(|source| ScanError::OutputNotWritable {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::model::{FeatureResult, ReportMetadata};
    use chrono::Utc;
    use std::str::FromStr;
    use tempfile::TempDir;

    fn report() -> Report {
        Report {
            metadata: ReportMetadata {
                scanned_files: 1,
                processed_files: 1,
                error_count: 0,
                skipped_files: 0,
                generated_at: Utc::now(),
                version: "0.1.0".to_string(),
                paths: vec![".".to_string()],
                duration_ms: 1,
                config: ScanConfig::default(),
            },
            detected: vec![FeatureResult::new("css-grid", vec!["a.css".to_string()])],
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("table").unwrap(), OutputFormat::Table);
        assert!(OutputFormat::from_str("sarif").is_err());
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let report = report();
        write_report(&path, &report).unwrap();

        let read: Report = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, report);
    }

    #[test]
    fn test_unwritable_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let err = write_report(&path, &report()).unwrap_err();

        assert!(matches!(err, ScanError::OutputNotWritable { .. }));
        assert!(!path.exists());
    }
}
