use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;

/// Files in which one feature was detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureResult {
    pub feature: String,
    pub files: Vec<String>,
    pub count: usize,
}

impl FeatureResult {
    pub fn new(feature: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            feature: feature.into(),
            count: files.len(),
            files,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Files discovered by the include/ignore globs.
    pub scanned_files: usize,
    /// Files read and matched.
    pub processed_files: usize,
    /// Files that could not be read.
    pub error_count: usize,
    /// Files over the size ceiling.
    pub skipped_files: usize,
    pub generated_at: DateTime<Utc>,
    pub version: String,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub duration_ms: u64,
    pub config: ScanConfig,
}

/// The result of one scan invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub detected: Vec<FeatureResult>,
}

impl Report {
    /// Looks up the result for one feature.
    pub fn feature(&self, name: &str) -> Option<&FeatureResult> {
        self.detected.iter().find(|f| f.feature == name)
    }

    /// Feature names in report order.
    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.detected.iter().map(|f| f.feature.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report {
            metadata: ReportMetadata {
                scanned_files: 2,
                processed_files: 2,
                error_count: 0,
                skipped_files: 0,
                generated_at: Utc::now(),
                version: "0.1.0".to_string(),
                paths: vec![".".to_string()],
                duration_ms: 3,
                config: ScanConfig::default(),
            },
            detected: vec![FeatureResult::new("css-grid", vec!["a.css".to_string()])],
        }
    }

    #[test]
    fn test_report_json_shape() {
        let value = serde_json::to_value(sample()).unwrap();

        let metadata = &value["metadata"];
        assert_eq!(metadata["scannedFiles"], 2);
        assert_eq!(metadata["processedFiles"], 2);
        assert_eq!(metadata["errorCount"], 0);
        assert_eq!(metadata["skippedFiles"], 0);
        assert!(metadata["generatedAt"].is_string());
        assert_eq!(metadata["config"]["batch_size"], 10);

        let detected = &value["detected"][0];
        assert_eq!(detected["feature"], "css-grid");
        assert_eq!(detected["files"][0], "a.css");
        assert_eq!(detected["count"], 1);
    }

    #[test]
    fn test_feature_lookup() {
        let report = sample();
        assert_eq!(report.feature("css-grid").unwrap().count, 1);
        assert!(report.feature("fetch").is_none());
        assert_eq!(report.feature_names().collect::<Vec<_>>(), vec!["css-grid"]);
    }
}
