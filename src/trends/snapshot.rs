//! Per-scan trend snapshots and the feature classification behind them.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cache::fingerprint_content;
use crate::model::Report;

/// Features considered broadly interoperable.
const MODERN_FEATURES: &[&str] = &[
    "fetch",
    "intersection-observer",
    "resize-observer",
    "mutation-observer",
    "web-animations",
    "clipboard-api",
    "service-worker",
    "abort-controller",
    "structured-clone",
    "broadcast-channel",
    "web-components",
    "shadow-dom",
    "web-workers",
    "websockets",
    "compression-streams",
    "css-grid",
    "css-subgrid",
    "css-flexbox",
    "css-container-queries",
    "css-has",
    "css-custom-properties",
    "css-cascade-layers",
    "css-aspect-ratio",
    "css-clamp",
    "css-backdrop-filter",
    "css-scroll-snap",
    "css-logical-properties",
    "css-color-mix",
    "html-dialog",
    "html-popover",
    "html-details",
    "html-lazy-loading",
    "html-picture",
    "html-template",
    "html-inert",
    "html-date-input",
    "js-optional-chaining",
    "js-nullish-coalescing",
    "js-logical-assignment",
    "js-private-fields",
    "js-class-static-block",
    "js-bigint",
    "js-array-at",
    "js-dynamic-import",
    "js-promise-allsettled",
    "js-promise-any",
    "js-object-hasown",
    "js-string-replaceall",
    "js-array-findlast",
];

/// Features that still work everywhere but have modern replacements.
const LEGACY_FEATURES: &[&str] = &[
    "xml-http-request",
    "document-write",
    "attach-event",
    "application-cache",
    "css-flexbox-legacy",
];

/// Features with incomplete cross-browser support, and the browsers that
/// lag behind.
const EXPERIMENTAL_FEATURES: &[(&str, &[&str])] = &[
    ("view-transitions", &["firefox"]),
    ("navigation-api", &["firefox", "safari"]),
    ("file-system-access", &["firefox", "safari"]),
    ("web-gpu", &["firefox", "safari"]),
    ("web-share", &["firefox"]),
    ("web-locks", &[]),
    ("payment-request", &["firefox"]),
    ("css-anchor-positioning", &["firefox", "safari"]),
    ("css-text-wrap-balance", &["safari"]),
];

const FRAMEWORK_PREFIXES: &[&str] = &["react-", "vue-", "angular-", "svelte-"];

/// Support status used for rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStatus {
    Baseline,
    Risky,
    Unknown,
}

pub fn feature_status(feature: &str) -> FeatureStatus {
    if MODERN_FEATURES.contains(&feature) || LEGACY_FEATURES.contains(&feature) {
        FeatureStatus::Baseline
    } else if EXPERIMENTAL_FEATURES.iter().any(|(name, _)| *name == feature) {
        FeatureStatus::Risky
    } else {
        FeatureStatus::Unknown
    }
}

/// Coarse category from the feature name prefix.
pub fn feature_category(feature: &str) -> &'static str {
    if feature.starts_with("css-") {
        "css"
    } else if feature.starts_with("html-") {
        "html"
    } else if feature.starts_with("js-") {
        "javascript"
    } else if FRAMEWORK_PREFIXES.iter().any(|p| feature.starts_with(p)) {
        "framework"
    } else {
        "api"
    }
}

/// Caller-supplied context stored with each snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    #[serde(flatten)]
    pub context: TrendMetadata,
    pub scanned_files: usize,
    pub processed_files: usize,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub baseline: usize,
    pub risky: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStats {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_category: BTreeMap<String, usize>,
    /// Risky features per lagging browser.
    pub by_browser: BTreeMap<String, usize>,
    /// Share of risky features, in `[0, 1]`.
    pub risk_score: f64,
    /// Share of baseline features, in `[0, 1]`.
    pub adoption_score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureTrends {
    pub modern_features: usize,
    pub legacy_features: usize,
    pub experimental_features: usize,
}

/// Statistics of one scan, persisted as `scan-<id>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSnapshot {
    pub scan_id: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: SnapshotMetadata,
    pub features: FeatureStats,
    pub trends: FeatureTrends,
}

impl TrendSnapshot {
    pub fn from_report(report: &Report, context: &TrendMetadata) -> Result<Self> {
        let timestamp = report.metadata.generated_at;
        let scan_id = fingerprint_content(
            &serde_json::to_vec(report)?,
            &(timestamp, context),
        )?[..16]
            .to_string();

        let mut by_status = StatusCounts::default();
        let mut by_category = BTreeMap::new();
        let mut by_browser = BTreeMap::new();
        let mut trends = FeatureTrends::default();

        for result in &report.detected {
            let name = result.feature.as_str();

            match feature_status(name) {
                FeatureStatus::Baseline => by_status.baseline += 1,
                FeatureStatus::Risky => by_status.risky += 1,
                FeatureStatus::Unknown => by_status.unknown += 1,
            }
            *by_category.entry(feature_category(name).to_string()).or_insert(0) += 1;

            if MODERN_FEATURES.contains(&name) {
                trends.modern_features += 1;
            } else if LEGACY_FEATURES.contains(&name) {
                trends.legacy_features += 1;
            } else if let Some((_, browsers)) =
                EXPERIMENTAL_FEATURES.iter().find(|(n, _)| *n == name)
            {
                trends.experimental_features += 1;
                for browser in *browsers {
                    *by_browser.entry(browser.to_string()).or_insert(0) += 1;
                }
            }
        }

        let total = report.detected.len();
        let share = |n: usize| if total == 0 { 0.0 } else { n as f64 / total as f64 };

        Ok(Self {
            scan_id,
            timestamp,
            metadata: SnapshotMetadata {
                context: context.clone(),
                scanned_files: report.metadata.scanned_files,
                processed_files: report.metadata.processed_files,
                paths: report.metadata.paths.clone(),
            },
            features: FeatureStats {
                total,
                by_status,
                by_category,
                by_browser,
                risk_score: share(by_status.risky),
                adoption_score: share(by_status.baseline),
            },
            trends,
        })
    }
}
