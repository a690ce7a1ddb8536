//! Scan history: per-scan snapshots, daily rollups and a trailing window.
//!
//! # Storage Layout
//!
//! ```text
//! <dir>/scan-<id>.json   one TrendSnapshot per scan
//! <dir>/aggregated.json  {daily: {<date>: DailyRollup}, overall: OverallTrend}
//! ```

mod snapshot;

pub use snapshot::{
    feature_category, feature_status, FeatureStats, FeatureStatus, FeatureTrends,
    SnapshotMetadata, StatusCounts, TrendMetadata, TrendSnapshot,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::model::Report;
use crate::platform::{trends_dir, write_atomic};

/// Days kept in the overall risk and adoption series.
const RETENTION_DAYS: i64 = 30;

const AGGREGATE_FILE: &str = "aggregated.json";

/// Running aggregates for one calendar day (UTC).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRollup {
    pub scans: u64,
    pub total_features: u64,
    pub baseline_features: u64,
    pub risky_features: u64,
    pub unknown_features: u64,
    pub avg_risk_score: f64,
    pub avg_adoption_score: f64,
}

impl DailyRollup {
    fn fold(&mut self, snapshot: &TrendSnapshot) {
        let stats = &snapshot.features;
        self.scans += 1;
        self.total_features += stats.total as u64;
        self.baseline_features += stats.by_status.baseline as u64;
        self.risky_features += stats.by_status.risky as u64;
        self.unknown_features += stats.by_status.unknown as u64;

        let n = self.scans as f64;
        self.avg_risk_score = (self.avg_risk_score * (n - 1.0) + stats.risk_score) / n;
        self.avg_adoption_score = (self.avg_adoption_score * (n - 1.0) + stats.adoption_score) / n;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallTrend {
    pub total_scans: u64,
    pub total_features: u64,
    pub risk_trend: Vec<TrendPoint>,
    pub adoption_trend: Vec<TrendPoint>,
}

impl OverallTrend {
    fn fold(&mut self, snapshot: &TrendSnapshot) {
        self.total_scans += 1;
        self.total_features += snapshot.features.total as u64;
        self.risk_trend.push(TrendPoint {
            date: snapshot.timestamp,
            score: snapshot.features.risk_score,
        });
        self.adoption_trend.push(TrendPoint {
            date: snapshot.timestamp,
            score: snapshot.features.adoption_score,
        });

        let cutoff = snapshot.timestamp - Duration::days(RETENTION_DAYS);
        self.risk_trend.retain(|p| p.date >= cutoff);
        self.adoption_trend.retain(|p| p.date >= cutoff);
    }
}

/// Contents of `aggregated.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Keyed by `YYYY-MM-DD`, which sorts chronologically.
    pub daily: BTreeMap<String, DailyRollup>,
    pub overall: OverallTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increasing,
    Decreasing,
    Stable,
}

impl Direction {
    fn between(first: f64, latest: f64) -> Self {
        let delta = latest - first;
        if delta.abs() < f64::EPSILON {
            Direction::Stable
        } else if delta > 0.0 {
            Direction::Increasing
        } else {
            Direction::Decreasing
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::Increasing => "increasing",
            Direction::Decreasing => "decreasing",
            Direction::Stable => "stable",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPoint {
    pub date: String,
    #[serde(flatten)]
    pub rollup: DailyRollup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub days: u32,
    pub scans: u64,
    pub risk_direction: Direction,
    pub adoption_direction: Direction,
    pub latest_risk_score: Option<f64>,
    pub latest_adoption_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub daily_data: Vec<DailyPoint>,
    pub overall: OverallTrend,
    pub summary: TrendSummary,
}

/// File-backed trend history.
#[derive(Debug, Clone)]
pub struct TrendStore {
    dir: PathBuf,
}

impl TrendStore {
    /// Creates a store in the platform data directory.
    pub fn new() -> Self {
        Self::with_dir(trends_dir())
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, scan_id: &str) -> PathBuf {
        self.dir.join(format!("scan-{}.json", scan_id))
    }

    /// Persists a snapshot of `report` and folds it into the rollups.
    /// Returns the snapshot's scan id.
    pub fn record(&self, report: &Report, metadata: &TrendMetadata) -> Result<String> {
        let snapshot = TrendSnapshot::from_report(report, metadata)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create trend directory: {:?}", self.dir))?;

        write_atomic(
            &self.snapshot_path(&snapshot.scan_id),
            &serde_json::to_vec_pretty(&snapshot)?,
        )?;

        let mut aggregate = self.load_aggregate();
        let day = snapshot.timestamp.date_naive().format("%Y-%m-%d").to_string();
        aggregate.daily.entry(day).or_default().fold(&snapshot);
        aggregate.overall.fold(&snapshot);

        write_atomic(
            &self.dir.join(AGGREGATE_FILE),
            &serde_json::to_vec_pretty(&aggregate)?,
        )?;

        debug!(scan_id = %snapshot.scan_id, "trend snapshot stored");
        Ok(snapshot.scan_id)
    }

    /// Loads one stored snapshot.
    pub fn snapshot(&self, scan_id: &str) -> Result<TrendSnapshot> {
        let path = self.snapshot_path(scan_id);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("No snapshot for scan {}", scan_id))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Reads the persisted rollups. A missing file is an empty aggregate; a
    /// corrupt one is logged and replaced by an empty aggregate.
    pub fn load_aggregate(&self) -> Aggregate {
        let path = self.dir.join(AGGREGATE_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Aggregate::default(),
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "corrupt trend aggregate, starting fresh");
            Aggregate::default()
        })
    }

    /// Trends over the last `days` days.
    pub fn get_trends(&self, days: u32) -> TrendReport {
        self.get_trends_at(days, Utc::now())
    }

    /// Trends over the `days` days before `now`. Has no side effects.
    pub fn get_trends_at(&self, days: u32, now: DateTime<Utc>) -> TrendReport {
        let aggregate = self.load_aggregate();
        let cutoff = (now - Duration::days(i64::from(days)))
            .date_naive()
            .format("%Y-%m-%d")
            .to_string();

        let daily_data: Vec<DailyPoint> = aggregate
            .daily
            .range(cutoff..)
            .map(|(date, rollup)| DailyPoint {
                date: date.clone(),
                rollup: rollup.clone(),
            })
            .collect();

        let summary = summarize(days, &daily_data);
        TrendReport {
            daily_data,
            overall: aggregate.overall,
            summary,
        }
    }
}

impl Default for TrendStore {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(days: u32, daily: &[DailyPoint]) -> TrendSummary {
    let (risk_direction, adoption_direction) = match (daily.first(), daily.last()) {
        (Some(first), Some(latest)) => (
            Direction::between(first.rollup.avg_risk_score, latest.rollup.avg_risk_score),
            Direction::between(
                first.rollup.avg_adoption_score,
                latest.rollup.avg_adoption_score,
            ),
        ),
        _ => (Direction::Stable, Direction::Stable),
    };

    TrendSummary {
        days,
        scans: daily.iter().map(|d| d.rollup.scans).sum(),
        risk_direction,
        adoption_direction,
        latest_risk_score: daily.last().map(|d| d.rollup.avg_risk_score),
        latest_adoption_score: daily.last().map(|d| d.rollup.avg_adoption_score),
    }
}
