//! The batch scanner.
//!
//! A scan resolves its root paths, consults the fingerprint cache, and on a
//! miss discovers files and processes them in fixed-size batches. Files
//! within a batch are read and matched concurrently; the next batch starts
//! only once every file of the current one has settled, so at most
//! `batch_size` files are in memory at once.
//!
//! # Example
//!
//! ```no_run
//! use baseline_scan::config::ScanConfig;
//! use baseline_scan::scanner::BatchScanner;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let scanner = BatchScanner::new();
//!     let report = scanner.scan(&[PathBuf::from("./src")], &ScanConfig::default()).await?;
//!     for feature in &report.detected {
//!         println!("{}: {} files", feature.feature, feature.count);
//!     }
//!     Ok(())
//! }
//! ```

mod aggregate;
mod cancel;
mod discover;
mod fs;

pub use aggregate::FeatureAggregator;
pub use cancel::CancellationToken;
pub use discover::discover_files;
pub use fs::{FileSystem, TokioFs};

use chrono::Utc;
use futures::future::join_all;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{fingerprint_inputs, FingerprintCache};
use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::model::{FeatureResult, Report, ReportMetadata};
use crate::output::write_report;
use crate::rules::{RuleRegistry, RuleSet};
use crate::trends::{TrendMetadata, TrendStore};

/// Scans with more files than this log coarse percentage progress.
const PROGRESS_LOG_THRESHOLD: usize = 100;

/// What happened to one file.
#[derive(Debug)]
enum FileOutcome {
    /// Read and matched; carries the names of detected features.
    Processed(Vec<String>),
    /// Over the size ceiling, never read.
    Skipped,
    /// Could not be stat'ed or read.
    Failed,
}

/// Result of running a rule set over a list of files.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub detected: Vec<FeatureResult>,
    pub processed_files: usize,
    pub skipped_files: usize,
    pub error_count: usize,
}

/// A finished scan that has not been persisted yet.
struct ScanRun {
    report: Report,
    cache: Option<FingerprintCache>,
    cache_key: Option<String>,
    cached: bool,
}

/// Applies a rule set to a file tree under a concurrency cap.
pub struct BatchScanner<F = TokioFs> {
    fs: Arc<F>,
    cache: Option<FingerprintCache>,
    trends: Option<TrendStore>,
    trend_metadata: TrendMetadata,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
}

impl BatchScanner<TokioFs> {
    /// Creates a scanner over the real filesystem with no cache and no
    /// trend store.
    pub fn new() -> Self {
        Self::with_fs(TokioFs)
    }
}

impl Default for BatchScanner<TokioFs> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FileSystem> BatchScanner<F> {
    pub fn with_fs(fs: F) -> Self {
        Self {
            fs: Arc::new(fs),
            cache: None,
            trends: None,
            trend_metadata: TrendMetadata::default(),
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Enables report caching for scans whose config has `cache = true`.
    pub fn with_cache(mut self, cache: FingerprintCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Records every fresh report in `store` for scans whose config has
    /// `trends = true`.
    pub fn with_trends(mut self, store: TrendStore, metadata: TrendMetadata) -> Self {
        self.trends = Some(store);
        self.trend_metadata = metadata;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Advances `bar` once per file.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Scans `paths` and returns the report.
    ///
    /// Fails only if a root path does not exist or the scan is cancelled.
    /// Unreadable and oversized files are counted in the report metadata.
    pub async fn scan(&self, paths: &[PathBuf], config: &ScanConfig) -> Result<Report> {
        let run = self.execute(paths, config).await?;
        Ok(self.finish(run, config))
    }

    /// Scans `paths` and writes the report to `out`.
    ///
    /// The report reaches the cache and the trend store only once `out` has
    /// been written, so a failed write leaves no trace of the scan.
    pub async fn scan_to(
        &self,
        paths: &[PathBuf],
        config: &ScanConfig,
        out: &Path,
    ) -> Result<Report> {
        let run = self.execute(paths, config).await?;
        write_report(out, &run.report)?;
        Ok(self.finish(run, config))
    }

    async fn execute(&self, paths: &[PathBuf], config: &ScanConfig) -> Result<ScanRun> {
        let started = Instant::now();
        resolve_roots(paths)?;

        let cache = self.active_cache(config);
        let cache_key = match &cache {
            Some(_) => match fingerprint_inputs(paths, config) {
                Ok(key) => Some(key),
                Err(e) => {
                    warn!(error = %e, "could not fingerprint scan inputs, caching disabled");
                    None
                }
            },
            None => None,
        };

        if let (Some(cache), Some(key)) = (&cache, &cache_key) {
            if let Some(report) = cache.get::<Report>(key) {
                info!(key = %key, "using cached report");
                return Ok(ScanRun {
                    report,
                    cache: None,
                    cache_key: None,
                    cached: true,
                });
            }
        }

        let rules = RuleRegistry::from_options(&config.rules).build();
        info!(rules = rules.len(), "rule set ready");

        let files = discover_files(paths, &config.patterns, &config.ignore);
        if files.is_empty() {
            warn!("no files matched the configured patterns");
        } else {
            info!(files = files.len(), "discovered files");
        }

        if let Some(bar) = &self.progress {
            bar.set_length(files.len() as u64);
        }

        let outcome = self.scan_files(&files, &rules, config).await?;

        let report = Report {
            metadata: ReportMetadata {
                scanned_files: files.len(),
                processed_files: outcome.processed_files,
                error_count: outcome.error_count,
                skipped_files: outcome.skipped_files,
                generated_at: Utc::now(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                paths: paths.iter().map(|p| p.display().to_string()).collect(),
                duration_ms: started.elapsed().as_millis() as u64,
                config: config.clone(),
            },
            detected: outcome.detected,
        };

        info!(
            processed = report.metadata.processed_files,
            skipped = report.metadata.skipped_files,
            errors = report.metadata.error_count,
            features = report.detected.len(),
            "scan complete"
        );

        Ok(ScanRun {
            report,
            cache,
            cache_key,
            cached: false,
        })
    }

    /// Persists a fresh report and hands it back. Cached reports were
    /// recorded when first produced.
    fn finish(&self, run: ScanRun, config: &ScanConfig) -> Report {
        if !run.cached {
            self.persist(&run.report, run.cache.as_ref(), run.cache_key.as_deref(), config);
        }
        run.report
    }

    /// Runs `rules` over `files` in batches of `config.batch_size`.
    pub async fn scan_files(
        &self,
        files: &[PathBuf],
        rules: &RuleSet,
        config: &ScanConfig,
    ) -> Result<ScanOutcome> {
        let total = files.len();
        let batch_size = config.batch_size.max(1);
        let log_progress = total > PROGRESS_LOG_THRESHOLD;

        let mut aggregator = FeatureAggregator::default();
        let mut outcome = ScanOutcome::default();
        let mut done = 0;
        let mut last_decile = 0;

        for batch in files.chunks(batch_size) {
            if self.cancel.is_cancelled() {
                info!(done, total, "scan cancelled");
                return Err(ScanError::Cancelled);
            }

            let results = join_all(
                batch
                    .iter()
                    .map(|path| self.process_file(path, rules, config.max_file_size)),
            )
            .await;

            // Fold in input order so the report is stable across runs.
            for (path, result) in batch.iter().zip(results) {
                match result {
                    FileOutcome::Processed(features) => {
                        outcome.processed_files += 1;
                        let file = path.display().to_string();
                        for feature in &features {
                            aggregator.record(feature, &file);
                        }
                    }
                    FileOutcome::Skipped => outcome.skipped_files += 1,
                    FileOutcome::Failed => outcome.error_count += 1,
                }
                if let Some(bar) = &self.progress {
                    bar.inc(1);
                }
            }

            done += batch.len();
            if log_progress {
                let decile = done * 10 / total;
                if decile > last_decile {
                    last_decile = decile;
                    info!(done, total, "scan {}% complete", done * 100 / total);
                }
            }
        }

        outcome.detected = aggregator.into_results();
        Ok(outcome)
    }

    async fn process_file(&self, path: &Path, rules: &RuleSet, max_size: u64) -> FileOutcome {
        let size = match self.fs.file_size(path).await {
            Ok(size) => size,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot stat file");
                return FileOutcome::Failed;
            }
        };

        if size > max_size {
            debug!(path = %path.display(), size, max_size, "skipping oversized file");
            return FileOutcome::Skipped;
        }

        let content = match self.fs.read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file");
                return FileOutcome::Failed;
            }
        };

        let file_type = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let features: Vec<String> = rules
            .match_content(&content, file_type)
            .into_iter()
            .map(|hits| hits.feature)
            .collect();

        debug!(path = %path.display(), features = features.len(), "processed file");
        FileOutcome::Processed(features)
    }

    fn active_cache(&self, config: &ScanConfig) -> Option<FingerprintCache> {
        if !config.cache {
            return None;
        }
        self.cache
            .as_ref()
            .map(|c| c.clone().with_ttl_hours(config.cache_ttl_hours))
    }

    /// Writes the report to the cache and the trend store. Failures here
    /// never fail the scan.
    fn persist(
        &self,
        report: &Report,
        cache: Option<&FingerprintCache>,
        key: Option<&str>,
        config: &ScanConfig,
    ) {
        if let (Some(cache), Some(key)) = (cache, key) {
            if let Err(e) = cache.set(key, report) {
                warn!(error = %e, "failed to write report cache");
            }
        }

        if config.trends {
            if let Some(store) = &self.trends {
                match store.record(report, &self.trend_metadata) {
                    Ok(scan_id) => debug!(scan_id = %scan_id, "recorded trend snapshot"),
                    Err(e) => warn!(error = %e, "failed to record trend snapshot"),
                }
            }
        }
    }
}

/// Every root must exist before anything else happens.
fn resolve_roots(paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        if !path.exists() {
            return Err(ScanError::RootNotFound(path.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Category, Match, MatchError, Matcher, Rule, RuleOptions};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory filesystem that tracks how many reads overlap.
    #[derive(Default)]
    struct FakeFs {
        files: HashMap<PathBuf, std::result::Result<String, io::ErrorKind>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        reads: Mutex<Vec<PathBuf>>,
    }

    impl FakeFs {
        fn with_file(mut self, path: &str, content: &str) -> Self {
            self.files.insert(PathBuf::from(path), Ok(content.to_string()));
            self
        }

        fn with_broken_file(mut self, path: &str) -> Self {
            self.files
                .insert(PathBuf::from(path), Err(io::ErrorKind::PermissionDenied));
            self
        }
    }

    #[async_trait]
    impl FileSystem for FakeFs {
        async fn file_size(&self, path: &Path) -> io::Result<u64> {
            match self.files.get(path) {
                Some(Ok(content)) => Ok(content.len() as u64),
                Some(Err(_)) => Ok(1),
                None => Err(io::ErrorKind::NotFound.into()),
            }
        }

        async fn read_to_string(&self, path: &Path) -> io::Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.reads.lock().unwrap().push(path.to_path_buf());

            for _ in 0..3 {
                tokio::task::yield_now().await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match self.files.get(path) {
                Some(Ok(content)) => Ok(content.clone()),
                Some(Err(kind)) => Err((*kind).into()),
                None => Err(io::ErrorKind::NotFound.into()),
            }
        }
    }

    #[derive(Debug)]
    struct FailsOn(&'static str);

    impl Matcher for FailsOn {
        fn pattern(&self) -> &str {
            "<fails-on>"
        }

        fn matches_empty(&self) -> bool {
            false
        }

        fn find_all(&self, content: &str) -> std::result::Result<Vec<Match>, MatchError> {
            if content.contains(self.0) {
                Err(MatchError::Failed("poisoned input".to_string()))
            } else {
                Ok(vec![Match {
                    text: String::new(),
                    offset: 0,
                    line: 1,
                    context_snippet: String::new(),
                }])
            }
        }
    }

    fn default_rules() -> RuleSet {
        RuleRegistry::from_options(&RuleOptions::default()).build()
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[tokio::test]
    async fn test_batches_bound_concurrency() {
        let mut fs = FakeFs::default();
        let mut names = Vec::new();
        for i in 0..23 {
            let name = format!("f{}.css", i);
            fs = fs.with_file(&name, "a { display: grid; }");
            names.push(name);
        }
        let files: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();

        let scanner = BatchScanner::with_fs(fs);
        let config = ScanConfig {
            batch_size: 4,
            ..ScanConfig::default()
        };
        let outcome = scanner.scan_files(&files, &default_rules(), &config).await.unwrap();

        assert_eq!(outcome.processed_files, 23);
        assert_eq!(scanner.fs.peak.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.detected[0].count, 23);
    }

    #[tokio::test]
    async fn test_results_follow_discovery_order() {
        let fs = FakeFs::default()
            .with_file("b.js", "fetch('/b')")
            .with_file("a.css", "a { display: grid; }")
            .with_file("c.js", "await fetch(url); const io = new IntersectionObserver(cb);");
        let scanner = BatchScanner::with_fs(fs);
        let config = ScanConfig {
            batch_size: 2,
            ..ScanConfig::default()
        };

        let outcome = scanner
            .scan_files(&paths(&["b.js", "a.css", "c.js"]), &default_rules(), &config)
            .await
            .unwrap();

        let summary: Vec<(&str, Vec<&str>)> = outcome
            .detected
            .iter()
            .map(|f| (f.feature.as_str(), f.files.iter().map(String::as_str).collect()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("fetch", vec!["b.js", "c.js"]),
                ("css-grid", vec!["a.css"]),
                ("intersection-observer", vec!["c.js"]),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_files_are_skipped_unread() {
        let big = "a { display: grid; }".repeat(10);
        let fs = FakeFs::default()
            .with_file("big.css", &big)
            .with_file("small.css", "a { display: grid; }");
        let scanner = BatchScanner::with_fs(fs);
        let config = ScanConfig {
            max_file_size: 50,
            ..ScanConfig::default()
        };

        let outcome = scanner
            .scan_files(&paths(&["big.css", "small.css"]), &default_rules(), &config)
            .await
            .unwrap();

        assert_eq!(outcome.skipped_files, 1);
        assert_eq!(outcome.processed_files, 1);
        assert_eq!(outcome.error_count, 0);
        assert_eq!(*scanner.fs.reads.lock().unwrap(), paths(&["small.css"]));
    }

    #[tokio::test]
    async fn test_read_errors_are_counted() {
        let fs = FakeFs::default()
            .with_broken_file("locked.js")
            .with_file("ok.js", "fetch(x)");
        let scanner = BatchScanner::with_fs(fs);

        let outcome = scanner
            .scan_files(
                &paths(&["locked.js", "missing.js", "ok.js"]),
                &default_rules(),
                &ScanConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.error_count, 2);
        assert_eq!(outcome.processed_files, 1);
        assert_eq!(outcome.detected[0].files, vec!["ok.js"]);
    }

    #[tokio::test]
    async fn test_failing_rule_does_not_affect_other_files() {
        let mut registry = RuleRegistry::from_options(&RuleOptions::default());
        registry.add(Rule::new("fragile", Arc::new(FailsOn("POISON")), Category::Api));
        let rules = registry.build();

        let fs = FakeFs::default()
            .with_file("bad.js", "POISON; fetch(a)")
            .with_file("good.js", "fetch(b)");
        let scanner = BatchScanner::with_fs(fs);

        let outcome = scanner
            .scan_files(&paths(&["bad.js", "good.js"]), &rules, &ScanConfig::default())
            .await
            .unwrap();

        assert_eq!(outcome.error_count, 0);
        assert_eq!(outcome.processed_files, 2);
        let fetch = outcome.detected.iter().find(|f| f.feature == "fetch").unwrap();
        assert_eq!(fetch.files, vec!["bad.js", "good.js"]);
        let fragile = outcome.detected.iter().find(|f| f.feature == "fragile").unwrap();
        assert_eq!(fragile.files, vec!["good.js"]);
    }

    #[tokio::test]
    async fn test_cancelled_scan_stops_before_next_batch() {
        let fs = FakeFs::default().with_file("a.css", "x");
        let token = CancellationToken::new();
        token.cancel();
        let scanner = BatchScanner::with_fs(fs).with_cancellation(token);

        let err = scanner
            .scan_files(&paths(&["a.css"]), &default_rules(), &ScanConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::Cancelled));
        assert!(scanner.fs.reads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_is_fatal() {
        let scanner = BatchScanner::new();
        let err = scanner
            .scan(&[PathBuf::from("/definitely/not/here")], &ScanConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound(_)));
    }
}
