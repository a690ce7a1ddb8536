//! Web-platform feature detection for source trees.
//!
//! [`scanner::BatchScanner`] walks a tree, applies the active
//! [`rules::RuleSet`] to every matching file and produces a
//! [`model::Report`]. Reports are cached by a fingerprint of the scan inputs
//! ([`cache`]) and folded into a local history ([`trends`]).

pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod output;
pub mod platform;
pub mod rules;
pub mod scanner;
pub mod trends;

pub use cache::FingerprintCache;
pub use config::ScanConfig;
pub use error::{Result, ScanError};
pub use model::{FeatureResult, Report, ReportMetadata};
pub use rules::{Rule, RuleRegistry, RuleSet};
pub use scanner::BatchScanner;
pub use trends::{TrendMetadata, TrendStore};
