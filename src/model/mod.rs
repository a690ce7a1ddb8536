//! Core data types for scan reports.
//!
//! - [`Report`] - The result of one scan invocation
//! - [`ReportMetadata`] - Counters and provenance of a report
//! - [`FeatureResult`] - Files in which one feature was detected
//!
//! # Example
//!
//! ```
//! use baseline_scan::model::FeatureResult;
//!
//! let result = FeatureResult::new("css-grid", vec!["src/app.css".to_string()]);
//! assert_eq!(result.count, 1);
//! ```

mod report;

pub use report::*;
