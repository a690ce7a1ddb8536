use tabled::{settings::Style, Table, Tabled};

use crate::model::Report;
use crate::rules::Rule;
use crate::trends::{feature_status, FeatureStatus, TrendReport};

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Files")]
    count: usize,
    #[tabled(rename = "Example")]
    example: String,
}

#[derive(Tabled)]
struct DailyRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Scans")]
    scans: u64,
    #[tabled(rename = "Features")]
    features: u64,
    #[tabled(rename = "Risky")]
    risky: u64,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Adoption")]
    adoption: String,
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Rule")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Framework")]
    framework: String,
    #[tabled(rename = "File Types")]
    file_types: String,
}

pub fn print_report_table(report: &Report) {
    let meta = &report.metadata;
    println!();
    println!(
        "Scan completed at: {}",
        meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if report.detected.is_empty() {
        println!("No features detected.");
    } else {
        println!("Detected {} features:", report.detected.len());
        println!();

        let rows: Vec<FeatureRow> = report
            .detected
            .iter()
            .map(|f| FeatureRow {
                feature: f.feature.clone(),
                status: format_status(feature_status(&f.feature)),
                count: f.count,
                example: f
                    .files
                    .first()
                    .map(|s| truncate(s, 50))
                    .unwrap_or_else(|| "-".to_string()),
            })
            .collect();

        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    println!();
    println!(
        "Files: {} matched, {} processed, {} skipped (too large), {} unreadable ({} ms)",
        meta.scanned_files,
        meta.processed_files,
        meta.skipped_files,
        meta.error_count,
        meta.duration_ms
    );
}

pub fn print_trends_table(trends: &TrendReport) {
    let summary = &trends.summary;
    println!();
    if trends.daily_data.is_empty() {
        println!("No scans recorded in the last {} days.", summary.days);
        return;
    }

    println!(
        "{} scans over the last {} days:",
        summary.scans, summary.days
    );
    println!();

    let rows: Vec<DailyRow> = trends
        .daily_data
        .iter()
        .map(|d| DailyRow {
            date: d.date.clone(),
            scans: d.rollup.scans,
            features: d.rollup.total_features,
            risky: d.rollup.risky_features,
            risk: format_score(d.rollup.avg_risk_score),
            adoption: format_score(d.rollup.avg_adoption_score),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);

    println!();
    println!("Risk: {}", summary.risk_direction);
    println!("Adoption: {}", summary.adoption_direction);
    println!(
        "All time: {} scans, {} features",
        trends.overall.total_scans, trends.overall.total_features
    );
}

pub fn print_rules_table(rules: &[Rule]) {
    println!();
    println!("{} active rules:", rules.len());
    println!();

    let rows: Vec<RuleRow> = rules
        .iter()
        .map(|r| RuleRow {
            name: r.name.clone(),
            category: r.category.to_string(),
            framework: r.framework.clone().unwrap_or_else(|| "-".to_string()),
            file_types: if r.file_types.is_empty() {
                "*".to_string()
            } else {
                truncate(&r.file_types.join(", "), 40)
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

fn format_status(status: FeatureStatus) -> String {
    match status {
        FeatureStatus::Baseline => "\x1b[32mbaseline\x1b[0m".to_string(),
        FeatureStatus::Risky => "\x1b[33mrisky\x1b[0m".to_string(),
        FeatureStatus::Unknown => "unknown".to_string(),
    }
}

fn format_score(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
