use anyhow::Result;
use baseline_scan::{
    cache::FingerprintCache,
    config::ScanConfig,
    error::ScanError,
    logging::init_logging,
    output::{
        print_json, print_report_table, print_rules_table, print_trends_table, OutputFormat,
    },
    rules::{Preset, RuleRegistry},
    scanner::{BatchScanner, CancellationToken},
    trends::{TrendMetadata, TrendStore},
};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "baseline-scan")]
#[command(
    author,
    version,
    about = "Detect web platform features used in a source tree"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan source files for web platform features
    Scan {
        /// Comma-separated root paths to scan
        #[arg(short, long, value_delimiter = ',', default_value = ".")]
        paths: Vec<PathBuf>,

        /// Where to write the JSON report
        #[arg(short, long, default_value = "baseline-report.json")]
        out: PathBuf,

        /// Config file (TOML, or JSON with a .json extension)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Ignore and do not update the report cache
        #[arg(long)]
        no_cache: bool,

        /// Do not record this scan in the trend history
        #[arg(long)]
        no_trends: bool,

        /// Files processed concurrently
        #[arg(long)]
        batch_size: Option<usize>,

        /// Skip files larger than this many bytes
        #[arg(long)]
        max_file_size: Option<u64>,

        /// Rule preset (minimal, recommended, modern, all)
        #[arg(long)]
        preset: Option<String>,

        /// Project name attached to the trend snapshot
        #[arg(long)]
        project: Option<String>,

        /// Branch attached to the trend snapshot
        #[arg(long)]
        branch: Option<String>,

        /// Commit attached to the trend snapshot
        #[arg(long)]
        commit: Option<String>,

        /// Only log warnings and errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show feature trends from recorded scans
    Trends {
        /// Number of days to include
        #[arg(short, long, default_value_t = 30)]
        days: u32,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List the active detection rules
    Rules {
        /// Config file used to select rules
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Report rule problems and exit non-zero if any exist
        #[arg(long)]
        validate: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Inspect or clear the report cache
    Cache {
        /// Show the number and size of cache entries
        #[arg(long)]
        stats: bool,

        /// Delete every cache entry
        #[arg(long)]
        clear: bool,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

struct ScanArgs {
    paths: Vec<PathBuf>,
    out: PathBuf,
    config: Option<PathBuf>,
    format: OutputFormat,
    no_cache: bool,
    no_trends: bool,
    batch_size: Option<usize>,
    max_file_size: Option<u64>,
    preset: Option<Preset>,
    metadata: TrendMetadata,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            let code = e
                .downcast_ref::<ScanError>()
                .map(ScanError::exit_code)
                .unwrap_or(exit_codes::ERROR);
            ExitCode::from(code)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            paths,
            out,
            config,
            format,
            no_cache,
            no_trends,
            batch_size,
            max_file_size,
            preset,
            project,
            branch,
            commit,
            quiet,
        } => {
            let format = parse_format(&format)?;
            // JSON on stdout stays clean of progress chatter.
            init_logging(quiet || format == OutputFormat::Json);

            let preset = preset
                .map(|p| Preset::from_str(&p).map_err(|e| anyhow::anyhow!(e)))
                .transpose()?;

            run_scan(ScanArgs {
                paths,
                out,
                config,
                format,
                no_cache,
                no_trends,
                batch_size,
                max_file_size,
                preset,
                metadata: TrendMetadata {
                    project,
                    branch,
                    commit,
                },
            })
            .await
        }
        Commands::Trends { days, format } => {
            init_logging(true);
            let format = parse_format(&format)?;
            let trends = TrendStore::new().get_trends(days);
            match format {
                OutputFormat::Json => print_json(&trends)?,
                OutputFormat::Table => print_trends_table(&trends),
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Rules {
            config,
            validate,
            format,
        } => {
            init_logging(true);
            let format = parse_format(&format)?;
            let config = ScanConfig::load(config.as_deref());
            let registry = RuleRegistry::from_options(&config.rules);

            if validate {
                return Ok(report_problems(&registry.validate()));
            }

            match format {
                OutputFormat::Json => {
                    let definitions: Vec<_> = registry.iter().map(|r| r.definition()).collect();
                    print_json(&definitions)?;
                }
                OutputFormat::Table => print_rules_table(registry.build().rules()),
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Cache { stats, clear } => {
            init_logging(true);
            let cache = FingerprintCache::new();
            if clear {
                cache.invalidate_all()?;
                println!("Cache cleared.");
            }
            if stats || !clear {
                let stats = cache.stats()?;
                println!("Cache directory: {}", cache.dir().display());
                println!("Entries: {}", stats.files);
                println!("Size: {} bytes", stats.total_bytes);
            }
            Ok(exit_codes::SUCCESS)
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(args: ScanArgs) -> Result<u8> {
    let mut config = ScanConfig::load(args.config.as_deref());
    if args.no_cache {
        config.cache = false;
    }
    if args.no_trends {
        config.trends = false;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(max_file_size) = args.max_file_size {
        config.max_file_size = max_file_size;
    }
    if let Some(preset) = args.preset {
        config.rules.preset = preset;
    }
    let config = config.normalized();

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut scanner = BatchScanner::new()
        .with_cache(FingerprintCache::new())
        .with_trends(TrendStore::new(), args.metadata)
        .with_cancellation(token);

    let progress = if args.format == OutputFormat::Table {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} Scanning files...")?
                .progress_chars("#>-"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        scanner = scanner.with_progress(pb.clone());
        Some(pb)
    } else {
        None
    };

    let result = scanner.scan_to(&args.paths, &config, &args.out).await;
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    let report = result?;

    match args.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            print_report_table(&report);
            println!();
            println!("Report written to: {}", args.out.display());
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn report_problems(problems: &[String]) -> u8 {
    if problems.is_empty() {
        println!("All rules are valid.");
        return exit_codes::SUCCESS;
    }

    println!("Found {} rule problems:", problems.len());
    for problem in problems {
        println!("  - {}", problem);
    }
    exit_codes::ERROR
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = ScanConfig::default_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = ScanConfig::default();
        config.save(&config_path)?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", ScanConfig::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'baseline-scan config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::from_str(format).map_err(|e| anyhow::anyhow!(e))
}
