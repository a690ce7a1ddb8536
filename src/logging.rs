//! Logging initialization for the CLI.
//!
//! Uses `tracing` with `tracing-subscriber`. Logs go to stderr so that JSON
//! on stdout stays machine-readable. `RUST_LOG` overrides the default level:
//!
//! ```bash
//! RUST_LOG=baseline_scan=debug baseline-scan scan --paths src
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber.
///
/// With `quiet` only warnings and errors are shown.
pub fn init_logging(quiet: bool) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let default_filter = if quiet {
        "baseline_scan=warn"
    } else {
        "baseline_scan=info"
    };
    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
