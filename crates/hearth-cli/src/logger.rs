//! Logging setup for the CLI.
//!
//! Library crates only emit `tracing` events; the binary decides what is shown.
//!
//! ```rust,no_run
//! use hearth_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("watching");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "hearth=debug,hearth_rolldown=debug,hearth_cli=debug";
const QUIET_FILTER: &str = "hearth=error,hearth_rolldown=error,hearth_cli=error";
const DEFAULT_FILTER: &str = "hearth=info,hearth_rolldown=info,hearth_cli=info";

/// Pick the filter for the given flags.
///
/// `--verbose` wins over `--quiet`; without either, `RUST_LOG` is honored and
/// falls back to info level for the hearth crates.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && crate::ui::should_use_color())
        .compact();

    tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .init();
}
