//! Tracing subscriber setup for the CLI.
//!
//! Library code only emits `tracing` events; the binary decides where they go.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::DEFAULT_LOG_DIRECTIVE;

/// Install a stderr fmt subscriber filtered by `RUST_LOG`.
///
/// Falls back to [`DEFAULT_LOG_DIRECTIVE`] when `RUST_LOG` is unset or invalid.
/// `verbose` raises the crate's level to `debug`.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "congestion=debug"
    } else {
        DEFAULT_LOG_DIRECTIVE
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
