//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout only ever carries the summary.

use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over the `verbose` flag.
pub fn init_logger(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(atty::is(atty::Stream::Stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Log a run-ending error and echo it to stderr as a coloured `error:` line
pub fn report_fatal(error: &anyhow::Error) {
    let message = format!("{:#}", error);
    tracing::error!(error = %message, "run failed");
    eprintln!("{} {}", "error:".red().bold(), message);
}
