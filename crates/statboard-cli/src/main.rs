//! statboard - a command-line dashboard for entity usage statistics.
//!
//! Fetches time-series metrics from the stats API, caches them per entity
//! for an hour, and prints chart-ready JSON, headline totals or CSV.

mod cli;
mod commands;

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use statboard_core::Config;

use cli::Cli;

/// Log file name prefix inside `log_dir`
const LOG_FILE_PREFIX: &str = "statboard.log";

/// Daily-rotated log file appender in `dir`, creating the directory.
fn file_appender(dir: &Path) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .with_context(|| format!("Failed to open log directory {}", dir.display()))
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, and to a daily-rotated file when `log_dir` is set and
/// usable. The returned guard must stay alive for file output to be flushed.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = config.log_dir.as_deref().and_then(|dir| match file_appender(dir) {
        Ok(appender) => Some(appender),
        Err(e) => {
            // The subscriber isn't up yet
            eprintln!("warning: {:#}; logging to stderr only", e);
            None
        }
    });
    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(ref url) = cli.api_url {
        config.api_base_url = url.clone();
    }

    let _guard = init_tracing(&config);
    info!(api = %config.api_base_url, "statboard starting");

    commands::run(&cli, config).await
}
