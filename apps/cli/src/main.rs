//! # Scanwise CLI
//!
//! Command-line front-end for the Scanwise analysis service.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  argv ──► Cli::parse ──► init_tracing ──► commands::run ──► exit code   │
//! │                                                │                        │
//! │            ┌───────────────┬──────────────────┼──────────────┐         │
//! │            ▼               ▼                  ▼              ▼         │
//! │         scan          barcode/image      history/stats    config      │
//! │     (stdin scanner)   analysis/batch                                   │
//! │                                                                         │
//! │  stdout: results (text or JSON)    stderr: logs, toasts, prompts       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

const DEFAULT_LOG_FILTER: &str = "info,scanwise=debug";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    info!(version = env!("CARGO_PKG_VERSION"), "Scanwise CLI starting");

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, code = e.exit_code(), "Command failed");
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// Initializes tracing on stderr.
///
/// ## Filter Priority
/// 1. `--log-level` (any EnvFilter directive, e.g. `debug,reqwest=warn`)
/// 2. `RUST_LOG`
/// 3. `info,scanwise=debug`
fn init_tracing(log_level: Option<&str>) {
    let filter = log_level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
