//! Command handlers, one module per area.

pub mod analyze;
pub mod config;
pub mod history;
pub mod scan;

use std::path::PathBuf;
use std::sync::Arc;

use scanwise_client::{AnalysisClient, AuthContext, ClientConfig, ScanFlow};
use tracing::debug;

use crate::cli::{Cli, Commands, TabChoice};
use crate::error::CliError;
use crate::output::{OutputWriter, StderrNotifier};

/// What every handler needs: configuration and where output goes.
pub struct Context {
    pub config_path: Option<PathBuf>,
    pub writer: OutputWriter,
    pub tab: TabChoice,
}

impl Context {
    /// Loads configuration (file, then environment) and validates it.
    pub fn load_config(&self) -> Result<ClientConfig, CliError> {
        ClientConfig::load(self.config_path.clone()).map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn client(&self) -> Result<AnalysisClient, CliError> {
        let config = self.load_config()?;
        let auth = AuthContext::from_optional(config.token());
        let client = AnalysisClient::new(&config, auth)?;
        debug!(base_url = %client.base_url(), "Analysis client ready");
        Ok(client)
    }

    /// A scan flow that reports toasts on stderr.
    pub fn flow(&self) -> Result<ScanFlow, CliError> {
        Ok(ScanFlow::new(self.client()?, Arc::new(StderrNotifier)))
    }
}

/// Dispatches the parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context {
        config_path: cli.config,
        writer: OutputWriter::new(cli.output),
        tab: cli.tab,
    };

    match cli.command {
        Commands::Scan(args) => scan::execute(args, &ctx).await,
        Commands::Barcode { code } => analyze::barcode(&code, &ctx).await,
        Commands::Image(args) => analyze::image(args, &ctx).await,
        Commands::Analysis { id } => analyze::analysis(&id, &ctx).await,
        Commands::Batch { barcodes } => analyze::batch(&barcodes, &ctx).await,
        Commands::History(args) => history::history(args, &ctx).await,
        Commands::Stats => history::stats(&ctx).await,
        Commands::Config(args) => config::execute(args, &ctx),
    }
}
