//! `scanwise config` command handler

use std::path::PathBuf;

use scanwise_client::ClientConfig;
use tracing::info;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::Context;
use crate::error::CliError;
use crate::output::{ConfigView, ConfigWritten};

pub fn execute(args: ConfigArgs, ctx: &Context) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Show => show(ctx),
        ConfigAction::Init { force } => init(ctx, force).map(|_| ()),
    }
}

fn resolve_path(ctx: &Context) -> Option<PathBuf> {
    ctx.config_path.clone().or_else(ClientConfig::default_config_path)
}

/// Prints the effective configuration with the token redacted.
fn show(ctx: &Context) -> Result<(), CliError> {
    let config = ctx.load_config()?;
    let path = resolve_path(ctx)
        .filter(|p| p.exists())
        .map(|p| p.display().to_string());

    ctx.writer.render(&ConfigView::new(&config, path))
}

/// Writes a default config file. Refuses to overwrite unless `force`.
fn init(ctx: &Context, force: bool) -> Result<PathBuf, CliError> {
    let path = resolve_path(ctx)
        .ok_or_else(|| CliError::Config("no config directory available; pass --config".into()))?;

    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "{} already exists; use --force to overwrite",
            path.display()
        )));
    }

    let written = ClientConfig::default()
        .save(Some(path))
        .map_err(|e| CliError::Config(e.to_string()))?;
    info!(path = %written.display(), "Default config written");

    ctx.writer.render(&ConfigWritten {
        path: written.display().to_string(),
    })?;
    Ok(written)
}
