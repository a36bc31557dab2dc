//! `scanwise history|stats`

use scanwise_client::HistoryQuery;

use crate::cli::HistoryArgs;
use crate::commands::Context;
use crate::error::CliError;
use crate::output::HistoryView;

pub async fn history(args: HistoryArgs, ctx: &Context) -> Result<(), CliError> {
    let query = HistoryQuery {
        limit: args.limit,
        scan_type: args.scan_type,
    };
    let records = ctx.client()?.history(&query).await?;
    ctx.writer.render(&HistoryView(records))
}

pub async fn stats(ctx: &Context) -> Result<(), CliError> {
    let stats = ctx.client()?.stats().await?;
    ctx.writer.render(&stats)
}
