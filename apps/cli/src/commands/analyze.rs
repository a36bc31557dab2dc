//! `scanwise barcode|image|analysis|batch`

use scanwise_client::{FlowState, ImageUpload};
use scanwise_core::validation::{normalize_barcode, parse_analysis_id};
use tracing::info;

use crate::cli::ImageArgs;
use crate::commands::Context;
use crate::error::CliError;
use crate::output::AnalysisView;

/// Analyses one hand-typed barcode.
pub async fn barcode(code: &str, ctx: &Context) -> Result<(), CliError> {
    let code = normalize_barcode(code)?;
    let mut flow = ctx.flow()?;

    let record = flow.submit_barcode(&code).await?;
    ctx.writer.render(&AnalysisView::new(record, ctx.tab))
}

/// Uploads a label photo.
pub async fn image(args: ImageArgs, ctx: &Context) -> Result<(), CliError> {
    let upload = ImageUpload::from_path(&args.path).await?;
    info!(
        path = %args.path.display(),
        bytes = upload.bytes.len(),
        scan_type = %args.scan_type,
        "Uploading label photo"
    );

    let mut flow = ctx.flow()?;
    match flow.submit_image(upload, args.scan_type).await? {
        FlowState::Ready => match flow.record() {
            Some(record) => ctx.writer.render(&AnalysisView::new(record, ctx.tab)),
            None => Ok(()),
        },
        FlowState::Unidentified => match flow.unidentified() {
            Some(scan) => ctx.writer.render(scan),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

/// Shows a stored analysis.
pub async fn analysis(id: &str, ctx: &Context) -> Result<(), CliError> {
    let id = parse_analysis_id(id)?;
    let record = ctx.client()?.analysis(id).await?;
    ctx.writer.render(&AnalysisView::new(&record, ctx.tab))
}

/// Submits several hand-typed barcodes at once.
pub async fn batch(barcodes: &[String], ctx: &Context) -> Result<(), CliError> {
    let barcodes = barcodes
        .iter()
        .map(|code| normalize_barcode(code))
        .collect::<Result<Vec<_>, _>>()?;
    let report = ctx.client()?.batch_scan(&barcodes).await?;
    ctx.writer.render(&report)
}
