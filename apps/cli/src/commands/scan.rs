//! `scanwise scan`: a keyboard-wedge scanner on stdin.
//!
//! ```text
//! stdin lines ──► LineDecoder ──► ScanSessionController ──► ScanFlow ──► stdout
//!                  (noise < 8 chars dropped by the controller)   │
//!                                                                └──► toasts on stderr
//! ```

use scanwise_client::ScanFlow;
use scanwise_scanner::{
    Decoder, LineDecoder, RenderSurface, ScanSessionController, SessionEnd, SessionState,
};
use tokio::io::BufReader;
use tracing::{debug, info};

use crate::cli::{OutputFormat, ScanArgs};
use crate::commands::Context;
use crate::error::CliError;
use crate::output::AnalysisView;

pub async fn execute(args: ScanArgs, ctx: &Context) -> Result<(), CliError> {
    let mut flow = ctx.flow()?;
    let decoder = LineDecoder::new(BufReader::new(tokio::io::stdin()));
    let mut controller = ScanSessionController::new(decoder);

    let scanned = run_sessions(&mut controller, &mut flow, ctx, args.continuous).await?;
    info!(scanned, "Scanning finished");
    Ok(())
}

/// Runs scan sessions until input ends (or after one, unless `continuous`).
/// Returns how many barcodes were submitted.
async fn run_sessions<D: Decoder>(
    controller: &mut ScanSessionController<D>,
    flow: &mut ScanFlow,
    ctx: &Context,
    continuous: bool,
) -> Result<usize, CliError> {
    let surface = RenderSurface::new("stdin");
    let mut scanned = 0;

    loop {
        if ctx.writer.format() == OutputFormat::Text {
            eprintln!("Waiting for a barcode (Ctrl-D to finish)...");
        }

        if controller.start(&surface, |code| debug!(len = code.chars().count(), "Barcode captured"))?
            == SessionState::Error
        {
            let reason = controller.last_error().unwrap_or_default().to_string();
            return Err(CliError::Scan(reason));
        }

        let code = match controller.wait().await {
            SessionEnd::Completed(code) => code,
            SessionEnd::Stopped => break,
            SessionEnd::Failed(reason) => return Err(CliError::Scan(reason)),
        };

        scanned += 1;
        match flow.submit_barcode(&code).await {
            Ok(record) => ctx.writer.render(&AnalysisView::new(record, ctx.tab))?,
            // The flow has already reported it; keep going
            Err(e) if continuous => debug!(error = %e, "Submission failed"),
            Err(e) => return Err(e.into()),
        }

        if !continuous {
            break;
        }
    }
    Ok(scanned)
}
