//! # Scan Flow
//!
//! Takes what the scanner produced (a decoded barcode, or a label photo),
//! submits it for analysis, and keeps the result for rendering.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──submit──► Loading ──201 record───────► Ready         (success) │
//! │    ▲                  │                                                 │
//! │    │                  ├──200 label read───────► Unidentified  (info)    │
//! │    │                  │                                                 │
//! │    │                  └──any failure──────────► Failed        (error)   │
//! │    │                                                                    │
//! │    └──────────── reset() from any state ◄───────────────────────────────│
//! │                                                                         │
//! │  Every submission ends with exactly one toast. Upstream failures all    │
//! │  read "Scan failed. Please try again."; no record survives a failure.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use scanwise_core::{AnalysisRecord, ImageScanOutcome, ImageScanType, UnidentifiedScan};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{AnalysisClient, ImageUpload};
use crate::error::{ClientError, ClientResult};
use crate::notify::{Notifier, Toast};

/// Where the flow is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowState {
    #[default]
    Idle,
    Loading,
    Ready,
    Unidentified,
    Failed,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlowState::Idle => "idle",
            FlowState::Loading => "loading",
            FlowState::Ready => "ready",
            FlowState::Unidentified => "unidentified",
            FlowState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Submits scans and holds the latest result.
pub struct ScanFlow {
    client: AnalysisClient,
    notifier: Arc<dyn Notifier>,
    state: FlowState,
    record: Option<AnalysisRecord>,
    unidentified: Option<UnidentifiedScan>,
    last_error: Option<String>,
}

impl ScanFlow {
    pub fn new(client: AnalysisClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            client,
            notifier,
            state: FlowState::Idle,
            record: None,
            unidentified: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    /// The analysis being shown, when Ready.
    pub fn record(&self) -> Option<&AnalysisRecord> {
        self.record.as_ref()
    }

    /// What the service read from a label it could not match.
    pub fn unidentified(&self) -> Option<&UnidentifiedScan> {
        self.unidentified.as_ref()
    }

    /// User-facing text of the last failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn client(&self) -> &AnalysisClient {
        &self.client
    }

    /// Back to Idle, dropping any held result.
    pub fn reset(&mut self) {
        self.state = FlowState::Idle;
        self.record = None;
        self.unidentified = None;
        self.last_error = None;
    }

    fn begin(&mut self) {
        self.reset();
        self.state = FlowState::Loading;
    }

    fn fail(&mut self, err: &ClientError) {
        let message = err.user_message();
        warn!(error = %err, status = ?err.status(), "Scan submission failed");
        self.state = FlowState::Failed;
        self.last_error = Some(message.clone());
        self.notifier.notify(Toast::error(message));
    }

    fn show(&mut self, record: AnalysisRecord) -> &AnalysisRecord {
        self.notifier
            .notify(Toast::success(format!("Analysis ready: {}", record.headline())));
        self.state = FlowState::Ready;
        self.record.insert(record)
    }

    /// Submits a decoded barcode. On success the record is held and returned.
    pub async fn submit_barcode(&mut self, barcode: &str) -> ClientResult<&AnalysisRecord> {
        self.begin();
        debug!(len = barcode.chars().count(), "Submitting barcode");

        match self.client.scan_barcode(barcode).await {
            Ok(record) => Ok(self.show(record)),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Submits a label photo. Returns the state it ended in.
    pub async fn submit_image(
        &mut self,
        image: ImageUpload,
        scan_type: ImageScanType,
    ) -> ClientResult<FlowState> {
        self.begin();
        debug!(file = %image.file_name, %scan_type, "Submitting label image");

        match self.client.scan_image(image, scan_type).await {
            Ok(ImageScanOutcome::Analysed(record)) => {
                self.show(record);
            }
            Ok(ImageScanOutcome::Unidentified(scan)) => {
                self.notifier.notify(Toast::info(scan.message.clone()));
                self.state = FlowState::Unidentified;
                self.unidentified = Some(scan);
            }
            Err(e) => {
                self.fail(&e);
                return Err(e);
            }
        }
        Ok(self.state)
    }
}

impl fmt::Debug for ScanFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanFlow")
            .field("state", &self.state)
            .field("record", &self.record.as_ref().map(|r| r.id))
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
