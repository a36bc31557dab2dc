//! # Line Decoder
//!
//! Decoder for keyboard-wedge and serial handheld scanners, which "type" each
//! barcode followed by a newline. Every non-empty line is one detection.
//!
//! ```text
//!   stdin / serial ──► reader task ──► infer symbology ──► in config? ──► handlers
//!                         │                                │                │
//!                         │ EOF: handlers dropped          └─ no: skipped   ▼
//!                         ▼                                           task ends
//!                   detection stream ends
//! ```
//!
//! The reader task ends as soon as it dispatches a line, so nothing past
//! that line is consumed. The reader is shared behind an async mutex and the
//! next `start()` continues from the next unread line.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use scanwise_core::validation::is_accepted_payload;

use crate::config::{DecodeConfig, Symbology};
use crate::decoder::{Decoder, DetectionEvent, DetectionHandler, HandlerId, RenderSurface};
use crate::error::DecoderError;

type HandlerMap = Arc<Mutex<HashMap<HandlerId, DetectionHandler>>>;

/// A [`Decoder`] over any async line source.
pub struct LineDecoder<R> {
    reader: Arc<tokio::sync::Mutex<R>>,
    handlers: HandlerMap,
    exhausted: Arc<AtomicBool>,
    config: Option<DecodeConfig>,
    task: Option<JoinHandle<()>>,
    next_id: u64,
}

impl<R> LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Arc::new(tokio::sync::Mutex::new(reader)),
            handlers: Arc::new(Mutex::new(HashMap::new())),
            exhausted: Arc::new(AtomicBool::new(false)),
            config: None,
            task: None,
            next_id: 0,
        }
    }

    /// True once the source has reached end of input.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }

    /// True while the reader task is running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

fn lock(handlers: &HandlerMap) -> MutexGuard<'_, HashMap<HandlerId, DetectionHandler>> {
    handlers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn dispatch(handlers: &HandlerMap, event: DetectionEvent) {
    for handler in lock(handlers).values() {
        handler(event.clone());
    }
}

/// Reads until one line is dispatched or the source ends.
async fn read_lines<R>(
    reader: Arc<tokio::sync::Mutex<R>>,
    handlers: HandlerMap,
    exhausted: Arc<AtomicBool>,
    config: DecodeConfig,
) where
    R: AsyncBufRead + Unpin + Send,
{
    let mut reader = reader.lock().await;
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("Line source closed");
                break;
            }
            Ok(_) => {
                let payload = line.trim();
                if payload.is_empty() {
                    continue;
                }
                if !is_accepted_payload(payload) {
                    trace!(len = payload.chars().count(), "Line skipped: too short");
                    continue;
                }
                match Symbology::infer(payload) {
                    Some(symbology) if config.accepts(symbology) => {
                        trace!(%symbology, len = payload.chars().count(), "Line decoded");
                        dispatch(
                            &handlers,
                            DetectionEvent::new(payload).with_symbology(symbology),
                        );
                        return;
                    }
                    other => {
                        trace!(symbology = ?other, "Line skipped: symbology not enabled");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Line source failed");
                break;
            }
        }
    }

    exhausted.store(true, Ordering::SeqCst);
    lock(&handlers).clear();
}

impl<R> Decoder for LineDecoder<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn init(&mut self, surface: &RenderSurface, config: &DecodeConfig) -> Result<(), DecoderError> {
        if self.is_exhausted() {
            return Err(DecoderError::InputClosed);
        }
        debug!(%surface, symbologies = ?config.symbologies, "Line decoder ready");
        self.config = Some(config.clone());
        Ok(())
    }

    fn start(&mut self) -> Result<(), DecoderError> {
        let config = self.config.clone().ok_or(DecoderError::NotInitialized)?;
        let runtime = Handle::try_current().map_err(|e| DecoderError::Start(e.to_string()))?;

        if let Some(previous) = self.task.take() {
            previous.abort();
        }

        self.task = Some(runtime.spawn(read_lines(
            self.reader.clone(),
            self.handlers.clone(),
            self.exhausted.clone(),
            config,
        )));
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Line reader stopped");
        }
    }

    fn on_detected(&mut self, handler: DetectionHandler) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        lock(&self.handlers).insert(id, handler);
        id
    }

    fn off_detected(&mut self, id: HandlerId) {
        lock(&self.handlers).remove(&id);
    }
}

impl<R> Drop for LineDecoder<R> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
