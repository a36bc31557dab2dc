//! # Decoder Seam
//!
//! The controller drives any barcode decoder through this trait. A camera
//! binding, a keyboard-wedge reader and the scripted decoder used in tests
//! all sit behind it.
//!
//! ```text
//!   controller                          decoder
//!   ──────────                          ───────
//!   init(surface, config) ───────────►  open device
//!   on_detected(handler)  ───────────►  remember handler ──► HandlerId
//!   start()               ───────────►  begin decoding
//!                         ◄───────────  handler(DetectionEvent)  (any thread)
//!   off_detected(id)      ───────────►  forget handler
//!   stop()                ───────────►  halt, release device
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{DecodeConfig, Symbology};
use crate::error::DecoderError;

/// Identifier of the surface or device the decoder attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderSurface(String);

impl RenderSurface {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One decode attempt reported by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Decoded text.
    pub payload: String,
    pub symbology: Option<Symbology>,
    /// Decoder confidence in 0.0..=1.0, when reported.
    pub confidence: Option<f32>,
}

impl DetectionEvent {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            symbology: None,
            confidence: None,
        }
    }

    pub fn with_symbology(mut self, symbology: Symbology) -> Self {
        self.symbology = Some(symbology);
        self
    }
}

/// Token returned by [`Decoder::on_detected`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u64);

/// Callback invoked for every detection. May run on the decoder's own task.
pub type DetectionHandler = Box<dyn Fn(DetectionEvent) + Send + Sync + 'static>;

/// A barcode decoder the session controller can drive.
///
/// `stop()` must be safe to call at any time, any number of times, and
/// must not fail: the controller calls it on every release path.
pub trait Decoder: Send {
    /// Prepares the decoder for the given surface.
    fn init(&mut self, surface: &RenderSurface, config: &DecodeConfig) -> Result<(), DecoderError>;

    /// Begins continuous decoding.
    fn start(&mut self) -> Result<(), DecoderError>;

    /// Halts decoding and releases the underlying device.
    fn stop(&mut self);

    /// Registers a detection handler.
    fn on_detected(&mut self, handler: DetectionHandler) -> HandlerId;

    /// Unregisters a handler. Unknown ids are ignored.
    fn off_detected(&mut self, id: HandlerId);
}

impl<D: Decoder + ?Sized> Decoder for Box<D> {
    fn init(&mut self, surface: &RenderSurface, config: &DecodeConfig) -> Result<(), DecoderError> {
        (**self).init(surface, config)
    }

    fn start(&mut self) -> Result<(), DecoderError> {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn on_detected(&mut self, handler: DetectionHandler) -> HandlerId {
        (**self).on_detected(handler)
    }

    fn off_detected(&mut self, id: HandlerId) {
        (**self).off_detected(id)
    }
}
