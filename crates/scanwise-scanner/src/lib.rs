//! # scanwise-scanner: Scan Session Controller
//!
//! Acquires exactly one barcode from a live decoder and hands it to the
//! caller.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scan Session States                              │
//! │                                                                         │
//! │              start() ok                                                 │
//! │   ┌──────┐ ──────────────► ┌───────────┐                               │
//! │   │ Idle │                 │ Acquiring │ ──┐ payload < 8 chars:        │
//! │   └──────┘ ◄────────────── └───────────┘ ◄─┘ dropped, keep scanning    │
//! │     │  ▲    valid detect (release, then on_complete)                    │
//! │     │  │    stop() / drop                                               │
//! │     │  │                                                                │
//! │     │  │ clear_error()                                                  │
//! │     │  └──────────────┐                                                 │
//! │     │ start() fails   │                                                 │
//! │     └────────────► ┌───────┐                                           │
//! │                    │ Error │  "Camera access denied or not available"  │
//! │                    └───────┘                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`session`] - The controller and its state machine
//! - [`decoder`] - The `Decoder` seam and detection events
//! - [`subscription`] - Cancellable per-session detection channel
//! - [`line_decoder`] - Decoder over a line source (keyboard-wedge scanners)
//! - [`config`] - Fixed decode configuration
//! - [`error`] - Session and decoder errors

pub mod config;
pub mod decoder;
pub mod error;
pub mod line_decoder;
pub mod session;
pub mod subscription;

pub use config::{CameraFacing, DecodeConfig, Resolution, Symbology};
pub use decoder::{Decoder, DetectionEvent, DetectionHandler, HandlerId, RenderSurface};
pub use error::{DecoderError, SessionError, SessionResult};
pub use line_decoder::LineDecoder;
pub use session::{DetectOutcome, ScanSessionController, SessionEnd, SessionState};
pub use subscription::DetectionSubscription;
