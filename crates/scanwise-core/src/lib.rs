//! # scanwise-core: Pure Domain Logic for Scanwise
//!
//! This crate holds the types and rules shared by every other Scanwise crate.
//! It contains no I/O: no network, no camera, no file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scanwise Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Front-end (CLI / Web)                        │   │
//! │  │    Scan ──► Submit ──► Overview / Health / Long-term / Ingr.    │   │
//! │  └───────────────┬─────────────────────────────┬───────────────────┘   │
//! │                  │                             │                        │
//! │  ┌───────────────▼──────────────┐  ┌───────────▼───────────────────┐   │
//! │  │      scanwise-scanner        │  │      scanwise-client          │   │
//! │  │  Session controller, decoder │  │  HTTP analysis API, context   │   │
//! │  └───────────────┬──────────────┘  └───────────┬───────────────────┘   │
//! │                  │                             │                        │
//! │  ┌───────────────▼─────────────────────────────▼───────────────────┐   │
//! │  │               ★ scanwise-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌─────────────┐  ┌───────────┐                │   │
//! │  │   │   types   │  │ validation  │  │  report   │                │   │
//! │  │   │ Analysis  │  │  barcode    │  │ ResultTab │                │   │
//! │  │   │ Product   │  │  payload    │  │  TabView  │                │   │
//! │  │   └───────────┘  └─────────────┘  └───────────┘                │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CAMERA • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Analysis record and the service's other payloads
//! - [`validation`] - Input rules applied before anything leaves the device
//! - [`report`] - Tabbed views over an analysis record
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use scanwise_core::validation::{is_accepted_payload, normalize_barcode};
//!
//! // Decoder noise is shorter than eight characters
//! assert!(!is_accepted_payload("1234567"));
//! assert!(is_accepted_payload("12345678"));
//!
//! // Manual entry tolerates separators
//! assert_eq!(normalize_barcode("5 012345 678900").unwrap(), "5012345678900");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use report::{ResultTab, TabSection, TabView};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum decoded payload length accepted as a real scan.
///
/// ## Why 8?
/// EAN-8 is the shortest retail symbology we decode. Anything shorter coming
/// out of the decoder is a partial read of a longer code.
pub const MIN_PAYLOAD_LEN: usize = 8;

/// Maximum barcodes in one batch submission.
///
/// ## Business Reason
/// The analysis service rejects larger batches; checking here avoids a
/// round trip that is known to fail.
pub const MAX_BATCH_BARCODES: usize = 20;

/// Default number of history entries requested.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Message shown when the camera or decoder cannot be acquired.
pub const CAMERA_UNAVAILABLE_MESSAGE: &str = "Camera access denied or not available";

/// Generic message shown when an analysis submission fails upstream.
pub const SCAN_FAILED_MESSAGE: &str = "Scan failed. Please try again.";
