//! # Scanner Errors
//!
//! Decoder failures are recoverable: the controller turns them into its
//! Error state instead of returning them. Only misuse of the controller
//! surfaces as a `SessionError`.

use thiserror::Error;

use crate::session::SessionState;

/// Errors reported by a [`Decoder`](crate::Decoder) implementation.
#[derive(Debug, Error)]
pub enum DecoderError {
    /// The user or platform refused access to the camera.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No usable device behind the render surface.
    #[error("Device unavailable: {0}")]
    Unavailable(String),

    /// `start()` was called before a successful `init()`.
    #[error("Decoder not initialized")]
    NotInitialized,

    /// Decoding could not begin.
    #[error("Failed to start decoding: {0}")]
    Start(String),

    /// The input source has already ended.
    #[error("Input closed")]
    InputClosed,
}

impl DecoderError {
    /// Returns true if the user can fix this by granting access.
    pub fn is_permission_error(&self) -> bool {
        matches!(self, DecoderError::PermissionDenied(_))
    }
}

/// Errors from misusing the session controller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// `start()` was called while a session is live or an error is unacknowledged.
    #[error("Cannot start a scan session while {state}")]
    NotIdle { state: SessionState },
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
