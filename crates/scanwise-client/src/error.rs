//! # Client Error Types
//!
//! Error types for everything that talks to the analysis service.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │  Authentication │  │     Upstream            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  NotAuthent.    │  │  Request (network)      │ │
//! │  │  InvalidUrl     │  │  TokenExpired   │  │  ScanFailed (non-2xx)   │ │
//! │  │  ConfigLoad/Save│  │                 │  │  Decode (bad body)      │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Validation     │  rejected before any request is sent              │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these are retried: the user decides whether to scan again.

use scanwise_core::{ValidationError, SCAN_FAILED_MESSAGE};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors from the analysis client and its context.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Invalid service URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Authentication Errors
    // =========================================================================
    /// No bearer token is available.
    #[error("Not signed in")]
    NotAuthenticated,

    /// The bearer token's `exp` claim is in the past.
    #[error("Session expired, please sign in again")]
    TokenExpired,

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Input rejected before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Local file could not be read.
    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: String, reason: String },

    // =========================================================================
    // Upstream Errors
    // =========================================================================
    /// Network failure reaching the service.
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status.
    #[error("Scan failed ({status}): {message}")]
    ScanFailed { status: u16, message: String },

    /// The service answered with a body we could not decode.
    #[error("Unexpected response: {0}")]
    Decode(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if err.is_builder() {
            ClientError::InvalidConfig(err.to_string())
        } else {
            ClientError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if the failure happened at or beyond the service boundary.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ClientError::Request(_) | ClientError::ScanFailed { .. } | ClientError::Decode(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, ClientError::NotAuthenticated | ClientError::TokenExpired)
    }

    /// HTTP status of an upstream rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::ScanFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for a toast.
    ///
    /// Upstream failures collapse to one generic message; everything else
    /// is specific enough to act on.
    pub fn user_message(&self) -> String {
        if self.is_upstream() {
            SCAN_FAILED_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}
