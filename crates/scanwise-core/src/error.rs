//! # Error Types
//!
//! Domain-specific error types for scanwise-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  scanwise-core errors (this file)                                      │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  scanwise-scanner errors (separate crate)                              │
//! │  └── SessionError / DecoderError                                       │
//! │                                                                         │
//! │  scanwise-client errors (separate crate)                               │
//! │  └── ClientError      - Config, auth, HTTP failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → ClientError → Toast / CLI exit                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The service returned a safety level we do not know.
    #[error("Unknown safety level: {0}")]
    UnknownSafetyLevel(String),

    /// The image scan type is not one of ingredients, nutrition, general.
    #[error("Unknown scan type: {0}")]
    UnknownScanType(String),

    /// The result tab name is not recognised.
    #[error("Unknown result tab: {0}")]
    UnknownTab(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur before anything is sent to the analysis service.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., wrong content type, malformed id).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownSafetyLevel("PURPLE".to_string());
        assert_eq!(err.to_string(), "Unknown safety level: PURPLE");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "barcode is required");

        let err = ValidationError::OutOfRange {
            field: "barcodes".to_string(),
            min: 1,
            max: 20,
        };
        assert_eq!(err.to_string(), "barcodes must be between 1 and 20");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "image".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
