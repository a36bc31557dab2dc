//! # Validation Module
//!
//! Input rules applied before anything is sent to the analysis service.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Scan Session Controller                                      │
//! │  └── Decoder noise filter (payload < 8 chars is dropped)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Analysis client (THIS MODULE)                                │
//! │  ├── Barcode present (any symbology)                                   │
//! │  ├── Image upload (non-empty, image/* content type)                    │
//! │  └── Batch size, history limit                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Analysis service                                             │
//! │  └── Product lookup, profile checks                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use scanwise_core::validation::{normalize_barcode, validate_history_limit};
//!
//! assert_eq!(normalize_barcode("4006381-333931").unwrap(), "4006381333931");
//! assert!(validate_history_limit(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_BATCH_BARCODES, MIN_PAYLOAD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Upper bound for a history request.
pub const MAX_HISTORY_LIMIT: u32 = 500;

// =============================================================================
// Detection Payloads
// =============================================================================

/// Whether a decoded payload is long enough to be a real scan.
///
/// Counts characters, not bytes.
///
/// ## Example
/// ```rust
/// use scanwise_core::validation::is_accepted_payload;
///
/// assert!(!is_accepted_payload(""));
/// assert!(is_accepted_payload("ABCDEFGH"));
/// ```
pub fn is_accepted_payload(payload: &str) -> bool {
    payload.chars().count() >= MIN_PAYLOAD_LEN
}

// =============================================================================
// Barcodes
// =============================================================================

/// Validates a barcode payload before it is submitted.
///
/// ## Rules
/// - Surrounding whitespace is trimmed
/// - What remains must not be empty
/// - Any symbology is allowed: Code 128 and Code 39 payloads are not digits
pub fn validate_barcode(input: &str) -> ValidationResult<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Normalizes a hand-typed barcode.
///
/// ## Rules
/// - Passes [`validate_barcode`]
/// - A code made only of digits, spaces and hyphens is a retail number
///   typed with separators; the separators are removed
/// - Anything else is kept as typed
pub fn normalize_barcode(input: &str) -> ValidationResult<String> {
    let code = validate_barcode(input)?;

    let retail = code
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-');
    if !retail {
        return Ok(code);
    }

    let digits: String = code.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "contains no digits".to_string(),
        });
    }
    Ok(digits)
}

/// Validates a batch of barcodes.
///
/// ## Rules
/// - Between 1 and 20 barcodes
/// - Every barcode passes [`validate_barcode`]; the first failure is
///   reported with its position
pub fn validate_batch<S: AsRef<str>>(barcodes: &[S]) -> ValidationResult<Vec<String>> {
    if barcodes.is_empty() || barcodes.len() > MAX_BATCH_BARCODES {
        return Err(ValidationError::OutOfRange {
            field: "barcodes".to_string(),
            min: 1,
            max: MAX_BATCH_BARCODES as i64,
        });
    }

    barcodes
        .iter()
        .enumerate()
        .map(|(i, code)| {
            validate_barcode(code.as_ref()).map_err(|_| ValidationError::Required {
                field: format!("barcodes[{i}]"),
            })
        })
        .collect()
}

// =============================================================================
// Images
// =============================================================================

/// Validates a label photo before upload.
///
/// ## Rules
/// - Must not be empty
/// - Content type must be `image/*`
pub fn validate_image_upload(len: usize, content_type: &str) -> ValidationResult<()> {
    if len == 0 {
        return Err(ValidationError::Required {
            field: "image".to_string(),
        });
    }

    let is_image = content_type
        .split_once('/')
        .map(|(kind, sub)| kind.trim().eq_ignore_ascii_case("image") && !sub.trim().is_empty())
        .unwrap_or(false);

    if !is_image {
        return Err(ValidationError::InvalidFormat {
            field: "image".to_string(),
            reason: format!("content type {content_type:?} is not an image"),
        });
    }

    Ok(())
}

/// Content type for a label photo, from its file extension.
pub fn image_content_type(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "heic" => Some("image/heic"),
        _ => None,
    }
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Validates a history page size (1..=500).
pub fn validate_history_limit(limit: u32) -> ValidationResult<()> {
    if limit == 0 || limit > MAX_HISTORY_LIMIT {
        return Err(ValidationError::OutOfRange {
            field: "history limit".to_string(),
            min: 1,
            max: MAX_HISTORY_LIMIT as i64,
        });
    }
    Ok(())
}

/// Scan kinds the history endpoint can filter on.
pub const HISTORY_SCAN_TYPES: [&str; 4] = ["barcode", "ingredient", "nutrition", "manual"];

/// Normalizes a history `scan_type` filter.
pub fn validate_history_scan_type(scan_type: &str) -> ValidationResult<String> {
    let normalized = scan_type.trim().to_ascii_lowercase();
    if HISTORY_SCAN_TYPES.contains(&normalized.as_str()) {
        Ok(normalized)
    } else {
        Err(ValidationError::NotAllowed {
            field: "scan_type".to_string(),
            allowed: HISTORY_SCAN_TYPES.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Validates an analysis id taken from user input.
pub fn parse_analysis_id(input: &str) -> ValidationResult<i64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "analysis id".to_string(),
        });
    }
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidFormat {
            field: "analysis id".to_string(),
            reason: "must be a positive integer".to_string(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_threshold() {
        assert!(!is_accepted_payload("1234567"));
        assert!(is_accepted_payload("12345678"));
        // Multi-byte characters count once each
        assert!(!is_accepted_payload("ééééééé"));
        assert!(is_accepted_payload("éééééééé"));
    }

    #[test]
    fn test_validate_barcode() {
        assert_eq!(validate_barcode(" 96385074\n").unwrap(), "96385074");
        // Code 39 and Code 128 payloads pass untouched
        assert_eq!(validate_barcode("ABCD-1234").unwrap(), "ABCD-1234");
        assert_eq!(validate_barcode("abc-123/x").unwrap(), "abc-123/x");

        assert!(matches!(
            validate_barcode("   "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(normalize_barcode("96385074").unwrap(), "96385074");
        assert_eq!(normalize_barcode("0 12345 67890 5").unwrap(), "012345678905");
        assert_eq!(normalize_barcode("4006381-333931").unwrap(), "4006381333931");
        assert_eq!(normalize_barcode("ABCD-1234").unwrap(), "ABCD-1234");

        assert!(matches!(
            normalize_barcode("   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            normalize_barcode(" - - "),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_batch() {
        let ok = validate_batch(&["12345678", " ABCD-1234 "]).unwrap();
        assert_eq!(ok, vec!["12345678", "ABCD-1234"]);

        let empty: [&str; 0] = [];
        assert!(validate_batch(&empty).is_err());

        let too_many = vec!["12345678"; MAX_BATCH_BARCODES + 1];
        assert!(matches!(
            validate_batch(&too_many),
            Err(ValidationError::OutOfRange { max: 20, .. })
        ));

        let err = validate_batch(&["12345678", " "]).unwrap_err();
        assert!(err.to_string().starts_with("barcodes[1]"));
    }

    #[test]
    fn test_validate_image_upload() {
        assert!(validate_image_upload(10, "image/jpeg").is_ok());
        assert!(validate_image_upload(10, "IMAGE/png").is_ok());
        assert!(validate_image_upload(0, "image/jpeg").is_err());
        assert!(validate_image_upload(10, "application/pdf").is_err());
        assert!(validate_image_upload(10, "image/").is_err());
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type("label.JPG"), Some("image/jpeg"));
        assert_eq!(image_content_type("scan.png"), Some("image/png"));
        assert_eq!(image_content_type("notes.txt"), None);
        assert_eq!(image_content_type("noext"), None);
    }

    #[test]
    fn test_history_limit_and_id() {
        assert!(validate_history_limit(1).is_ok());
        assert!(validate_history_limit(500).is_ok());
        assert!(validate_history_limit(501).is_err());

        assert_eq!(validate_history_scan_type(" Barcode").unwrap(), "barcode");
        assert!(validate_history_scan_type("general").is_err());

        assert_eq!(parse_analysis_id(" 42 ").unwrap(), 42);
        assert!(parse_analysis_id("-1").is_err());
        assert!(parse_analysis_id("x").is_err());
    }
}
