//! # Decode Configuration
//!
//! Every session decodes with the same configuration: retail and logistics
//! 1D symbologies, rear camera, 640x480 capture.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Symbology
// =============================================================================

/// Barcode symbologies a decoder may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Code128,
    Ean13,
    Ean8,
    Code39,
}

impl Symbology {
    /// Best guess at the symbology that produced a text payload.
    ///
    /// Handheld scanners type the payload without saying what they read.
    /// 12-digit UPC-A payloads are reported as EAN-13, the set UPC-A
    /// belongs to. Returns `None` for text no supported symbology can carry.
    pub fn infer(payload: &str) -> Option<Symbology> {
        let all_digits = !payload.is_empty() && payload.bytes().all(|b| b.is_ascii_digit());

        if all_digits {
            match payload.len() {
                8 => return Some(Symbology::Ean8),
                12 | 13 => return Some(Symbology::Ean13),
                _ => {}
            }
        }

        if payload.bytes().all(is_code39_byte) {
            Some(Symbology::Code39)
        } else if payload.is_ascii() {
            Some(Symbology::Code128)
        } else {
            None
        }
    }
}

fn is_code39_byte(b: u8) -> bool {
    b.is_ascii_uppercase() || b.is_ascii_digit() || b" -.$/+%".contains(&b)
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbology::Code128 => write!(f, "CODE_128"),
            Symbology::Ean13 => write!(f, "EAN_13"),
            Symbology::Ean8 => write!(f, "EAN_8"),
            Symbology::Code39 => write!(f, "CODE_39"),
        }
    }
}

// =============================================================================
// Camera
// =============================================================================

/// Which camera to open on devices with more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraFacing {
    /// Rear camera.
    Environment,
    /// Front camera.
    User,
}

/// Capture resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// =============================================================================
// Decode Config
// =============================================================================

/// Parameters handed to [`Decoder::init`](crate::Decoder::init).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeConfig {
    pub symbologies: Vec<Symbology>,
    pub facing: CameraFacing,
    pub resolution: Resolution,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            symbologies: vec![
                Symbology::Code128,
                Symbology::Ean13,
                Symbology::Ean8,
                Symbology::Code39,
            ],
            facing: CameraFacing::Environment,
            resolution: Resolution {
                width: 640,
                height: 480,
            },
        }
    }
}

impl DecodeConfig {
    /// Returns true if events of this symbology should be reported.
    pub fn accepts(&self, symbology: Symbology) -> bool {
        self.symbologies.contains(&symbology)
    }
}
