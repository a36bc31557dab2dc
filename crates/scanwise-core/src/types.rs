//! # Domain Types
//!
//! Types exchanged with the Scanwise analysis service.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌─────────────────┐     │
//! │  │ AnalysisRecord   │   │ ProductSummary   │   │  SafetyLevel    │     │
//! │  │ ──────────────── │   │ ──────────────── │   │ ─────────────── │     │
//! │  │ id               │──►│ barcode          │   │ HIGH_RISK       │     │
//! │  │ safety_level     │   │ name / brand     │   │ MODERATE_RISK   │     │
//! │  │ risk_score       │   │ ingredients      │   │ LOW_RISK        │     │
//! │  │ health_impact    │   │ nutrition_facts  │   │ GOOD_TO_GO      │     │
//! │  └──────────────────┘   └──────────────────┘   └─────────────────┘     │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌─────────────────┐     │
//! │  │ UnidentifiedScan │   │   ScanStats      │   │ BatchScanReport │     │
//! │  │ text extracted,  │   │ totals, top      │   │ results +       │     │
//! │  │ no product match │   │ products, levels │   │ per-code errors │     │
//! │  └──────────────────┘   └──────────────────┘   └─────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lenient Lists
//! The service builds most list fields from model output, so an entry may be
//! a plain string or an object such as `{"name": "E621", "reason": "..."}`.
//! Both decode to one display line. `null` decodes to an empty list.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::error::CoreError;

// =============================================================================
// Safety Level
// =============================================================================

/// Overall verdict of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyLevel {
    HighRisk,
    ModerateRisk,
    LowRisk,
    GoodToGo,
}

impl SafetyLevel {
    /// Wire code, e.g. `HIGH_RISK`.
    pub const fn code(&self) -> &'static str {
        match self {
            SafetyLevel::HighRisk => "HIGH_RISK",
            SafetyLevel::ModerateRisk => "MODERATE_RISK",
            SafetyLevel::LowRisk => "LOW_RISK",
            SafetyLevel::GoodToGo => "GOOD_TO_GO",
        }
    }

    /// Label shown to the user.
    pub const fn label(&self) -> &'static str {
        match self {
            SafetyLevel::HighRisk => "High Risk - Avoid",
            SafetyLevel::ModerateRisk => "Moderate Risk - Consume with Caution",
            SafetyLevel::LowRisk => "Low Risk - Generally Safe",
            SafetyLevel::GoodToGo => "Good to Go - Recommended",
        }
    }

    /// True for the two levels that warrant a warning.
    pub const fn is_concerning(&self) -> bool {
        matches!(self, SafetyLevel::HighRisk | SafetyLevel::ModerateRisk)
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SafetyLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "HIGH_RISK" => Ok(SafetyLevel::HighRisk),
            "MODERATE_RISK" => Ok(SafetyLevel::ModerateRisk),
            "LOW_RISK" => Ok(SafetyLevel::LowRisk),
            "GOOD_TO_GO" => Ok(SafetyLevel::GoodToGo),
            _ => Err(CoreError::UnknownSafetyLevel(s.to_string())),
        }
    }
}

// =============================================================================
// Image Scan Type
// =============================================================================

/// What a label photo contains; selects the extraction the service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ImageScanType {
    Ingredients,
    Nutrition,
    #[default]
    General,
}

impl ImageScanType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ImageScanType::Ingredients => "ingredients",
            ImageScanType::Nutrition => "nutrition",
            ImageScanType::General => "general",
        }
    }
}

impl fmt::Display for ImageScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageScanType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ingredients" | "ingredient" => Ok(ImageScanType::Ingredients),
            "nutrition" => Ok(ImageScanType::Nutrition),
            "general" => Ok(ImageScanType::General),
            _ => Err(CoreError::UnknownScanType(s.to_string())),
        }
    }
}

// =============================================================================
// Product Summary
// =============================================================================

/// The product an analysis refers to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSummary {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub barcode: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub ingredients: Vec<String>,
    /// Per-100g nutrition values, keyed by nutrient name.
    #[serde(default, deserialize_with = "lenient::map")]
    #[ts(type = "Record<string, unknown>")]
    pub nutrition_facts: BTreeMap<String, Value>,
    #[serde(default)]
    pub serving_size: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub additives: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub preservatives: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub artificial_colors: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub artificial_flavors: Vec<String>,
    #[serde(default)]
    pub country_of_origin: Option<String>,
    #[serde(default)]
    pub halal_certified: bool,
    #[serde(default)]
    pub organic_certified: bool,
    #[serde(default)]
    pub product_image: Option<String>,
}

impl ProductSummary {
    /// "Brand Name", or whichever of the two is present.
    pub fn display_name(&self) -> String {
        match (self.brand.trim(), self.name.trim()) {
            ("", "") => self.barcode.clone(),
            ("", name) => name.to_string(),
            (brand, "") => brand.to_string(),
            (brand, name) => format!("{brand} {name}"),
        }
    }

    /// Nutrition facts rendered as `name: value` lines.
    pub fn nutrition_lines(&self) -> Vec<String> {
        self.nutrition_facts
            .iter()
            .filter_map(|(name, value)| {
                lenient::text(value).map(|v| format!("{}: {}", humanize_key(name), v))
            })
            .collect()
    }
}

// =============================================================================
// Health Impact
// =============================================================================

/// Immediate and long-term effects of consuming the product.
///
/// The service stores this as free-form JSON. Recognised shapes:
/// - `{"immediate": [...], "long_term": [...]}` (also `*_effects` and
///   `short_term` spellings, plus an optional `summary`)
/// - a bare string or list, read as immediate effects
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct HealthImpact {
    pub summary: Option<String>,
    pub immediate: Vec<String>,
    pub long_term: Vec<String>,
}

const IMMEDIATE_KEYS: [&str; 4] = [
    "immediate",
    "immediate_effects",
    "short_term",
    "short_term_effects",
];
const LONG_TERM_KEYS: [&str; 3] = ["long_term", "long_term_effects", "longterm"];
const SUMMARY_KEYS: [&str; 3] = ["summary", "overview", "overall"];

impl HealthImpact {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.immediate.is_empty() && self.long_term.is_empty()
    }

    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                let pick = |keys: &[&str]| -> Vec<String> {
                    keys.iter()
                        .filter_map(|k| map.get(*k))
                        .flat_map(lenient::lines)
                        .collect()
                };
                let summary = SUMMARY_KEYS
                    .iter()
                    .filter_map(|k| map.get(*k))
                    .find_map(lenient::text);
                HealthImpact {
                    summary,
                    immediate: pick(&IMMEDIATE_KEYS),
                    long_term: pick(&LONG_TERM_KEYS),
                }
            }
            other => HealthImpact {
                summary: None,
                immediate: lenient::lines(&other),
                long_term: Vec::new(),
            },
        }
    }
}

impl<'de> Deserialize<'de> for HealthImpact {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(HealthImpact::from_value(Value::deserialize(deserializer)?))
    }
}

// =============================================================================
// Analysis Record
// =============================================================================

/// Structured health-risk result returned by the analysis service.
///
/// Immutable once received: the client only renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnalysisRecord {
    pub id: i64,
    pub product: ProductSummary,
    pub safety_level: SafetyLevel,
    /// 0 (safe) to 100 (avoid).
    pub risk_score: f64,
    #[serde(default)]
    pub health_impact: HealthImpact,
    #[serde(default, deserialize_with = "lenient::list")]
    pub specific_concerns: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub alternatives: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub harmful_additives: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub preservative_concerns: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub health_benefits: Vec<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub nutritional_highlights: Vec<String>,
    #[serde(default = "default_model")]
    pub ai_model_used: String,
    #[serde(default = "default_prompt_version")]
    pub prompt_version: String,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_model() -> String {
    "gemini-pro".to_string()
}

fn default_prompt_version() -> String {
    "1.0".to_string()
}

impl AnalysisRecord {
    /// Risk score clamped to the documented 0-100 range.
    pub fn risk_score_clamped(&self) -> f64 {
        self.risk_score.clamp(0.0, 100.0)
    }

    /// One-line summary, e.g. `Acme Cola: High Risk - Avoid (82/100)`.
    pub fn headline(&self) -> String {
        format!(
            "{}: {} ({:.0}/100)",
            self.product.display_name(),
            self.safety_level.label(),
            self.risk_score_clamped()
        )
    }
}

// =============================================================================
// Image Scan Outcome
// =============================================================================

/// Image scan where text was extracted but no product was identified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnidentifiedScan {
    pub message: String,
    #[serde(default)]
    #[ts(type = "unknown")]
    pub extracted_data: Value,
    #[serde(default)]
    pub scan_session_id: Option<i64>,
}

impl UnidentifiedScan {
    /// The OCR text the service extracted, if it reported any.
    pub fn extracted_text(&self) -> Option<&str> {
        self.extracted_data
            .get("text")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Result of submitting a label photo.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ImageScanOutcome {
    /// A product was identified and analysed (HTTP 201).
    Analysed(AnalysisRecord),
    /// Text was read but matched no product (HTTP 200).
    Unidentified(UnidentifiedScan),
}

// =============================================================================
// Statistics
// =============================================================================

/// A product the user scans often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScannedProduct {
    #[serde(default, deserialize_with = "lenient::object_or_none")]
    pub product: Option<ProductSummary>,
    #[serde(default = "one")]
    pub scan_count: u32,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub last_scanned: Option<DateTime<Utc>>,
    #[serde(default)]
    pub favorite: bool,
}

fn one() -> u32 {
    1
}

/// Count of analyses at one safety level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SafetyCount {
    pub safety_level: SafetyLevel,
    pub count: u64,
}

/// Per-user scanning statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanStats {
    #[serde(default)]
    pub total_scans: u64,
    /// Scans in the last 30 days.
    #[serde(default)]
    pub recent_scans: u64,
    #[serde(default)]
    pub most_scanned_products: Vec<ScannedProduct>,
    #[serde(default)]
    pub safety_distribution: Vec<SafetyCount>,
}

impl ScanStats {
    pub fn count_for(&self, level: SafetyLevel) -> u64 {
        self.safety_distribution
            .iter()
            .filter(|c| c.safety_level == level)
            .map(|c| c.count)
            .sum()
    }
}

// =============================================================================
// Batch Scan
// =============================================================================

/// A barcode from a batch that could not be analysed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchScanError {
    pub barcode: String,
    pub error: String,
}

/// Outcome of a batch barcode submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchScanReport {
    #[serde(default)]
    pub results: Vec<AnalysisRecord>,
    #[serde(default)]
    pub errors: Vec<BatchScanError>,
    #[serde(default)]
    pub processed: u32,
    #[serde(default)]
    pub failed: u32,
}

// =============================================================================
// Helpers
// =============================================================================

/// `trans_fat_g` -> `Trans fat g`.
pub fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Deserializers that accept the loose shapes the service emits.
pub(crate) mod lenient {
    use super::*;

    /// Renders one JSON value as display text. `None` for null or blank.
    pub fn text(value: &Value) -> Option<String> {
        let rendered = match value {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            Value::Bool(true) => "yes".to_string(),
            Value::Bool(false) => "no".to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(text)
                .collect::<Vec<_>>()
                .join(", "),
            Value::Object(map) => object_text(map),
        };
        (!rendered.is_empty()).then_some(rendered)
    }

    fn object_text(map: &serde_json::Map<String, Value>) -> String {
        let head = ["name", "title", "additive", "product", "concern"]
            .iter()
            .find_map(|k| map.get(*k).and_then(text));
        let detail = ["reason", "description", "details", "effect", "impact"]
            .iter()
            .find_map(|k| map.get(*k).and_then(text));

        match (head, detail) {
            (Some(h), Some(d)) => format!("{h} - {d}"),
            (Some(h), None) => h,
            (None, Some(d)) => d,
            (None, None) => map
                .iter()
                .filter_map(|(k, v)| text(v).map(|v| format!("{}: {}", humanize_key(k), v)))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// Splits a value into display lines: one per array element.
    pub fn lines(value: &Value) -> Vec<String> {
        match value {
            Value::Array(items) => items.iter().filter_map(text).collect(),
            other => text(other).into_iter().collect(),
        }
    }

    pub fn list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(lines(&Value::deserialize(deserializer)?))
    }

    pub fn map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            _ => Ok(BTreeMap::new()),
        }
    }

    pub fn object_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        match Value::deserialize(deserializer)? {
            value @ Value::Object(_) => {
                serde_json::from_value(value).map(Some).map_err(serde::de::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
