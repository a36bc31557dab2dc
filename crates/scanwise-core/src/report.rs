//! # Result Tabs
//!
//! An analysis record is presented across four tabs. Each tab is a title
//! plus ordered sections of display lines; a section with nothing to show
//! is left out entirely.
//!
//! ```text
//! ┌──────────┬───────────────┬───────────────────┬─────────────┐
//! │ Overview │ Health Impact │ Long-term Effects │ Ingredients │
//! ├──────────┴───────────────┴───────────────────┴─────────────┤
//! │ Verdict                                                    │
//! │   Moderate Risk - Consume with Caution                     │
//! │   Risk score: 62/100                                       │
//! │ Key concerns                                               │
//! │   ...                                                      │
//! └────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::types::AnalysisRecord;

// =============================================================================
// Result Tab
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ResultTab {
    Overview,
    HealthImpact,
    LongTermEffects,
    Ingredients,
}

impl ResultTab {
    /// All tabs in display order.
    pub const ALL: [ResultTab; 4] = [
        ResultTab::Overview,
        ResultTab::HealthImpact,
        ResultTab::LongTermEffects,
        ResultTab::Ingredients,
    ];

    pub const fn title(&self) -> &'static str {
        match self {
            ResultTab::Overview => "Overview",
            ResultTab::HealthImpact => "Health Impact",
            ResultTab::LongTermEffects => "Long-term Effects",
            ResultTab::Ingredients => "Ingredients",
        }
    }
}

impl fmt::Display for ResultTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for ResultTab {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "overview" => Ok(ResultTab::Overview),
            "health" | "health-impact" => Ok(ResultTab::HealthImpact),
            "long-term" | "long-term-effects" | "longterm" => Ok(ResultTab::LongTermEffects),
            "ingredients" => Ok(ResultTab::Ingredients),
            _ => Err(CoreError::UnknownTab(s.to_string())),
        }
    }
}

// =============================================================================
// Tab View
// =============================================================================

/// A headed group of lines inside a tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TabSection {
    pub heading: String,
    pub lines: Vec<String>,
}

/// One rendered tab of an analysis record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TabView {
    pub tab: ResultTab,
    pub title: String,
    pub sections: Vec<TabSection>,
}

impl TabView {
    fn new(tab: ResultTab) -> Self {
        TabView {
            tab,
            title: tab.title().to_string(),
            sections: Vec::new(),
        }
    }

    /// Appends a section unless `lines` is empty.
    fn section<I, S>(mut self, heading: &str, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines
            .into_iter()
            .map(Into::into)
            .filter(|l: &String| !l.trim().is_empty())
            .collect();
        if !lines.is_empty() {
            self.sections.push(TabSection {
                heading: heading.to_string(),
                lines,
            });
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, heading: &str) -> Option<&TabSection> {
        self.sections.iter().find(|s| s.heading == heading)
    }
}

// =============================================================================
// Composition
// =============================================================================

impl AnalysisRecord {
    /// Builds the view for one result tab.
    pub fn tab(&self, tab: ResultTab) -> TabView {
        let view = TabView::new(tab);
        match tab {
            ResultTab::Overview => view
                .section(
                    "Verdict",
                    [
                        self.safety_level.label().to_string(),
                        format!("Risk score: {:.0}/100", self.risk_score_clamped()),
                    ],
                )
                .section("Summary", self.health_impact.summary.clone())
                .section("Key concerns", self.specific_concerns.iter().cloned())
                .section("Recommendations", self.recommendations.iter().cloned())
                .section("Alternatives", self.alternatives.iter().cloned()),

            ResultTab::HealthImpact => view
                .section("Immediate effects", self.health_impact.immediate.iter().cloned())
                .section("Harmful additives", self.harmful_additives.iter().cloned())
                .section("Health benefits", self.health_benefits.iter().cloned()),

            ResultTab::LongTermEffects => view
                .section("Long-term effects", self.health_impact.long_term.iter().cloned())
                .section("Preservative concerns", self.preservative_concerns.iter().cloned()),

            ResultTab::Ingredients => {
                let product = &self.product;
                let mut certifications = Vec::new();
                if product.halal_certified {
                    certifications.push("Halal certified");
                }
                if product.organic_certified {
                    certifications.push("Organic certified");
                }
                view.section("Ingredients", product.ingredients.iter().cloned())
                    .section("Additives", product.additives.iter().cloned())
                    .section("Preservatives", product.preservatives.iter().cloned())
                    .section("Artificial colors", product.artificial_colors.iter().cloned())
                    .section("Artificial flavors", product.artificial_flavors.iter().cloned())
                    .section("Nutrition facts", product.nutrition_lines())
                    .section("Nutritional highlights", self.nutritional_highlights.iter().cloned())
                    .section("Certifications", certifications)
            }
        }
    }

    /// All four tabs in display order.
    pub fn tabs(&self) -> Vec<TabView> {
        ResultTab::ALL.iter().map(|t| self.tab(*t)).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
