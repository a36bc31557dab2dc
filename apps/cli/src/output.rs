//! Output formatting for text vs JSON rendering.
//!
//! Every subcommand result flows through [`OutputWriter`], so handlers never
//! branch on the output format themselves.

use std::io::Write;

use scanwise_client::{ClientConfig, Notifier, Toast, ToastLevel};
use scanwise_core::{AnalysisRecord, BatchScanReport, ScanStats, TabView, UnidentifiedScan};
use serde::Serialize;

use crate::cli::{OutputFormat, TabChoice};
use crate::error::CliError;

/// Writes payloads to stdout in the selected format.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Renders `payload` to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => payload.render_text(w)?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable rendering, alongside `Serialize` for JSON.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

// =============================================================================
// Analysis
// =============================================================================

/// One analysis with the selected result tabs.
#[derive(Serialize)]
pub struct AnalysisView<'a> {
    pub record: &'a AnalysisRecord,
    pub tabs: Vec<TabView>,
}

impl<'a> AnalysisView<'a> {
    pub fn new(record: &'a AnalysisRecord, choice: TabChoice) -> Self {
        let tabs = choice.tabs().into_iter().map(|t| record.tab(t)).collect();
        Self { record, tabs }
    }
}

impl Render for AnalysisView<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let product = &self.record.product;
        writeln!(w, "Analysis #{}  {}", self.record.id, self.record.headline())?;
        writeln!(w, "Product:  {}", product.display_name())?;
        if !product.barcode.is_empty() {
            writeln!(w, "Barcode:  {}", product.barcode)?;
        }
        if let Some(at) = self.record.created_at {
            writeln!(w, "Scanned:  {}", at.format("%Y-%m-%d %H:%M UTC"))?;
        }

        for view in &self.tabs {
            render_tab(view, w)?;
        }
        Ok(())
    }
}

fn render_tab(view: &TabView, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w)?;
    writeln!(w, "== {} ==", view.title)?;
    if view.is_empty() {
        writeln!(w, "  (nothing reported)")?;
        return Ok(());
    }
    for section in &view.sections {
        writeln!(w, "{}:", section.heading)?;
        for line in &section.lines {
            writeln!(w, "  - {line}")?;
        }
    }
    Ok(())
}

impl Render for UnidentifiedScan {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{}", self.message)?;
        if let Some(text) = self.extracted_text() {
            writeln!(w)?;
            writeln!(w, "Text read from the label:")?;
            for line in text.lines() {
                writeln!(w, "  {line}")?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// History, Stats, Batch
// =============================================================================

/// History listing.
#[derive(Serialize)]
#[serde(transparent)]
pub struct HistoryView(pub Vec<AnalysisRecord>);

impl Render for HistoryView {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.0.is_empty() {
            return writeln!(w, "No analyses yet.");
        }
        writeln!(
            w,
            "{:<8} {:<14} {:>5}  {:<17} PRODUCT",
            "ID", "VERDICT", "RISK", "SCANNED"
        )?;
        writeln!(w, "{}", "-".repeat(72))?;
        for record in &self.0 {
            let scanned = record
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                w,
                "{:<8} {:<14} {:>5.0}  {:<17} {}",
                record.id,
                record.safety_level.code(),
                record.risk_score_clamped(),
                scanned,
                record.product.display_name()
            )?;
        }
        Ok(())
    }
}

impl Render for ScanStats {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Total scans:       {}", self.total_scans)?;
        writeln!(w, "Last 30 days:      {}", self.recent_scans)?;

        if !self.safety_distribution.is_empty() {
            writeln!(w)?;
            writeln!(w, "By verdict:")?;
            for entry in &self.safety_distribution {
                writeln!(w, "  {:<14} {:>5}  {}", entry.safety_level.code(), entry.count, entry.safety_level.label())?;
            }
        }

        if !self.most_scanned_products.is_empty() {
            writeln!(w)?;
            writeln!(w, "Most scanned:")?;
            for item in &self.most_scanned_products {
                let name = item
                    .product
                    .as_ref()
                    .map(|p| p.display_name())
                    .unwrap_or_else(|| "(unknown product)".to_string());
                writeln!(w, "  {:>4}x  {}", item.scan_count, name)?;
            }
        }
        Ok(())
    }
}

impl Render for BatchScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Processed: {}  Failed: {}", self.processed, self.failed)?;
        for record in &self.results {
            writeln!(w, "  ok    {:<14} {}", record.product.barcode, record.headline())?;
        }
        for err in &self.errors {
            writeln!(w, "  fail  {:<14} {}", err.barcode, err.error)?;
        }
        Ok(())
    }
}

// =============================================================================
// Config
// =============================================================================

/// Effective configuration, token redacted.
#[derive(Serialize)]
pub struct ConfigView {
    pub path: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub history_limit: u32,
    pub token: Option<&'static str>,
}

impl ConfigView {
    pub fn new(config: &ClientConfig, path: Option<String>) -> Self {
        Self {
            path,
            base_url: config.api.base_url.clone(),
            timeout_secs: config.api.timeout_secs,
            connect_timeout_secs: config.api.connect_timeout_secs,
            history_limit: config.history.limit,
            token: config.token().map(|_| "********"),
        }
    }
}

impl Render for ConfigView {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Config file:      {}", self.path.as_deref().unwrap_or("(none)"))?;
        writeln!(w, "API URL:          {}", self.base_url)?;
        writeln!(w, "Timeout:          {}s", self.timeout_secs)?;
        writeln!(w, "Connect timeout:  {}s", self.connect_timeout_secs)?;
        writeln!(w, "History limit:    {}", self.history_limit)?;
        writeln!(w, "Token:            {}", self.token.unwrap_or("(not set)"))?;
        Ok(())
    }
}

/// Result of `config init`.
#[derive(Serialize)]
pub struct ConfigWritten {
    pub path: String,
}

impl Render for ConfigWritten {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Wrote default config to {}", self.path)
    }
}

// =============================================================================
// Toasts
// =============================================================================

/// Prints toasts to stderr so stdout stays machine-readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, toast: Toast) {
        let mark = match toast.level {
            ToastLevel::Success => "ok",
            ToastLevel::Info => "info",
            ToastLevel::Error => "error",
        };
        eprintln!("[{mark}] {}", toast.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwise_core::BatchScanError;

    fn record() -> AnalysisRecord {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "product": {"barcode": "5012345678900", "name": "Cola", "brand": "Acme"},
            "safety_level": "HIGH_RISK",
            "risk_score": 82,
            "health_impact": {"immediate": ["Sugar spike"], "long_term": ["Tooth decay"]},
            "specific_concerns": ["High sugar"],
            "created_at": "2025-03-01T10:15:00Z"
        }))
        .unwrap()
    }

    fn text_of<T: Render>(payload: &T) -> String {
        let mut buf = Vec::new();
        payload.render_text(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_analysis_overview_text() {
        let record = record();
        let text = text_of(&AnalysisView::new(&record, TabChoice::Overview));

        assert!(text.contains("Analysis #7"));
        assert!(text.contains("Product:  Acme Cola"));
        assert!(text.contains("== Overview =="));
        assert!(text.contains("  - High sugar"));
        assert!(!text.contains("== Ingredients =="));
    }

    #[test]
    fn test_analysis_all_tabs_json() {
        let record = record();
        let writer = OutputWriter::new(OutputFormat::Json);
        let mut buf = Vec::new();
        writer
            .render_to(&AnalysisView::new(&record, TabChoice::All), &mut buf)
            .unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed["record"]["id"], 7);
        assert_eq!(parsed["tabs"].as_array().unwrap().len(), 4);
        assert_eq!(parsed["tabs"][2]["tab"], "long_term_effects");
    }

    #[test]
    fn test_history_table() {
        assert_eq!(text_of(&HistoryView(vec![])), "No analyses yet.\n");

        let text = text_of(&HistoryView(vec![record()]));
        assert!(text.contains("HIGH_RISK"));
        assert!(text.contains("2025-03-01 10:15"));
        assert!(text.lines().nth(2).unwrap().starts_with("7 "));
    }

    #[test]
    fn test_batch_text() {
        let report = BatchScanReport {
            results: vec![record()],
            errors: vec![BatchScanError {
                barcode: "00000000".into(),
                error: "Product not found".into(),
            }],
            processed: 1,
            failed: 1,
        };
        let text = text_of(&report);
        assert!(text.starts_with("Processed: 1  Failed: 1"));
        assert!(text.contains("fail  00000000"));
    }

    #[test]
    fn test_config_view_redacts_token() {
        let mut config = ClientConfig::default();
        config.auth.token = Some("secret-token".into());
        let view = ConfigView::new(&config, None);

        let text = text_of(&view);
        assert!(!text.contains("secret-token"));
        assert!(text.contains("********"));
        assert!(serde_json::to_string(&view).unwrap().contains("********"));
    }

    #[test]
    fn test_unidentified_text() {
        let scan = UnidentifiedScan {
            message: "Could not identify product".into(),
            extracted_data: serde_json::json!({"text": "sugar\nsalt"}),
            scan_session_id: None,
        };
        let text = text_of(&scan);
        assert!(text.contains("  sugar\n  salt\n"));
    }
}
