//! Argument parsing with the clap derive API.
//!
//! Purely declarative: no I/O happens here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use scanwise_core::{ImageScanType, ResultTab};

/// Scanwise: scan food products and read their health analysis.
///
/// Use `scanwise <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "scanwise", version, about, long_about = None)]
pub struct Cli {
    /// Path to scanwise.toml (default: the platform config directory).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `scanwise_client=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Which result tab to show for an analysis.
    #[arg(long, global = true, value_enum, default_value = "overview")]
    pub tab: TabChoice,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Result tab selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TabChoice {
    Overview,
    Health,
    LongTerm,
    Ingredients,
    /// Every tab, in order.
    All,
}

impl TabChoice {
    pub fn tabs(self) -> Vec<ResultTab> {
        match self {
            TabChoice::Overview => vec![ResultTab::Overview],
            TabChoice::Health => vec![ResultTab::HealthImpact],
            TabChoice::LongTerm => vec![ResultTab::LongTermEffects],
            TabChoice::Ingredients => vec![ResultTab::Ingredients],
            TabChoice::All => ResultTab::ALL.to_vec(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read barcodes from a handheld scanner on stdin and analyse them.
    Scan(ScanArgs),

    /// Analyse a barcode typed by hand.
    Barcode {
        /// EAN-8, UPC-A, EAN-13 or EAN-14; spaces and hyphens are ignored.
        code: String,
    },

    /// Upload a label photo for analysis.
    Image(ImageArgs),

    /// Show a previous analysis.
    Analysis {
        /// Analysis id.
        id: String,
    },

    /// List previous analyses.
    History(HistoryArgs),

    /// Show scan statistics.
    Stats,

    /// Analyse several barcodes in one request.
    Batch {
        /// Up to 20 barcodes.
        #[arg(required = true, num_args = 1..)]
        barcodes: Vec<String>,
    },

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- scan ----

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Keep scanning after each result until input ends.
    #[arg(short = 'C', long)]
    pub continuous: bool,
}

// ---- image ----

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Photo of the label (jpg, png, webp, gif, bmp, heic).
    pub path: PathBuf,

    /// What the label shows: ingredients, nutrition or general.
    #[arg(long, default_value = "general")]
    pub scan_type: ImageScanType,
}

// ---- history ----

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Number of entries (default from config).
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Filter: barcode, ingredient, nutrition or manual.
    #[arg(long)]
    pub scan_type: Option<String>,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file + environment + defaults).
    Show,
    /// Write a default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}
