//! # Scanwise Client
//!
//! Talks to the Scanwise analysis service and turns scanner output into
//! analysis results.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          scanwise-client                                │
//! │                                                                         │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐     │
//! │  │   flow     │──►│    api     │──►│   auth     │   │  config    │     │
//! │  │ ScanFlow   │   │ Analysis   │   │ AuthContext│   │ ClientCfg  │     │
//! │  └─────┬──────┘   │ Client     │   └────────────┘   └────────────┘     │
//! │        │          └────────────┘                                       │
//! │        ▼                                                                │
//! │  ┌────────────┐   ┌────────────┐                                       │
//! │  │  notify    │   │   error    │                                       │
//! │  │ Notifier   │   │ ClientError│                                       │
//! │  └────────────┘   └────────────┘                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use scanwise_client::{AnalysisClient, AuthContext, ClientConfig, ScanFlow, TracingNotifier};
//!
//! # async fn run() -> scanwise_client::ClientResult<()> {
//! let config = ClientConfig::load(None)?;
//! let auth = AuthContext::from_optional(config.token());
//! let client = AnalysisClient::new(&config, auth)?;
//!
//! let mut flow = ScanFlow::new(client, Arc::new(TracingNotifier));
//! let record = flow.submit_barcode("5012345678900").await?;
//! println!("{}", record.headline());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod flow;
pub mod notify;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AnalysisClient, HistoryQuery, ImageUpload};
pub use auth::{AuthContext, TokenInfo};
pub use config::{ApiSettings, AuthSettings, ClientConfig, HistorySettings, CONFIG_FILE_NAME};
pub use error::{ClientError, ClientResult};
pub use flow::{FlowState, ScanFlow};
pub use notify::{Notifier, Toast, ToastLevel, ToastLog, TracingNotifier};
