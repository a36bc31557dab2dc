//! # Analysis Client
//!
//! HTTP client for the Scanwise analysis service.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Method  Path                        Body / Query        Response       │
//! │  ──────  ──────────────────────────  ──────────────────  ─────────────  │
//! │  POST    scan/barcode/               {"barcode"}         201 record     │
//! │  POST    scan/image/                 multipart image +   201 record     │
//! │                                      scan_type           200 unidentif. │
//! │  GET     scan/analysis/{id}/                             200 record     │
//! │  GET     scan/history/               ?limit&scan_type    200 [record]   │
//! │  GET     scan/stats/                                     200 stats      │
//! │  POST    scan/batch_scan/            {"barcodes": [..]}  200 report     │
//! │                                                                         │
//! │  Non-2xx: {"error": "..."} or {"detail": "..."} -> ScanFailed           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request carries `Authorization: Bearer <token>` from the
//! [`AuthContext`]. Inputs are validated before the request is built.
//! Nothing is retried.

use std::path::Path;
use std::time::Instant;

use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use scanwise_core::validation::{
    image_content_type, validate_barcode, validate_batch, validate_history_limit,
    validate_history_scan_type, validate_image_upload,
};
use scanwise_core::{
    AnalysisRecord, BatchScanReport, ImageScanOutcome, ImageScanType, ScanStats,
    UnidentifiedScan, ValidationError,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::AuthContext;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

const USER_AGENT: &str = concat!("scanwise/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Request Types
// =============================================================================

/// A label photo ready for upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Reads a photo from disk, taking the content type from its extension.
    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        let content_type = image_content_type(&file_name).ok_or_else(|| {
            ValidationError::InvalidFormat {
                field: "image".to_string(),
                reason: format!("unsupported file type: {file_name}"),
            }
        })?;

        let bytes = tokio::fs::read(path).await.map_err(|e| ClientError::ReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self::new(file_name, content_type, bytes))
    }
}

/// Filters for the history endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Page size; the configured default when `None`.
    pub limit: Option<u32>,
    /// One of barcode, ingredient, nutrition, manual.
    pub scan_type: Option<String>,
}

#[derive(Serialize)]
struct BarcodeRequest<'a> {
    barcode: &'a str,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    barcodes: &'a [String],
}

/// Error body; the service uses `error`, framework errors use `detail`.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

/// History comes back as a list, or wrapped when the service paginates.
#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryBody {
    List(Vec<AnalysisRecord>),
    Page { results: Vec<AnalysisRecord> },
}

// =============================================================================
// Client
// =============================================================================

/// Client for the analysis service.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base: Url,
    auth: AuthContext,
    history_limit: u32,
}

impl AnalysisClient {
    /// Builds a client from validated configuration.
    pub fn new(config: &ClientConfig, auth: AuthContext) -> ClientResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base: config.base_url()?,
            auth,
            history_limit: config.history.limit,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base.join(path)?)
    }

    // =========================================================================
    // Endpoints
    // =========================================================================

    /// Submits a barcode for analysis.
    pub async fn scan_barcode(&self, barcode: &str) -> ClientResult<AnalysisRecord> {
        let barcode = validate_barcode(barcode)?;
        let token = self.auth.bearer().await?;

        let request = self
            .http
            .post(self.endpoint("scan/barcode/")?)
            .bearer_auth(token)
            .json(&BarcodeRequest { barcode: &barcode });

        let record: AnalysisRecord = self.send_json("scan/barcode/", request).await?;
        info!(
            analysis_id = record.id,
            safety_level = record.safety_level.code(),
            "Barcode analysed"
        );
        Ok(record)
    }

    /// Uploads a label photo for OCR and analysis.
    pub async fn scan_image(
        &self,
        image: ImageUpload,
        scan_type: ImageScanType,
    ) -> ClientResult<ImageScanOutcome> {
        validate_image_upload(image.bytes.len(), &image.content_type)?;
        let token = self.auth.bearer().await?;

        let size = image.bytes.len();
        let part = Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = Form::new()
            .part("image", part)
            .text("scan_type", scan_type.as_str());

        debug!(bytes = size, %scan_type, "Uploading label image");
        let request = self
            .http
            .post(self.endpoint("scan/image/")?)
            .bearer_auth(token)
            .multipart(form);

        let (status, body) = self.send("scan/image/", request).await?;
        if status == StatusCode::CREATED {
            let record: AnalysisRecord = decode(&body)?;
            info!(analysis_id = record.id, "Label image analysed");
            Ok(ImageScanOutcome::Analysed(record))
        } else {
            let scan: UnidentifiedScan = decode(&body)?;
            info!(scan_session_id = ?scan.scan_session_id, "Label read, product not identified");
            Ok(ImageScanOutcome::Unidentified(scan))
        }
    }

    /// Fetches one analysis by id.
    pub async fn analysis(&self, id: i64) -> ClientResult<AnalysisRecord> {
        let token = self.auth.bearer().await?;
        let path = format!("scan/analysis/{id}/");
        let request = self.http.get(self.endpoint(&path)?).bearer_auth(token);
        self.send_json(&path, request).await
    }

    /// Lists prior analyses, newest first.
    pub async fn history(&self, query: &HistoryQuery) -> ClientResult<Vec<AnalysisRecord>> {
        let limit = query.limit.unwrap_or(self.history_limit);
        validate_history_limit(limit)?;
        let scan_type = query
            .scan_type
            .as_deref()
            .map(validate_history_scan_type)
            .transpose()?;

        let token = self.auth.bearer().await?;
        let mut params = vec![("limit", limit.to_string())];
        if let Some(scan_type) = scan_type {
            params.push(("scan_type", scan_type));
        }

        let request = self
            .http
            .get(self.endpoint("scan/history/")?)
            .bearer_auth(token)
            .query(&params);

        let records = match self.send_json::<HistoryBody>("scan/history/", request).await? {
            HistoryBody::List(records) | HistoryBody::Page { results: records } => records,
        };
        debug!(count = records.len(), "History fetched");
        Ok(records)
    }

    /// Fetches the user's scan statistics.
    pub async fn stats(&self) -> ClientResult<ScanStats> {
        let token = self.auth.bearer().await?;
        let request = self.http.get(self.endpoint("scan/stats/")?).bearer_auth(token);
        self.send_json("scan/stats/", request).await
    }

    /// Submits up to 20 barcodes in one request.
    pub async fn batch_scan<S: AsRef<str>>(&self, barcodes: &[S]) -> ClientResult<BatchScanReport> {
        let barcodes = validate_batch(barcodes)?;
        let token = self.auth.bearer().await?;

        let request = self
            .http
            .post(self.endpoint("scan/batch_scan/")?)
            .bearer_auth(token)
            .json(&BatchRequest {
                barcodes: &barcodes,
            });

        let report: BatchScanReport = self.send_json("scan/batch_scan/", request).await?;
        info!(processed = report.processed, failed = report.failed, "Batch scan finished");
        Ok(report)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Sends a request; non-success statuses become [`ClientError::ScanFailed`].
    async fn send(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> ClientResult<(StatusCode, Vec<u8>)> {
        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "Analysis service unreachable");
            ClientError::from(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(
            endpoint,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis service responded"
        );

        if !status.is_success() {
            let message = failure_message(status, &body);
            warn!(endpoint, status = status.as_u16(), %message, "Analysis request rejected");
            return Err(ClientError::ScanFailed {
                status: status.as_u16(),
                message,
            });
        }

        Ok((status, body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> ClientResult<T> {
        let (_, body) = self.send(endpoint, request).await?;
        decode(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> ClientResult<T> {
    Ok(serde_json::from_slice(body)?)
}

fn failure_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.detail))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spawn_failing_service, spawn_service, UNKNOWN_BARCODE};
    use scanwise_core::SafetyLevel;

    fn client_for(base_url: &str, auth: AuthContext) -> AnalysisClient {
        let mut config = ClientConfig::default();
        config.api.base_url = base_url.to_string();
        AnalysisClient::new(&config, auth).unwrap()
    }

    fn signed_in(base_url: &str) -> AnalysisClient {
        client_for(base_url, AuthContext::with_token("test-token"))
    }

    #[tokio::test]
    async fn test_scan_barcode_success() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);

        let record = client.scan_barcode(" 5012345678900\n").await.unwrap();

        assert_eq!(record.safety_level, SafetyLevel::HighRisk);
        assert_eq!(record.product.barcode, "5012345678900");
        assert_eq!(record.recommendations, vec!["Choose water"]);

        let seen = service.seen.lock().unwrap();
        assert_eq!(seen.barcodes, vec!["5012345678900"]);
        assert_eq!(seen.authorization, vec!["Bearer test-token"]);
    }

    #[tokio::test]
    async fn test_unknown_product_surfaces_service_message() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);

        let err = client.scan_barcode(UNKNOWN_BARCODE).await.unwrap_err();

        match err {
            ClientError::ScanFailed { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Product not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_scan_failed() {
        let service = spawn_failing_service().await;
        let client = signed_in(&service.base_url);

        let err = client.scan_barcode("12345678").await.unwrap_err();

        assert!(err.is_upstream());
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("Analysis backend unavailable"));
    }

    #[tokio::test]
    async fn test_invalid_barcode_never_sent() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);

        let err = client.scan_barcode("  ").await.unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert!(service.seen.lock().unwrap().barcodes.is_empty());
    }

    #[tokio::test]
    async fn test_code39_and_code128_payloads_sent_as_scanned() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);

        let code39 = client.scan_barcode("ABCD-1234").await.unwrap();
        let code128 = client.scan_barcode("abc-123/x").await.unwrap();

        assert_eq!(code39.product.barcode, "ABCD-1234");
        assert_eq!(code128.product.barcode, "abc-123/x");
        assert_eq!(
            service.seen.lock().unwrap().barcodes,
            vec!["ABCD-1234", "abc-123/x"]
        );
    }

    #[tokio::test]
    async fn test_missing_token_never_sent() {
        let service = spawn_service().await;
        let client = client_for(&service.base_url, AuthContext::new());

        let err = client.stats().await.unwrap_err();

        assert!(matches!(err, ClientError::NotAuthenticated));
        assert!(service.seen.lock().unwrap().authorization.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_request_error() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = signed_in(&format!("http://{addr}/api"));
        let err = client.scan_barcode("12345678").await.unwrap_err();

        assert!(matches!(err, ClientError::Request(_)));
        assert_eq!(err.user_message(), "Scan failed. Please try again.");
    }

    #[tokio::test]
    async fn test_scan_image_identified() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);
        let upload = ImageUpload::new("label.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0]);

        let outcome = client.scan_image(upload, ImageScanType::Nutrition).await.unwrap();

        assert!(matches!(outcome, ImageScanOutcome::Analysed(ref r) if r.id == 2));
        let seen = service.seen.lock().unwrap();
        let (file_name, content_type, len, scan_type) = seen.image.clone().unwrap();
        assert_eq!(file_name, "label.jpg");
        assert_eq!(content_type, "image/jpeg");
        assert_eq!(len, 4);
        assert_eq!(scan_type, "nutrition");
    }

    #[tokio::test]
    async fn test_scan_image_unidentified() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);
        let upload = ImageUpload::new("label.png", "image/png", vec![1, 2, 3]);

        let outcome = client.scan_image(upload, ImageScanType::General).await.unwrap();

        match outcome {
            ImageScanOutcome::Unidentified(scan) => {
                assert_eq!(scan.extracted_text(), Some("sugar, salt"));
                assert_eq!(scan.scan_session_id, Some(11));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scan_image_rejects_non_image() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);
        let upload = ImageUpload::new("notes.pdf", "application/pdf", vec![1]);

        let err = client.scan_image(upload, ImageScanType::General).await.unwrap_err();

        assert!(matches!(err, ClientError::Validation(_)));
        assert!(service.seen.lock().unwrap().image.is_none());
    }

    #[tokio::test]
    async fn test_image_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("label.PNG");
        std::fs::write(&path, [137, 80, 78, 71]).unwrap();

        let upload = ImageUpload::from_path(&path).await.unwrap();
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.bytes.len(), 4);

        let missing = ImageUpload::from_path(&dir.path().join("gone.jpg")).await;
        assert!(matches!(missing, Err(ClientError::ReadFailed { .. })));

        let wrong = ImageUpload::from_path(&dir.path().join("notes.txt")).await;
        assert!(matches!(wrong, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_analysis_by_id() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);

        assert_eq!(client.analysis(77).await.unwrap().id, 77);

        let err = client.analysis(404).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(err.to_string().contains("Not found."));
    }

    #[tokio::test]
    async fn test_history_uses_default_limit() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);

        let records = client.history(&HistoryQuery::default()).await.unwrap();

        assert_eq!(records.len(), 2);
        let query = service.seen.lock().unwrap().history_query.clone().unwrap();
        assert_eq!(query.get("limit").map(String::as_str), Some("50"));
        assert!(!query.contains_key("scan_type"));
    }

    #[tokio::test]
    async fn test_history_filters_and_pagination() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);

        let records = client
            .history(&HistoryQuery {
                limit: Some(5),
                scan_type: Some("Manual".into()),
            })
            .await
            .unwrap();

        assert_eq!(records.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 4]);
        let query = service.seen.lock().unwrap().history_query.clone().unwrap();
        assert_eq!(query.get("limit").map(String::as_str), Some("5"));
        assert_eq!(query.get("scan_type").map(String::as_str), Some("manual"));

        let err = client
            .history(&HistoryQuery {
                limit: Some(0),
                scan_type: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_stats() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);

        let stats = client.stats().await.unwrap();

        assert_eq!(stats.total_scans, 9);
        assert_eq!(stats.count_for(SafetyLevel::LowRisk), 9);
        assert_eq!(stats.most_scanned_products[0].scan_count, 4);
    }

    #[tokio::test]
    async fn test_batch_scan() {
        let service = spawn_service().await;
        let client = signed_in(&service.base_url);

        let report = client
            .batch_scan(&["12345678", UNKNOWN_BARCODE, "4006381333931"])
            .await
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].barcode, UNKNOWN_BARCODE);

        let too_many: Vec<String> = (0..21).map(|i| format!("{:08}", i)).collect();
        assert!(matches!(
            client.batch_scan(&too_many).await,
            Err(ClientError::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = ClientConfig::default();
        config.api.base_url = "localhost:8000".into();
        assert!(AnalysisClient::new(&config, AuthContext::new())
            .unwrap_err()
            .is_config_error());
    }
}
