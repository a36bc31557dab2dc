//! In-process stand-in for the analysis service, bound to an ephemeral port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// Barcode the stand-in service does not know.
pub(crate) const UNKNOWN_BARCODE: &str = "00000000";

#[derive(Debug, Default)]
pub(crate) struct Seen {
    pub authorization: Vec<String>,
    pub barcodes: Vec<String>,
    pub history_query: Option<HashMap<String, String>>,
    /// (file name, content type, byte count, scan type)
    pub image: Option<(String, String, usize, String)>,
}

type Shared = Arc<Mutex<Seen>>;

pub(crate) struct MockService {
    pub base_url: String,
    pub seen: Shared,
}

pub(crate) fn record_json(id: i64, barcode: &str) -> Value {
    json!({
        "id": id,
        "product": {
            "id": id,
            "barcode": barcode,
            "name": "Cola",
            "brand": "Acme",
            "ingredients": ["Carbonated water", "Sugar"],
            "nutrition_facts": {"sugar_g": 10.6}
        },
        "safety_level": "HIGH_RISK",
        "risk_score": 82,
        "health_impact": {"immediate": ["Sugar spike"], "long_term": ["Tooth decay"]},
        "specific_concerns": ["High sugar"],
        "recommendations": [{"title": "Choose water"}],
        "created_at": "2025-03-01T10:15:00Z"
    })
}

fn remember_auth(seen: &Shared, headers: &HeaderMap) {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        seen.lock().unwrap().authorization.push(value.to_string());
    }
}

async fn barcode(
    State(seen): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    remember_auth(&seen, &headers);
    let code = body["barcode"].as_str().unwrap_or_default().to_string();
    seen.lock().unwrap().barcodes.push(code.clone());

    if code == UNKNOWN_BARCODE {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Product not found"})));
    }
    (StatusCode::CREATED, Json(record_json(1, &code)))
}

async fn image(
    State(seen): State<Shared>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    remember_auth(&seen, &headers);
    let (mut file_name, mut content_type, mut len, mut scan_type) =
        (String::new(), String::new(), 0, String::new());

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                file_name = field.file_name().unwrap_or_default().to_string();
                content_type = field.content_type().unwrap_or_default().to_string();
                len = field.bytes().await.unwrap().len();
            }
            "scan_type" => scan_type = field.text().await.unwrap(),
            _ => {}
        }
    }
    seen.lock().unwrap().image = Some((file_name, content_type, len, scan_type.clone()));

    if scan_type == "general" {
        return (
            StatusCode::OK,
            Json(json!({
                "message": "Text extracted but product could not be identified",
                "extracted_data": {"text": "sugar, salt", "confidence": 0.8},
                "scan_session_id": 11
            })),
        );
    }
    (StatusCode::CREATED, Json(record_json(2, "5012345678900")))
}

async fn analysis(Path(id): Path<i64>) -> (StatusCode, Json<Value>) {
    if id == 404 {
        return (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."})));
    }
    (StatusCode::OK, Json(record_json(id, "12345678")))
}

async fn history(
    State(seen): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    let paginated = query.get("scan_type").map(String::as_str) == Some("manual");
    seen.lock().unwrap().history_query = Some(query);

    let records = json!([record_json(3, "12345678"), record_json(4, "96385074")]);
    if paginated {
        Json(json!({"count": 2, "results": records}))
    } else {
        Json(records)
    }
}

async fn stats() -> Json<Value> {
    Json(json!({
        "total_scans": 9,
        "recent_scans": 3,
        "most_scanned_products": [
            {"product": {"barcode": "12345678", "name": "Oats", "brand": "Field"}, "scan_count": 4}
        ],
        "safety_distribution": [{"safety_level": "LOW_RISK", "count": 9}]
    }))
}

async fn batch(Json(body): Json<Value>) -> Json<Value> {
    let mut results = Vec::new();
    let mut errors = Vec::new();
    for (i, code) in body["barcodes"].as_array().cloned().unwrap_or_default().iter().enumerate() {
        let code = code.as_str().unwrap_or_default();
        if code == UNKNOWN_BARCODE {
            errors.push(json!({"barcode": code, "error": "Product not found"}));
        } else {
            results.push(record_json(10 + i as i64, code));
        }
    }
    Json(json!({
        "processed": results.len(),
        "failed": errors.len(),
        "results": results,
        "errors": errors
    }))
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

/// Starts a well-behaved analysis service.
pub(crate) async fn spawn_service() -> MockService {
    let seen: Shared = Arc::default();
    let router = Router::new()
        .route("/api/scan/barcode/", post(barcode))
        .route("/api/scan/image/", post(image))
        .route("/api/scan/analysis/{id}/", get(analysis))
        .route("/api/scan/history/", get(history))
        .route("/api/scan/stats/", get(stats))
        .route("/api/scan/batch_scan/", post(batch))
        .with_state(seen.clone());

    MockService {
        base_url: serve(router).await,
        seen,
    }
}

/// Starts a service that answers every request with HTTP 500.
pub(crate) async fn spawn_failing_service() -> MockService {
    let router = Router::new().fallback(|| async {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Analysis backend unavailable"})),
        )
    });

    MockService {
        base_url: serve(router).await,
        seen: Arc::default(),
    }
}
