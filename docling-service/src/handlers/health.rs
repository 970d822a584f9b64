use axum::Json;
use serde_json::{json, Value};

pub const SERVICE_NAME: &str = "docling-service";

/// GET /health
/// Liveness probe; answers as long as the process is serving requests.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
