use axum::Json;
use serde_json::{json, Value as JsonValue};

/// GET /health
pub async fn health() -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
