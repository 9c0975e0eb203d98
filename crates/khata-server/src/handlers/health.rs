//! Liveness and health probes (outside the auth boundary)

use axum::Json;

/// GET /ping - Verify the API is responding
pub async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "API is running!",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// GET /health - Health check for the deployment platform
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "service": "khata-api",
    }))
}
