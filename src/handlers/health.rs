use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::json;

use crate::{errors::Result, handlers::AppState};

pub async fn liveness() -> Result<Json<serde_json::Value>> {
    Ok(Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Reports counter store reachability. Quota checks keep working through the
/// local fallback either way, so this only signals degraded precision.
/// A store that does not answer within the store timeout counts as unhealthy.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let store_healthy =
        tokio::time::timeout(state.config.store_timeout(), state.store.health_check())
            .await
            .unwrap_or(false);

    let (status, overall_status, store_status) = if store_healthy {
        (StatusCode::OK, "ready", "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unhealthy")
    };

    (
        status,
        Json(json!({
            "status": overall_status,
            "checks": {
                "counter_store": store_status
            },
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
}
