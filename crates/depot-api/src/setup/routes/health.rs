//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

/// Liveness check: the process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness check: the storage directory is still there and is a directory.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let dir = &state.config.storage_dir;
    let storage = match tokio::time::timeout(TIMEOUT, tokio::fs::metadata(dir)).await {
        Ok(Ok(meta)) if meta.is_dir() => "ready".to_string(),
        Ok(Ok(_)) => {
            tracing::error!(storage_dir = %dir.display(), "Storage path is not a directory");
            "not_ready: not a directory".to_string()
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, storage_dir = %dir.display(), "Storage readiness check failed");
            format!("not_ready: {}", e.kind())
        }
        Err(_) => {
            tracing::error!(storage_dir = %dir.display(), "Storage readiness check timed out");
            "timeout".to_string()
        }
    };

    let ready = storage == "ready";
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if ready { "ready" } else { "not_ready" },
            "storage": storage,
        })),
    )
}
