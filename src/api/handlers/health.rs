use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.rounds.store().backend_name();

    match state.rounds.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "store": backend })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, store = backend, "Health check: store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "store": backend })),
            )
        }
    }
}
