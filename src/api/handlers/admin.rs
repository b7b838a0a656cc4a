use axum::extract::State;
use axum::Json;
use serde_json::json;

use super::state::StateResponse;
use crate::api::ws_types::WsMessage;
use crate::errors::AppError;
use crate::AppState;

/// POST /api/tick: apply at most one phase transition.
pub async fn tick(State(state): State<AppState>) -> Result<Json<StateResponse>, AppError> {
    let now = state.clock.now_ms();
    let snapshot = state.rounds.tick(now).await?;
    tracing::info!(
        round_id = %snapshot.round.round_id,
        phase = %snapshot.round.phase,
        "Manual tick"
    );
    Ok(Json(snapshot.into()))
}

/// POST /api/reset: drop the round, history and metadata.
pub async fn reset(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    state.rounds.reset().await?;
    // No subscribers is fine
    let _ = state.ws_tx.send(WsMessage::Reset);
    Ok(Json(json!({ "ok": true })))
}
