use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::round::RoundSnapshot;
use crate::AppState;

/// Body of the state query and the legacy tick.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub snapshot: RoundSnapshot,
}

impl From<RoundSnapshot> for StateResponse {
    fn from(snapshot: RoundSnapshot) -> Self {
        Self { ok: true, snapshot }
    }
}

/// GET /api/state: reconcile against now and return the round.
pub async fn get_state(State(state): State<AppState>) -> Result<Json<StateResponse>, AppError> {
    let now = state.clock.now_ms();
    let snapshot = state.rounds.reconcile(now).await?;
    Ok(Json(snapshot.into()))
}
