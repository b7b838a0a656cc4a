use serde::Serialize;

use crate::round::RoundSnapshot;

/// Messages broadcast to all connected WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Phase or round changed; carries the full state-query payload.
    #[serde(rename = "round_update")]
    RoundUpdate(RoundSnapshot),

    /// Round and history were wiped by an admin.
    #[serde(rename = "reset")]
    Reset,
}
