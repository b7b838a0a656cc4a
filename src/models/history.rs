use serde::{Deserialize, Serialize};

/// Outcome of a settled round, as shown in the recent-results strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(alias = "t")]
    pub completed_at: i64,
    #[serde(alias = "v")]
    pub outcome: f64,
}

/// Everything a late joiner needs to replay a settled round's reveal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundMeta {
    pub round_id: String,
    #[serde(alias = "playStartedAt")]
    pub reveal_phase_started_at: i64,
    #[serde(alias = "endPercent")]
    pub outcome: f64,
    pub seed: u32,
}
