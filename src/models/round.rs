use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Phase;

/// Durations of the three phases in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDurations {
    #[serde(alias = "betMs")]
    pub betting_duration_ms: i64,
    #[serde(alias = "playMs")]
    pub revealing_duration_ms: i64,
    #[serde(alias = "endMs")]
    pub settled_duration_ms: i64,
}

impl PhaseDurations {
    pub fn of(&self, phase: Phase) -> i64 {
        match phase {
            Phase::Betting => self.betting_duration_ms,
            Phase::Revealing => self.revealing_duration_ms,
            Phase::Settled => self.settled_duration_ms,
        }
    }

    /// Every phase must last a positive time, or the schedule never advances.
    pub fn all_positive(&self) -> bool {
        self.betting_duration_ms > 0
            && self.revealing_duration_ms > 0
            && self.settled_duration_ms > 0
    }

    /// Full round length (all three phases).
    pub fn cycle_ms(&self) -> i64 {
        self.betting_duration_ms + self.revealing_duration_ms + self.settled_duration_ms
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            betting_duration_ms: 7_000,
            revealing_duration_ms: 15_000,
            settled_duration_ms: 2_500,
        }
    }
}

/// The single shared round record persisted under the state key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub round_id: String,
    pub phase: Phase,
    /// Start of the current phase, ms since epoch on the server clock.
    pub phase_started_at: i64,
    #[serde(default)]
    pub seed: u32,
    /// Absent while betting.
    #[serde(default, alias = "endPercent", skip_serializing_if = "Option::is_none")]
    pub outcome: Option<f64>,
    #[serde(flatten)]
    pub durations: PhaseDurations,
}

impl Round {
    /// Fresh betting round anchored at `started_at`.
    pub fn new(started_at: i64, seed: u32, durations: PhaseDurations) -> Self {
        Self {
            round_id: Uuid::new_v4().to_string(),
            phase: Phase::Betting,
            phase_started_at: started_at,
            seed,
            outcome: None,
            durations,
        }
    }

    /// Timestamp at which the current phase ends.
    pub fn phase_ends_at(&self) -> i64 {
        self.phase_started_at
            .saturating_add(self.durations.of(self.phase).max(0))
    }
}
