pub mod history;
pub mod round;

pub use history::{HistoryEntry, RoundMeta};
pub use round::{PhaseDurations, Round};

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Round phase. Legacy names (`BET`, `PLAY`, `END`) are accepted on input so
/// blobs written by older deployments still parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    #[serde(alias = "BET")]
    Betting,
    #[serde(alias = "PLAY")]
    Revealing,
    #[serde(alias = "END")]
    Settled,
}

impl Phase {
    /// The phase that follows this one in the round cycle.
    pub fn next(self) -> Self {
        match self {
            Phase::Betting => Phase::Revealing,
            Phase::Revealing => Phase::Settled,
            Phase::Settled => Phase::Betting,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Betting => "BETTING",
            Phase::Revealing => "REVEALING",
            Phase::Settled => "SETTLED",
        }
    }

    /// Numeric code used for the `round_phase` gauge.
    pub fn code(self) -> f64 {
        match self {
            Phase::Betting => 0.0,
            Phase::Revealing => 1.0,
            Phase::Settled => 2.0,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Outcome bounds
// ---------------------------------------------------------------------------

pub const OUTCOME_MIN: f64 = -100.0;
pub const OUTCOME_MAX: f64 = 200.0;

/// Clamp a percentage into the outcome range. Non-finite input maps to 0.
pub fn clamp_percent(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(OUTCOME_MIN, OUTCOME_MAX)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_cycle() {
        assert_eq!(Phase::Betting.next(), Phase::Revealing);
        assert_eq!(Phase::Revealing.next(), Phase::Settled);
        assert_eq!(Phase::Settled.next(), Phase::Betting);
    }

    #[test]
    fn test_phase_accepts_legacy_names() {
        let p: Phase = serde_json::from_str("\"PLAY\"").unwrap();
        assert_eq!(p, Phase::Revealing);
        let p: Phase = serde_json::from_str("\"END\"").unwrap();
        assert_eq!(p, Phase::Settled);
        assert_eq!(serde_json::to_string(&Phase::Betting).unwrap(), "\"BETTING\"");
    }

    #[test]
    fn test_clamp_percent() {
        assert_eq!(clamp_percent(250.0), 200.0);
        assert_eq!(clamp_percent(-300.0), -100.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 0.0);
        assert_eq!(clamp_percent(12.5), 12.5);
    }
}
