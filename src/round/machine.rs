use rand::Rng;

use super::sampler::{sample_outcome, sample_seed};
use crate::models::{clamp_percent, HistoryEntry, Phase, PhaseDurations, Round, RoundMeta};

/// Tuning for the round state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Durations stamped onto newly created rounds.
    pub durations: PhaseDurations,
    /// Length of the history and metadata logs.
    pub history_len: usize,
    /// Upper bound on transitions applied by one reconcile.
    pub max_catch_up_steps: usize,
    /// How far in the future `phase_started_at` may be before it is clamped.
    pub future_tolerance_ms: i64,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            durations: PhaseDurations::default(),
            history_len: 8,
            max_catch_up_steps: 100,
            future_tolerance_ms: 2_000,
        }
    }
}

/// Log entries produced when a round settles.
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub entry: HistoryEntry,
    pub meta: RoundMeta,
}

/// Result of advancing a round to a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub round: Round,
    /// Phases entered, in order.
    pub entered: Vec<Phase>,
    /// Settlements in the order they happened (oldest first).
    pub settlements: Vec<Settlement>,
    /// True if the round was synthesized because none was stored.
    pub created: bool,
    /// True if `phase_started_at` was pulled back from the future.
    pub clock_corrected: bool,
    /// True if the step budget ran out before the round caught up.
    pub capped: bool,
}

/// Fresh betting round anchored at `now`.
pub fn fresh_round<R: Rng + ?Sized>(now: i64, rng: &mut R, durations: PhaseDurations) -> Round {
    Round::new(now, sample_seed(rng), durations)
}

/// Pull a future `phase_started_at` back to `now`. Returns true if it moved.
pub fn sanitize_clock(round: &mut Round, now: i64, tolerance_ms: i64) -> bool {
    if round.phase_started_at > now.saturating_add(tolerance_ms) {
        round.phase_started_at = now;
        return true;
    }
    false
}

/// Apply exactly one transition at the current phase boundary.
///
/// The new phase starts at the computed boundary, never at observation time.
pub fn transition<R: Rng + ?Sized>(
    round: &mut Round,
    rng: &mut R,
    durations: PhaseDurations,
) -> Option<Settlement> {
    let boundary = round.phase_ends_at();

    match round.phase {
        Phase::Betting => {
            round.phase = Phase::Revealing;
            round.phase_started_at = boundary;
            round.outcome = Some(sample_outcome(rng));
            round.seed = sample_seed(rng);
            None
        }
        Phase::Revealing => {
            let outcome = round.outcome.map(clamp_percent).unwrap_or(0.0);
            let meta = RoundMeta {
                round_id: round.round_id.clone(),
                reveal_phase_started_at: round.phase_started_at,
                outcome,
                seed: round.seed,
            };
            round.phase = Phase::Settled;
            round.phase_started_at = boundary;
            round.outcome = Some(outcome);
            Some(Settlement {
                entry: HistoryEntry {
                    completed_at: boundary,
                    outcome,
                },
                meta,
            })
        }
        Phase::Settled => {
            *round = fresh_round(boundary, rng, durations);
            None
        }
    }
}

/// Bring `round` up to `now`, creating one if absent.
pub fn advance<R: Rng + ?Sized>(
    stored: Option<Round>,
    now: i64,
    config: &MachineConfig,
    rng: &mut R,
) -> Advance {
    let created = stored.is_none();
    let mut round = stored.unwrap_or_else(|| fresh_round(now, rng, config.durations));
    let clock_corrected = sanitize_clock(&mut round, now, config.future_tolerance_ms);

    let mut entered = Vec::new();
    let mut settlements = Vec::new();
    let mut capped = true;

    for _ in 0..config.max_catch_up_steps {
        if now < round.phase_ends_at() {
            capped = false;
            break;
        }
        if let Some(s) = transition(&mut round, rng, config.durations) {
            settlements.push(s);
        }
        entered.push(round.phase);
    }
    if capped && now < round.phase_ends_at() {
        capped = false;
    }

    Advance {
        round,
        entered,
        settlements,
        created,
        clock_corrected,
        capped,
    }
}
