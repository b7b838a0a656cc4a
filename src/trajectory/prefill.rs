use super::synth::{revealing_value, TrajectoryParams};
use super::TrailPoint;
use crate::models::RoundMeta;

/// Sample spacing used when regenerating past reveals.
pub const PREFILL_STEP_MS: i64 = 140;

/// Rebuild the reveal curves of recently settled rounds so a new viewer
/// starts with a backlog instead of an empty chart.
///
/// `rounds` is newest first (as served); the trail comes back oldest first,
/// each reveal ending on its exact outcome.
pub fn prefill_trail(
    params: &TrajectoryParams,
    rounds: &[RoundMeta],
    revealing_duration_ms: i64,
    step_ms: i64,
) -> Vec<TrailPoint> {
    if revealing_duration_ms <= 0 || step_ms <= 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&RoundMeta> = rounds.iter().collect();
    ordered.sort_by_key(|r| r.reveal_phase_started_at);

    let mut points: Vec<TrailPoint> = Vec::new();
    for round in ordered {
        let start = round.reveal_phase_started_at;
        let end = start + revealing_duration_ms;

        // Rounds overlapping what we already have would fold the line back.
        if points.last().is_some_and(|p| (start as f64) < p.t) {
            continue;
        }

        let mut t = start;
        while t < end {
            points.push(sample(params, t, round, revealing_duration_ms));
            t += step_ms;
        }
        points.push(sample(params, end, round, revealing_duration_ms));
    }

    points
}

fn sample(params: &TrajectoryParams, t: i64, round: &RoundMeta, duration_ms: i64) -> TrailPoint {
    TrailPoint {
        t: t as f64,
        v: revealing_value(
            params,
            t as f64,
            round.reveal_phase_started_at,
            duration_ms,
            round.seed,
            round.outcome,
        ),
    }
}
