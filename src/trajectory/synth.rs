use super::oscillator::{noise, punch};
use super::seed::{self, purpose};
use super::smoothstep;
use crate::models::{clamp_percent, Phase, PhaseDurations, Round};

/// Shaping constants for the synthesized curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryParams {
    /// Gain applied to the oscillator while betting.
    pub betting_gain: f64,
    /// Betting value stays within ±this.
    pub betting_band: f64,

    /// Seeds whose mood falls below this share play the aggressive profile.
    pub aggressive_share: f64,
    pub aggressive_amplitude: f64,
    pub calm_amplitude: f64,
    /// Envelope is `floor + swell * mid`, mid peaking halfway through the reveal.
    pub amplitude_floor: f64,
    pub amplitude_swell: f64,

    pub tease_in_start: f64,
    pub tease_in_width: f64,
    pub tease_out_start: f64,
    pub tease_out_width: f64,
    /// Angular frequency of the tease swing, rad/s.
    pub tease_frequency: f64,
    pub aggressive_tease: f64,
    pub calm_tease: f64,

    /// Punch periods per second.
    pub punch_rate: f64,
    /// Fraction of a period the punch decays over.
    pub punch_width: f64,
    /// Share of seeds that get a punch at all.
    pub punch_chance: f64,
    pub aggressive_punch: f64,
    pub calm_punch: f64,
    pub punch_floor: f64,
    pub punch_swell: f64,

    /// Reveal progress where the pull toward the outcome starts.
    pub magnet_start: f64,
    /// Progress span over which the pull eases from 0 to 1.
    pub magnet_width: f64,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        Self {
            betting_gain: 8.5,
            betting_band: 10.0,

            aggressive_share: 0.45,
            aggressive_amplitude: 60.0,
            calm_amplitude: 42.0,
            amplitude_floor: 0.45,
            amplitude_swell: 0.90,

            tease_in_start: 0.55,
            tease_in_width: 0.25,
            tease_out_start: 0.93,
            tease_out_width: 0.07,
            tease_frequency: 4.8,
            aggressive_tease: 16.0,
            calm_tease: 11.0,

            punch_rate: 0.33,
            punch_width: 0.07,
            punch_chance: 0.5,
            aggressive_punch: 22.0,
            calm_punch: 14.0,
            punch_floor: 0.35,
            punch_swell: 0.65,

            magnet_start: 0.78,
            magnet_width: 0.22,
        }
    }
}

impl TrajectoryParams {
    /// Weight of the pull toward the outcome at reveal progress `t01`.
    /// Exactly 1 once the phase is over, whatever rounding the ramp has.
    pub fn magnet_weight(&self, t01: f64) -> f64 {
        if t01 >= 1.0 {
            return 1.0;
        }
        smoothstep((t01 - self.magnet_start) / self.magnet_width)
    }

    fn tease_weight(&self, t01: f64) -> f64 {
        smoothstep((t01 - self.tease_in_start) / self.tease_in_width)
            * (1.0 - smoothstep((t01 - self.tease_out_start) / self.tease_out_width))
    }

    fn is_aggressive(&self, seed: u32) -> bool {
        seed::unit(seed, purpose::MOOD) < self.aggressive_share
    }

    fn has_punch(&self, seed: u32) -> bool {
        seed::unit(seed, purpose::PUNCH_GATE) < self.punch_chance
    }
}

/// Round fields the synthesizer reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryInput {
    pub phase: Phase,
    pub phase_started_at: i64,
    pub seed: u32,
    pub outcome: Option<f64>,
    pub durations: PhaseDurations,
}

impl From<&Round> for TrajectoryInput {
    fn from(round: &Round) -> Self {
        Self {
            phase: round.phase,
            phase_started_at: round.phase_started_at,
            seed: round.seed,
            outcome: round.outcome,
            durations: round.durations,
        }
    }
}

impl TrajectoryInput {
    /// Progress through the current phase in [0, 1]. A non-positive duration
    /// counts as already finished.
    pub fn progress(&self, now_ms: f64) -> f64 {
        phase_progress(now_ms, self.phase_started_at, self.durations.of(self.phase))
    }
}

fn phase_progress(now_ms: f64, started_at: i64, duration_ms: i64) -> f64 {
    if duration_ms <= 0 {
        return 1.0;
    }
    let t01 = (now_ms - started_at as f64) / duration_ms as f64;
    if t01.is_nan() {
        return 0.0;
    }
    t01.clamp(0.0, 1.0)
}

/// Percentage to display at virtual time `now_ms`.
///
/// Identical inputs give bit-identical output on every viewer. The result is
/// always within [-100, 200].
pub fn value_at(params: &TrajectoryParams, now_ms: f64, input: &TrajectoryInput) -> f64 {
    let value = match input.phase {
        Phase::Betting => {
            let t = (now_ms - input.phase_started_at as f64) / 1000.0;
            betting_value(params, t, input.seed)
        }
        Phase::Revealing => revealing_value(
            params,
            now_ms,
            input.phase_started_at,
            input.durations.revealing_duration_ms,
            input.seed,
            input.outcome.unwrap_or(0.0),
        ),
        Phase::Settled => input.outcome.unwrap_or(0.0),
    };
    clamp_percent(value)
}

/// Small idle wobble while bets are open; `t` in seconds since phase start.
pub fn betting_value(params: &TrajectoryParams, t: f64, seed: u32) -> f64 {
    let v = noise(t, seed) * params.betting_gain;
    if v.is_finite() {
        v.clamp(-params.betting_band, params.betting_band)
    } else {
        0.0
    }
}

/// The reveal curve: swelling noise, optional punch and tease, then an eased
/// pull that lands exactly on `outcome` when the phase ends.
pub fn revealing_value(
    params: &TrajectoryParams,
    now_ms: f64,
    started_at: i64,
    duration_ms: i64,
    seed: u32,
    outcome: f64,
) -> f64 {
    let end = clamp_percent(outcome);
    let t01 = phase_progress(now_ms, started_at, duration_ms);
    let t = (now_ms - started_at as f64) / 1000.0;

    let aggressive = params.is_aggressive(seed);
    let mid = 1.0 - (t01 * 2.0 - 1.0).abs();

    let base = if aggressive {
        params.aggressive_amplitude
    } else {
        params.calm_amplitude
    };
    let amplitude = base * (params.amplitude_floor + mid * params.amplitude_swell);
    let raw = noise(t, seed) * amplitude;

    let tease_amp = if aggressive { params.aggressive_tease } else { params.calm_tease };
    let tease = params.tease_weight(t01)
        * seed::direction(seed, purpose::TEASE_DIRECTION)
        * (t * params.tease_frequency + seed::phase_offset(seed, purpose::TEASE_PHASE)).sin()
        * tease_amp;

    let hit = if params.has_punch(seed) {
        let punch_amp = if aggressive { params.aggressive_punch } else { params.calm_punch };
        punch(t, seed, params.punch_rate, params.punch_width)
            * punch_amp
            * (params.punch_floor + mid * params.punch_swell)
    } else {
        0.0
    };

    let noisy = clamp_percent(raw + tease + hit);

    let pull = params.magnet_weight(t01);
    clamp_percent((1.0 - pull) * noisy + pull * end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reveal(seed: u32, outcome: f64) -> TrajectoryInput {
        TrajectoryInput {
            phase: Phase::Revealing,
            phase_started_at: 1_000_000,
            seed,
            outcome: Some(outcome),
            durations: PhaseDurations::default(),
        }
    }

    #[test]
    fn test_reveal_ends_exactly_on_outcome() {
        let params = TrajectoryParams::default();
        for seed in (0..2_000u32).map(|s| s.wrapping_mul(2_654_435_761)) {
            for outcome in [-100.0, -37.25, 0.0, 42.0, 150.0, 199.99, 200.0] {
                let input = reveal(seed, outcome);
                let end = input.phase_started_at as f64
                    + input.durations.revealing_duration_ms as f64;
                assert_eq!(value_at(&params, end, &input), outcome, "seed {seed}");
                // past the end, before the client learns of the settle
                assert_eq!(value_at(&params, end + 750.0, &input), outcome);
            }
        }
    }

    #[test]
    fn test_values_always_in_range() {
        let params = TrajectoryParams::default();
        for seed in [0, 1, 7, 999, 123_456_789, u32::MAX] {
            for outcome in [Some(-100.0), Some(200.0), Some(1e9), Some(f64::NAN), None] {
                for phase in [Phase::Betting, Phase::Revealing, Phase::Settled] {
                    let input = TrajectoryInput {
                        phase,
                        ..reveal(seed, 0.0)
                    };
                    let input = TrajectoryInput { outcome, ..input };
                    let mut now = input.phase_started_at as f64 - 5_000.0;
                    while now < input.phase_started_at as f64 + 30_000.0 {
                        let v = value_at(&params, now, &input);
                        assert!((-100.0..=200.0).contains(&v), "{v} for {phase} seed {seed}");
                        now += 53.0;
                    }
                }
            }
        }
    }

    #[test]
    fn test_value_is_deterministic() {
        let params = TrajectoryParams::default();
        let input = reveal(424_242, 87.5);
        for i in 0..500 {
            let now = 1_000_000.0 + i as f64 * 31.7;
            let a = value_at(&params, now, &input);
            let b = value_at(&params, now, &input.clone());
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_betting_stays_in_band() {
        let params = TrajectoryParams::default();
        for seed in [3, 30, 300] {
            for i in 0..2_000 {
                let v = betting_value(&params, i as f64 * 0.01, seed);
                assert!(v.abs() <= params.betting_band);
            }
        }
    }

    #[test]
    fn test_settled_holds_outcome() {
        let params = TrajectoryParams::default();
        let input = TrajectoryInput {
            phase: Phase::Settled,
            ..reveal(5, -63.0)
        };
        assert_eq!(value_at(&params, 0.0, &input), -63.0);
        assert_eq!(value_at(&params, 2e12, &input), -63.0);
    }

    #[test]
    fn test_reveal_does_not_sit_on_outcome_early() {
        // The curve must not give the result away before the pull kicks in.
        let params = TrajectoryParams::default();
        let mut hits = 0;
        let total = 200;
        for seed in 0..total {
            let input = reveal(seed, 120.0);
            let now = input.phase_started_at as f64
                + 0.3 * input.durations.revealing_duration_ms as f64;
            if (value_at(&params, now, &input) - 120.0).abs() < 1.0 {
                hits += 1;
            }
        }
        assert!(hits < total / 10);
    }

    #[test]
    fn test_zero_duration_counts_as_finished() {
        let params = TrajectoryParams::default();
        let mut input = reveal(9, 33.0);
        input.durations.revealing_duration_ms = 0;
        assert_eq!(value_at(&params, input.phase_started_at as f64, &input), 33.0);
    }
}
