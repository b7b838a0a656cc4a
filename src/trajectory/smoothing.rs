use super::smoothstep;
use super::synth::{value_at, TrajectoryInput, TrajectoryParams};
use crate::models::{clamp_percent, Phase};

/// Limits on how fast the displayed value may move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    /// Max slew while betting, percent per second.
    pub betting_rate: f64,
    /// Max slew while revealing, percent per second.
    pub revealing_rate: f64,
    /// Max slew while settled, percent per second.
    pub settled_rate: f64,
    /// Extra slew eased in with the reveal's magnet so the curve can land.
    pub finish_boost: f64,
    /// Blend window after a phase change, ms.
    pub landing_ms: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            betting_rate: 55.0,
            revealing_rate: 140.0,
            settled_rate: 55.0,
            finish_boost: 220.0,
            landing_ms: 1_800.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Landing {
    started_at: f64,
    from: f64,
}

/// Per-viewer displayed value: blends across phase changes and rate-limits
/// every frame so the drawn line never jumps.
#[derive(Debug, Clone)]
pub struct DisplaySmoother {
    params: SmoothingParams,
    value: Option<f64>,
    phase: Option<Phase>,
    landing: Option<Landing>,
}

impl DisplaySmoother {
    pub fn new(params: SmoothingParams) -> Self {
        Self {
            params,
            value: None,
            phase: None,
            landing: None,
        }
    }

    /// Last displayed value, if any frame has run.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Start from a known value, e.g. the tail of a prefilled trail.
    pub fn seed_value(&mut self, v: f64) {
        self.value = Some(clamp_percent(v));
    }

    /// Max change allowed over `dt_ms` for the given state.
    pub fn max_step(
        &self,
        dt_ms: f64,
        now_ms: f64,
        input: Option<&TrajectoryInput>,
        traj: &TrajectoryParams,
    ) -> f64 {
        let rate = match input {
            None => self.params.betting_rate,
            Some(i) => match i.phase {
                Phase::Betting => self.params.betting_rate,
                Phase::Settled => self.params.settled_rate,
                Phase::Revealing => {
                    self.params.revealing_rate
                        + traj.magnet_weight(i.progress(now_ms)) * self.params.finish_boost
                }
            },
        };
        rate * dt_ms.max(0.0) / 1000.0
    }

    /// Advance one frame and return the value to draw.
    pub fn step(
        &mut self,
        now_ms: f64,
        dt_ms: f64,
        input: Option<&TrajectoryInput>,
        traj: &TrajectoryParams,
    ) -> f64 {
        let target = input.map_or(0.0, |i| value_at(traj, now_ms, i));
        let phase = input.map_or(Phase::Betting, |i| i.phase);

        if self.phase != Some(phase) {
            if let (Some(_), Some(current)) = (self.phase, self.value) {
                self.landing = Some(Landing {
                    started_at: now_ms,
                    from: current,
                });
            }
            self.phase = Some(phase);
        }

        let blended = match self.landing {
            Some(l) => {
                let elapsed = now_ms - l.started_at;
                let w = smoothstep(elapsed / self.params.landing_ms);
                if elapsed >= self.params.landing_ms {
                    self.landing = None;
                }
                (1.0 - w) * l.from + w * target
            }
            None => target,
        };

        let next = match self.value {
            None => blended,
            Some(current) => {
                let max_step = self.max_step(dt_ms, now_ms, input, traj);
                current + (blended - current).clamp(-max_step, max_step)
            }
        };

        let next = clamp_percent(next);
        self.value = Some(next);
        next
    }
}

impl Default for DisplaySmoother {
    fn default() -> Self {
        Self::new(SmoothingParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhaseDurations;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn input(phase: Phase, started_at: i64, outcome: Option<f64>) -> TrajectoryInput {
        TrajectoryInput {
            phase,
            phase_started_at: started_at,
            seed: 4_242,
            outcome,
            durations: PhaseDurations::default(),
        }
    }

    #[test]
    fn test_first_frame_snaps_to_target() {
        let traj = TrajectoryParams::default();
        let mut s = DisplaySmoother::default();
        let i = input(Phase::Settled, 0, Some(150.0));
        assert_eq!(s.step(1_000.0, FRAME_MS, Some(&i), &traj), 150.0);
    }

    #[test]
    fn test_slew_is_bounded_across_settle_to_betting() {
        let traj = TrajectoryParams::default();
        let params = SmoothingParams::default();
        let mut s = DisplaySmoother::new(params);

        let settled = input(Phase::Settled, 0, Some(180.0));
        let mut now = 0.0;
        let mut last = s.step(now, FRAME_MS, Some(&settled), &traj);

        let betting = input(Phase::Betting, 2_500, None);
        for _ in 0..600 {
            now += FRAME_MS;
            let v = s.step(now, FRAME_MS, Some(&betting), &traj);
            let limit = params.betting_rate * FRAME_MS / 1000.0 + 1e-9;
            assert!((v - last).abs() <= limit, "jump {} > {limit}", (v - last).abs());
            last = v;
        }
        assert!(last.abs() <= traj.betting_band + 1e-9);
    }

    #[test]
    fn test_reveal_lands_on_outcome_through_smoother() {
        let traj = TrajectoryParams::default();
        let durations = PhaseDurations::default();
        for (seed, outcome) in [(1u32, 200.0), (2, -100.0), (3, 0.5), (4, 155.0)] {
            let mut s = DisplaySmoother::default();
            let start = 7_000;
            let mut i = input(Phase::Revealing, start, Some(outcome));
            i.seed = seed;

            let end = start as f64 + durations.revealing_duration_ms as f64;
            let mut now = start as f64;
            let mut last = 0.0;
            while now <= end + 1_000.0 {
                last = s.step(now, FRAME_MS, Some(&i), &traj);
                now += FRAME_MS;
            }
            assert!((last - outcome).abs() < 1e-6, "seed {seed}: {last} vs {outcome}");
        }
    }

    #[test]
    fn test_phase_change_blends_instead_of_snapping() {
        let traj = TrajectoryParams::default();
        let mut s = DisplaySmoother::new(SmoothingParams {
            betting_rate: 1e9,
            ..SmoothingParams::default()
        });
        let settled = input(Phase::Settled, 0, Some(100.0));
        s.step(0.0, FRAME_MS, Some(&settled), &traj);

        let betting = input(Phase::Betting, 2_500, None);
        let v = s.step(2_500.0, FRAME_MS, Some(&betting), &traj);
        // landing starts at the previous value
        assert_eq!(v, 100.0);

        let later = s.step(2_500.0 + 2_000.0, FRAME_MS, Some(&betting), &traj);
        assert!(later.abs() <= traj.betting_band);
    }

    #[test]
    fn test_missing_state_idles_at_zero() {
        let traj = TrajectoryParams::default();
        let mut s = DisplaySmoother::default();
        assert_eq!(s.step(0.0, FRAME_MS, None, &traj), 0.0);
    }
}
