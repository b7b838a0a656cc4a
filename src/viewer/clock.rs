use std::time::Instant;

use chrono::Utc;

/// Frame length the per-frame step is calibrated for (60 Hz).
pub const NOMINAL_FRAME_MS: f64 = 16.7;
/// Default largest offset correction per nominal frame.
pub const DEFAULT_MAX_STEP_MS: f64 = 16.0;

/// Local wall-clock reading that never goes backwards: the wall time at
/// start plus monotonic elapsed time.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    started: Instant,
    started_wall_ms: f64,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            started_wall_ms: Utc::now().timestamp_millis() as f64,
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.started_wall_ms + self.started.elapsed().as_secs_f64() * 1000.0
    }
}

/// Slowly converging estimate of `server clock - local clock`.
///
/// Polls set a target; frames walk the live offset toward it by a bounded
/// step, so a new poll never makes the virtual clock jump.
#[derive(Debug, Clone)]
pub struct ClockSync {
    offset_ms: f64,
    target_ms: Option<f64>,
    max_step_ms: f64,
}

impl ClockSync {
    pub fn new(max_step_ms: f64) -> Self {
        Self {
            offset_ms: 0.0,
            target_ms: None,
            max_step_ms,
        }
    }

    /// Feed a poll result. `local_request_ms` is the local clock when the
    /// request went out. The first observation is taken as-is.
    pub fn observe(&mut self, server_now_ms: i64, local_request_ms: f64) {
        let target = server_now_ms as f64 - local_request_ms;
        if self.target_ms.is_none() {
            self.offset_ms = target;
        }
        self.target_ms = Some(target);
    }

    /// Move the offset toward its target for a frame of `dt_ms`.
    pub fn advance(&mut self, dt_ms: f64) {
        let Some(target) = self.target_ms else {
            return;
        };
        let kdt = (dt_ms / NOMINAL_FRAME_MS).clamp(0.5, 2.2);
        let step = self.max_step_ms * kdt;
        self.offset_ms += (target - self.offset_ms).clamp(-step, step);
    }

    pub fn offset_ms(&self) -> f64 {
        self.offset_ms
    }

    pub fn is_synced(&self) -> bool {
        self.target_ms.is_some()
    }

    /// Shared virtual "now" for a local monotonic reading.
    pub fn virtual_now(&self, local_ms: f64) -> f64 {
        local_ms + self.offset_ms
    }
}

impl Default for ClockSync {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STEP_MS)
    }
}
