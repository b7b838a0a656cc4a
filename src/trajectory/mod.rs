//! Deterministic client-side trajectory synthesis.
//!
//! Everything here is a pure function of (virtual time, round fields), except
//! [`smoothing::DisplaySmoother`], which carries the per-viewer displayed value.

pub mod oscillator;
pub mod prefill;
pub mod seed;
pub mod smoothing;
pub mod synth;
pub mod warp;

use serde::{Deserialize, Serialize};

pub use prefill::{prefill_trail, PREFILL_STEP_MS};
pub use smoothing::{DisplaySmoother, SmoothingParams};
pub use synth::{value_at, TrajectoryInput, TrajectoryParams};
pub use warp::warp_percent;

/// One sample of the drawn line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    /// Virtual time, ms since epoch.
    pub t: f64,
    /// Displayed percentage.
    pub v: f64,
}

/// Cubic ease on [0, 1]; input outside the interval is clamped.
pub fn smoothstep(x: f64) -> f64 {
    let t = x.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
