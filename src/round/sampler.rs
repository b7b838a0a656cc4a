use rand::Rng;

use crate::models::{OUTCOME_MAX, OUTCOME_MIN};

/// Probability of the losing branch (uniform in [-100, 0]).
pub const NEGATIVE_BRANCH_PROBABILITY: f64 = 0.5;

/// Relative weights of the winning sub-ranges. They are not normalized.
pub const WIN_WEIGHTS: [f64; 3] = [40.0, 10.0, 3.0];

/// Winning sub-ranges, in the same order as [`WIN_WEIGHTS`].
pub const WIN_RANGES: [(f64, f64); 3] = [(0.0, 50.0), (51.0, 150.0), (150.0, OUTCOME_MAX)];

/// Exclusive upper bound for round seeds.
pub const SEED_SPACE: u32 = 1_000_000_000;

/// Draw a round outcome in [-100, 200].
///
/// One uniform picks the branch, a second picks the winning sub-range by
/// cumulative weight, a third picks the value inside the chosen range.
pub fn sample_outcome<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let r: f64 = rng.gen();
    if r < NEGATIVE_BRANCH_PROBABILITY {
        return OUTCOME_MIN + rng.gen::<f64>() * -OUTCOME_MIN;
    }

    let total: f64 = WIN_WEIGHTS.iter().sum();
    let u = rng.gen::<f64>() * total;

    let mut cumulative = 0.0;
    let mut picked = WIN_RANGES[WIN_RANGES.len() - 1];
    for (weight, range) in WIN_WEIGHTS.iter().zip(WIN_RANGES) {
        cumulative += weight;
        if u < cumulative {
            picked = range;
            break;
        }
    }

    let (lo, hi) = picked;
    lo + rng.gen::<f64>() * (hi - lo)
}

/// Draw a seed for trajectory shaping.
pub fn sample_seed<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(0..SEED_SPACE)
}
