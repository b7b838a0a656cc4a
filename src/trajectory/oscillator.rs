use super::seed::{self, purpose};

/// One sine component of the base oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    /// Angular frequency, rad/s.
    pub frequency: f64,
    pub weight: f64,
}

/// Weights sum to 1, so [`noise`] stays within [-1, 1].
pub const HARMONICS: [Harmonic; 4] = [
    Harmonic {
        frequency: 0.95,
        weight: 0.55,
    },
    Harmonic {
        frequency: 1.90,
        weight: 0.28,
    },
    Harmonic {
        frequency: 3.70,
        weight: 0.12,
    },
    Harmonic {
        frequency: 6.40,
        weight: 0.05,
    },
];

/// Seeded multi-harmonic signal at `t` seconds.
pub fn noise(t: f64, seed: u32) -> f64 {
    HARMONICS
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let offset = seed::phase_offset(seed, purpose::HARMONIC_BASE + i as u32);
            (t * h.frequency + offset).sin() * h.weight
        })
        .sum()
}

/// One-sided impulse train: jumps to ±1 and decays linearly to 0 over
/// `width` of each period, then stays at 0 until the next period.
pub fn punch(t: f64, seed: u32, rate: f64, width: f64) -> f64 {
    let x = (t * rate + seed::unit(seed, purpose::PUNCH_PHASE)).rem_euclid(1.0);
    let envelope = if x < width { 1.0 - x / width } else { 0.0 };
    envelope * seed::direction(seed, purpose::PUNCH_DIRECTION)
}
