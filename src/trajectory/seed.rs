use std::f64::consts::TAU;

/// Purpose indices fed to the seed hash. Each consumer gets its own index so
/// adding one never shifts the values another sees.
pub mod purpose {
    /// Harmonic `i` uses `HARMONIC_BASE + i`.
    pub const HARMONIC_BASE: u32 = 1;
    pub const TEASE_PHASE: u32 = 32;
    pub const TEASE_DIRECTION: u32 = 33;
    pub const PUNCH_PHASE: u32 = 40;
    pub const PUNCH_DIRECTION: u32 = 41;
    pub const PUNCH_GATE: u32 = 42;
    pub const MOOD: u32 = 50;
}

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 finalizer.
fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// 64-bit hash of `(seed, purpose)`.
pub fn hash(seed: u32, purpose: u32) -> u64 {
    let key = (u64::from(seed) << 32) | u64::from(purpose);
    mix(key.wrapping_add(GOLDEN_GAMMA))
}

/// Uniform value in [0, 1).
pub fn unit(seed: u32, purpose: u32) -> f64 {
    (hash(seed, purpose) >> 11) as f64 / (1u64 << 53) as f64
}

/// Phase offset in radians, [0, 2π).
pub fn phase_offset(seed: u32, purpose: u32) -> f64 {
    unit(seed, purpose) * TAU
}

/// +1.0 or -1.0.
pub fn direction(seed: u32, purpose: u32) -> f64 {
    if hash(seed, purpose) & 1 == 1 {
        1.0
    } else {
        -1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_in_range_and_stable() {
        for seed in [0, 1, 999_999_999, u32::MAX] {
            for p in 0..64 {
                let u = unit(seed, p);
                assert!((0.0..1.0).contains(&u));
                assert_eq!(u.to_bits(), unit(seed, p).to_bits());
            }
        }
    }

    #[test]
    fn test_purposes_are_independent() {
        let a = phase_offset(12345, purpose::HARMONIC_BASE);
        let b = phase_offset(12345, purpose::HARMONIC_BASE + 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_direction_takes_both_signs() {
        let ups = (0..1_000u32)
            .filter(|s| direction(*s, purpose::PUNCH_DIRECTION) > 0.0)
            .count();
        assert!(ups > 400 && ups < 600, "ups = {ups}");
    }
}
