//! Deterministic coordinate noise.
//!
//! Each sample seeds a fresh `ChaCha8Rng` from the master seed mixed with the
//! bit patterns of the two inputs, so the same coordinate always yields the
//! same value and neighbouring coordinates are uncorrelated.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const DEFAULT_NOISE_SEED: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededNoise {
    seed: u64,
}

impl Default for SeededNoise {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_SEED)
    }
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Value in `[0, 1)` for the pair `(a, b)`.
    pub fn sample(&self, a: f64, b: f64) -> f64 {
        let mut rng = ChaCha8Rng::seed_from_u64(self.derive_seed(a, b));
        rng.gen::<f64>()
    }

    fn derive_seed(&self, a: f64, b: f64) -> u64 {
        // -0.0 and 0.0 must land on the same stream
        let a_bits = (a + 0.0).to_bits();
        let b_bits = (b + 0.0).to_bits();

        let mut seed = self.seed;
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= a_bits.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed ^= b_bits.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed
    }
}
