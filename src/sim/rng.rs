//! Seeded linear congruential generator
//!
//! Reproducible per seed: rendering the same slot twice yields the same
//! orientation. Not suitable for anything beyond cosmetic randomness.

/// LCG multiplier (Numerical Recipes)
const LCG_MULTIPLIER: u32 = 1_664_525;
/// LCG increment
const LCG_INCREMENT: u32 = 1_013_904_223;
/// 2^32, the modulus and output divisor
const LCG_MODULUS: f64 = 4_294_967_296.0;

/// Seed used when the caller passes zero or a negative value
pub const DEFAULT_SEED: i64 = 1;

/// Deterministic float stream in [0, 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    seed: u32,
    state: u32,
}

impl SeededRng {
    /// Create a generator. Seeds are reduced modulo 2^32; negative seeds and
    /// seeds that reduce to zero fall back to [`DEFAULT_SEED`].
    pub fn new(seed: i64) -> Self {
        let reduced = if seed <= 0 {
            0
        } else {
            (seed as u64 & 0xFFFF_FFFF) as u32
        };
        let seed = if reduced == 0 {
            DEFAULT_SEED as u32
        } else {
            reduced
        };
        Self { seed, state: seed }
    }

    /// The seed the generator restarts from
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Next value in [0, 1)
    pub fn next(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.state as f64 / LCG_MODULUS
    }

    /// Next value in [min, max)
    pub fn next_float(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// Next integer in [min, max_exclusive). Returns `min` for an empty range.
    pub fn next_int(&mut self, min: i64, max_exclusive: i64) -> i64 {
        if max_exclusive <= min {
            return min;
        }
        let span = (max_exclusive - min) as f64;
        min + (self.next() * span).floor() as i64
    }

    /// Rewind to the construction-time seed
    pub fn reset(&mut self) {
        self.state = self.seed;
    }
}
