//! Deterministic random number generation
//!
//! `LcgRandom` is a 32-bit linear congruential generator. Every consumer in the
//! crate takes its randomness as `&mut impl RngCore`, so the generator is passed
//! explicitly; the process-wide [`global`] instance exists only for top-level
//! convenience and test isolation.

use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// LCG multiplier (Numerical Recipes)
pub const LCG_MULTIPLIER: u32 = 1_664_525;
/// LCG increment (Numerical Recipes)
pub const LCG_INCREMENT: u32 = 1_013_904_223;

const TWO_POW_32: f64 = 4_294_967_296.0;
const TWO_POW_53: f64 = 9_007_199_254_740_992.0;

/// Seeded linear congruential generator (`state = a * state + c mod 2^32`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcgRandom {
    seed: u32,
}

impl LcgRandom {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    /// Replace the current state
    pub fn set_seed(&mut self, seed: u32) {
        self.seed = seed;
    }

    /// Current state (the seed of the remaining sequence)
    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    fn advance(&mut self) -> u32 {
        self.seed = self
            .seed
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT);
        self.seed
    }

    /// Uniform float in [0, 1)
    pub fn next(&mut self) -> f64 {
        self.advance() as f64 / TWO_POW_32
    }

    /// Uniform integer in [min, max)
    pub fn next_int(&mut self, min: i64, max: i64) -> Result<i64, ValidationError> {
        next_int(self, min, max)
    }

    /// Uniform float in [min, max)
    pub fn next_float(&mut self, min: f64, max: f64) -> Result<f64, ValidationError> {
        next_float(self, min, max)
    }
}

impl Default for LcgRandom {
    fn default() -> Self {
        Self::new(crate::consts::DEFAULT_SEED)
    }
}

impl RngCore for LcgRandom {
    fn next_u32(&mut self) -> u32 {
        self.advance()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.advance() as u64;
        let lo = self.advance() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(4) {
            let bytes = self.advance().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for LcgRandom {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Uniform float in [0, 1) from any 32-bit source
#[inline]
pub fn unit_f64<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    rng.next_u32() as f64 / TWO_POW_32
}

/// Uniform float in [0, 1) with 53 bits of resolution (two 32-bit draws)
#[inline]
pub fn unit_f64_wide<R: RngCore + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 / TWO_POW_53
}

/// Uniform integer in [min, max) from any source
///
/// Spans up to 2^32 take one draw. Wider spans take two, so every value of
/// spans up to 2^53 stays reachable.
pub fn next_int<R: RngCore + ?Sized>(rng: &mut R, min: i64, max: i64) -> Result<i64, ValidationError> {
    if min >= max {
        return Err(ValidationError::InvalidRange {
            min: min as f64,
            max: max as f64,
        });
    }
    let span = max as i128 - min as i128;
    let unit = if span <= 1 << 32 { unit_f64(rng) } else { unit_f64_wide(rng) };
    let offset = (unit * span as f64).floor() as i128;
    // Guard the top edge against float rounding on very wide spans
    let value = (min as i128 + offset).min(max as i128 - 1);
    Ok(value as i64)
}

/// Uniform float in [min, max) from any source
pub fn next_float<R: RngCore + ?Sized>(rng: &mut R, min: f64, max: f64) -> Result<f64, ValidationError> {
    if !min.is_finite() || !max.is_finite() || min >= max {
        return Err(ValidationError::InvalidRange { min, max });
    }
    let value = min + unit_f64(rng) * (max - min);
    // min + u * (max - min) can round up to max when the span is tiny
    if value >= max {
        Ok(min.max(prev_float(max)))
    } else {
        Ok(value)
    }
}

fn prev_float(x: f64) -> f64 {
    if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else if x < 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        -f64::from_bits(1)
    }
}

/// Process-wide default generator
///
/// Gameplay code should prefer an owned `LcgRandom`; this exists for top-level
/// convenience and for test suites that reseed before/after each test.
pub mod global {
    use parking_lot::Mutex;

    use super::LcgRandom;
    use crate::consts::DEFAULT_SEED;
    use crate::error::ValidationError;

    static GLOBAL_RNG: Mutex<LcgRandom> = parking_lot::const_mutex(LcgRandom { seed: DEFAULT_SEED });

    /// Full reset to a known seed
    pub fn initialize(seed: u32) {
        GLOBAL_RNG.lock().set_seed(seed);
        log::debug!("Global RNG initialized with seed {}", seed);
    }

    pub fn set_seed(seed: u32) {
        GLOBAL_RNG.lock().set_seed(seed);
    }

    pub fn seed() -> u32 {
        GLOBAL_RNG.lock().seed()
    }

    pub fn next() -> f64 {
        GLOBAL_RNG.lock().next()
    }

    pub fn next_int(min: i64, max: i64) -> Result<i64, ValidationError> {
        GLOBAL_RNG.lock().next_int(min, max)
    }

    pub fn next_float(min: f64, max: f64) -> Result<f64, ValidationError> {
        GLOBAL_RNG.lock().next_float(min, max)
    }

    /// Run `f` with exclusive access to the default generator
    pub fn with<T>(f: impl FnOnce(&mut LcgRandom) -> T) -> T {
        f(&mut GLOBAL_RNG.lock())
    }

    /// Copy of the default generator's current state
    pub fn snapshot() -> LcgRandom {
        GLOBAL_RNG.lock().clone()
    }
}
