//! Jitter sources - optional multiplicative noise on intensities
//!
//! Some front-ends wobble intensities a little for visual liveliness. The
//! noise comes from an injectable source so a seeded run is reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default jitter range, half-open
pub const JITTER_RANGE: (f32, f32) = (0.8, 1.2);

/// Produces one multiplicative factor per expanded entry
pub trait JitterSource: Send {
    fn factor(&mut self) -> f32;
}

/// Factor is always 1.0
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    #[inline]
    fn factor(&mut self) -> f32 {
        1.0
    }
}

/// Uniform factor in `[low, high)` from a [`StdRng`]
#[derive(Debug, Clone)]
pub struct UniformJitter {
    rng: StdRng,
    low: f32,
    high: f32,
}

impl UniformJitter {
    /// Reproducible source over [`JITTER_RANGE`]
    pub fn seeded(seed: u64) -> Self {
        UniformJitter {
            rng: StdRng::seed_from_u64(seed),
            low: JITTER_RANGE.0,
            high: JITTER_RANGE.1,
        }
    }

    /// OS-seeded source over [`JITTER_RANGE`]
    pub fn from_entropy() -> Self {
        UniformJitter {
            rng: StdRng::from_entropy(),
            low: JITTER_RANGE.0,
            high: JITTER_RANGE.1,
        }
    }
}

impl JitterSource for UniformJitter {
    fn factor(&mut self) -> f32 {
        self.rng.gen_range(self.low..self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_jitter_reproducible() {
        let mut a = UniformJitter::seeded(42);
        let mut b = UniformJitter::seeded(42);
        for _ in 0..32 {
            assert_eq!(a.factor(), b.factor());
        }
    }

    #[test]
    fn test_jitter_within_range() {
        let mut jitter = UniformJitter::seeded(7);
        for _ in 0..1000 {
            let f = jitter.factor();
            assert!((0.8..1.2).contains(&f), "factor {} out of range", f);
        }
    }

    #[test]
    fn test_no_jitter_is_identity() {
        let mut jitter = NoJitter;
        assert_eq!(jitter.factor(), 1.0);
    }
}
