//! # Actuator noise
//!
//! Gaussian noise applied to the commanded motion, modelling a mismatch
//! between what the controller asks for and what the robot does. The
//! generator is always seeded explicitly so runs are reproducible.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the actuator noise.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoiseParams {
    /// How the noise is combined with the commanded motion
    pub kind: NoiseKind,

    /// Mean of the normal distribution
    pub mean: f64,

    /// Standard deviation of the normal distribution
    pub std_dev: f64,

    /// Seed of the random number generator
    pub seed: u64
}

/// Seeded Gaussian noise source.
#[derive(Debug, Clone)]
pub struct NoiseGenerator {
    kind: NoiseKind,
    dist: Normal<f64>,
    rng: StdRng
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub enum NoiseKind {
    /// The whole motion is scaled by one sample per step, e.g. a motor
    /// which is consistently weak (mean below 1).
    Multiplicative,

    /// An independent sample is added to each axis of the motion.
    Additive
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NoiseGenerator {
    /// Create a new generator from the parameters.
    ///
    /// Fails if the standard deviation is negative or not finite.
    pub fn new(params: &NoiseParams) -> Result<Self, NormalError> {
        Ok(Self {
            kind: params.kind,
            dist: Normal::new(params.mean, params.std_dev)?,
            rng: StdRng::seed_from_u64(params.seed)
        })
    }

    /// Draw a single sample.
    pub fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }

    /// Apply noise to a commanded motion.
    pub fn perturb(&mut self, motion_m: Vector2<f64>) -> Vector2<f64> {
        match self.kind {
            NoiseKind::Multiplicative => motion_m * self.sample(),
            NoiseKind::Additive => {
                let x = self.sample();
                let y = self.sample();
                motion_m + Vector2::new(x, y)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(kind: NoiseKind, seed: u64) -> NoiseParams {
        NoiseParams {
            kind,
            mean: 0.9,
            std_dev: 0.05,
            seed
        }
    }

    #[test]
    fn test_deterministic_seed() {
        let mut noise_0 = NoiseGenerator::new(&params(NoiseKind::Additive, 42)).unwrap();
        let mut noise_1 = NoiseGenerator::new(&params(NoiseKind::Additive, 42)).unwrap();

        for _ in 0..100 {
            assert_eq!(noise_0.sample(), noise_1.sample());
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut noise_0 = NoiseGenerator::new(&params(NoiseKind::Additive, 1)).unwrap();
        let mut noise_1 = NoiseGenerator::new(&params(NoiseKind::Additive, 2)).unwrap();

        let a: Vec<f64> = (0..10).map(|_| noise_0.sample()).collect();
        let b: Vec<f64> = (0..10).map(|_| noise_1.sample()).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_std_dev() {
        let mut noise = NoiseGenerator::new(&NoiseParams {
            kind: NoiseKind::Multiplicative,
            mean: 0.5,
            std_dev: 0.0,
            seed: 7
        }).unwrap();

        assert_eq!(noise.perturb(Vector2::new(2.0, -4.0)), Vector2::new(1.0, -2.0));
    }

    #[test]
    fn test_multiplicative_keeps_direction() {
        let mut noise = NoiseGenerator::new(&params(NoiseKind::Multiplicative, 3)).unwrap();
        let motion = Vector2::new(0.5, 0.0);

        for _ in 0..20 {
            let out = noise.perturb(motion);
            assert_eq!(out[1], 0.0);
            assert!(out[0] > 0.0);
        }
    }

    #[test]
    fn test_bad_std_dev() {
        let res = NoiseGenerator::new(&NoiseParams {
            kind: NoiseKind::Additive,
            mean: 0.0,
            std_dev: -1.0,
            seed: 0
        });
        assert!(res.is_err());
    }
}
