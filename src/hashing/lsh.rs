//! p-stable locality-sensitive hashing.
//!
//! Each function projects the vector onto a Gaussian direction `a`, shifts it
//! by an offset `b` drawn from `[0, w)` and cuts the line into buckets of
//! width `w`: `h(v) = floor((a . v + b) / w)`.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::LshConfig;
use crate::error::{PhalanxError, Result};
use crate::hashing::{check_input, dot};

/// One projection of the family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    direction: Vec<f64>,
    offset: f64,
}

/// A loaded LSH family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalitySensitiveHashing {
    dimension: usize,
    bin_width: f64,
    functions: Vec<Projection>,
}

impl LocalitySensitiveHashing {
    /// Generate a family from a seed.
    pub fn generate(config: &LshConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let functions = (0..config.num_functions)
            .map(|_| Projection {
                direction: (0..config.dimension).map(|_| gaussian(&mut rng)).collect(),
                offset: rng.random_range(0.0..config.bin_width),
            })
            .collect();

        LocalitySensitiveHashing {
            dimension: config.dimension,
            bin_width: config.bin_width,
            functions,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.bin_width.is_finite() && self.bin_width > 0.0) {
            return Err(PhalanxError::initialization(format!(
                "LSH family has invalid bin width {}",
                self.bin_width
            )));
        }
        if self.dimension == 0 || self.functions.is_empty() {
            return Err(PhalanxError::initialization("LSH family is empty"));
        }
        if let Some(pos) = self
            .functions
            .iter()
            .position(|f| f.direction.len() != self.dimension)
        {
            return Err(PhalanxError::initialization(format!(
                "LSH function {pos} has {} components, expected {}",
                self.functions[pos].direction.len(),
                self.dimension
            )));
        }
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    /// Compute one bucket id per function.
    pub fn generate_hashes(&self, vector: &[f64]) -> Result<Vec<i32>> {
        check_input(vector, self.dimension)?;

        Ok(self
            .functions
            .iter()
            .map(|f| ((dot(vector, &f.direction) + f.offset) / self.bin_width).floor() as i32)
            .collect())
    }
}

/// Standard normal sample (Box-Muller).
fn gaussian(rng: &mut StdRng) -> f64 {
    // 1 - [0, 1) keeps the logarithm finite.
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> LshConfig {
        LshConfig {
            num_functions: 20,
            bin_width: 4.0,
            dimension: 16,
        }
    }

    #[test]
    fn test_shape() {
        let family = LocalitySensitiveHashing::generate(&small_config(), 5);
        assert_eq!(family.num_functions(), 20);
        assert_eq!(family.dimension(), 16);
        assert!(family.validate().is_ok());
        assert_eq!(family.generate_hashes(&[0.5; 16]).unwrap().len(), 20);
    }

    #[test]
    fn test_offsets_within_bin() {
        let family = LocalitySensitiveHashing::generate(&small_config(), 5);
        assert!(
            family
                .functions
                .iter()
                .all(|f| (0.0..4.0).contains(&f.offset))
        );
    }

    #[test]
    fn test_zero_vector_lands_in_bucket_zero() {
        // a . 0 + b = b, and 0 <= b < w.
        let family = LocalitySensitiveHashing::generate(&small_config(), 11);
        let codes = family.generate_hashes(&[0.0; 16]).unwrap();
        assert!(codes.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_nearby_vectors_share_buckets() {
        let family = LocalitySensitiveHashing::generate(&small_config(), 2);
        let v: Vec<f64> = (0..16).map(|i| i as f64 * 0.25).collect();
        let near: Vec<f64> = v.iter().map(|x| x + 1e-9).collect();
        let far: Vec<f64> = v.iter().map(|x| x + 1000.0).collect();

        let codes = family.generate_hashes(&v).unwrap();
        let near_codes = family.generate_hashes(&near).unwrap();
        let far_codes = family.generate_hashes(&far).unwrap();

        let shared = |other: &[i32]| codes.iter().zip(other).filter(|(a, b)| a == b).count();
        assert!(shared(&near_codes) >= 18);
        assert!(shared(&far_codes) < shared(&near_codes));
    }

    #[test]
    fn test_invalid_bin_width_rejected() {
        let mut family = LocalitySensitiveHashing::generate(&small_config(), 1);
        family.bin_width = f64::NAN;
        assert!(family.validate().is_err());
    }
}
