//! Bit sampling hash functions.
//!
//! Each function is a bundle of `bits` random hyperplanes. A vector's code for
//! the function is the integer whose bits record on which side of each plane
//! the vector falls, most significant bit first. Vectors separated by a small
//! angle agree on most signs and therefore share codes for many functions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::BitSamplingConfig;
use crate::error::{PhalanxError, Result};
use crate::hashing::{check_input, dot};

/// A loaded bit sampling family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BitSampling {
    bits: u32,
    dimension: usize,
    /// One entry per function, `bits * dimension` plane components each.
    functions: Vec<Vec<f64>>,
}

impl BitSampling {
    /// Generate a family with hyperplane components drawn uniformly from [-1, 1).
    pub fn generate(config: &BitSamplingConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let plane_len = config.bits as usize * config.dimension;

        let functions = (0..config.num_functions)
            .map(|_| {
                (0..plane_len)
                    .map(|_| rng.random_range(-1.0..1.0))
                    .collect()
            })
            .collect();

        BitSampling {
            bits: config.bits,
            dimension: config.dimension,
            functions,
        }
    }

    /// Check the invariants a deserialized family must satisfy.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.bits == 0 || self.bits > 31 {
            return Err(PhalanxError::initialization(format!(
                "bit sampling family has {} bits per code",
                self.bits
            )));
        }
        if self.dimension == 0 || self.functions.is_empty() {
            return Err(PhalanxError::initialization(
                "bit sampling family is empty",
            ));
        }
        let plane_len = self.bits as usize * self.dimension;
        if let Some(pos) = self.functions.iter().position(|f| f.len() != plane_len) {
            return Err(PhalanxError::initialization(format!(
                "bit sampling function {pos} has {} components, expected {plane_len}",
                self.functions[pos].len()
            )));
        }
        Ok(())
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    /// Compute one code per function.
    pub fn generate_hashes(&self, vector: &[f64]) -> Result<Vec<i32>> {
        check_input(vector, self.dimension)?;

        Ok(self
            .functions
            .iter()
            .map(|planes| {
                planes
                    .chunks_exact(self.dimension)
                    .fold(0i32, |code, plane| (code << 1) | (dot(vector, plane) > 0.0) as i32)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BitSamplingConfig {
        BitSamplingConfig {
            bits: 8,
            num_functions: 16,
            dimension: 32,
        }
    }

    #[test]
    fn test_shape() {
        let family = BitSampling::generate(&small_config(), 1);
        assert_eq!(family.num_functions(), 16);
        assert_eq!(family.dimension(), 32);
        assert!(family.validate().is_ok());

        let codes = family.generate_hashes(&[1.0; 10]).unwrap();
        assert_eq!(codes.len(), 16);
        assert!(codes.iter().all(|&c| (0..256).contains(&c)));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = BitSampling::generate(&small_config(), 9);
        let b = BitSampling::generate(&small_config(), 9);
        let c = BitSampling::generate(&small_config(), 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_opposite_vectors_flip_all_bits() {
        let family = BitSampling::generate(&small_config(), 3);
        let v: Vec<f64> = (0..32).map(|i| (i as f64).sin() + 0.1).collect();
        let neg: Vec<f64> = v.iter().map(|x| -x).collect();

        let codes = family.generate_hashes(&v).unwrap();
        let flipped = family.generate_hashes(&neg).unwrap();
        for (a, b) in codes.iter().zip(flipped.iter()) {
            assert_eq!(a ^ b, 0xff);
        }
    }

    #[test]
    fn test_scale_invariance() {
        let family = BitSampling::generate(&small_config(), 3);
        let v: Vec<f64> = (0..20).map(|i| i as f64 - 7.5).collect();
        let scaled: Vec<f64> = v.iter().map(|x| x * 1000.0).collect();
        assert_eq!(
            family.generate_hashes(&v).unwrap(),
            family.generate_hashes(&scaled).unwrap()
        );
    }

    #[test]
    fn test_ragged_family_rejected() {
        let mut family = BitSampling::generate(&small_config(), 1);
        family.functions[3].pop();
        assert!(matches!(
            family.validate(),
            Err(PhalanxError::Initialization(_))
        ));
    }

    #[test]
    fn test_vector_longer_than_family() {
        let family = BitSampling::generate(&small_config(), 1);
        assert!(family.generate_hashes(&[0.0; 33]).is_err());
    }
}
