//! Hash function families used for candidate generation.
//!
//! A family maps a descriptor to a fixed-length sequence of integer bucket ids.
//! Documents whose descriptors share at least one bucket id with the query are
//! candidates for exact re-scoring. Two families are supported:
//!
//! - [`BitSampling`]: sign bits of random hyperplane projections.
//! - [`LocalitySensitiveHashing`]: quantized Gaussian projections.
//!
//! Families are loaded once from a serialized resource (see [`resource`]) and
//! never change afterwards. [`HashFamilies`] bundles the loaded families into the
//! service object handed to writers and searchers.

pub mod bit_sampling;
pub mod lsh;
pub mod registry;
pub(crate) mod resource;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::HashingConfig;
use crate::error::{PhalanxError, Result};

pub use bit_sampling::BitSampling;
pub use lsh::LocalitySensitiveHashing;
pub use registry::HashFamilies;

/// Identifies a hash family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HashAlgorithm {
    BitSampling,
    Lsh,
}

impl HashAlgorithm {
    /// Every supported algorithm.
    pub const ALL: [HashAlgorithm; 2] = [HashAlgorithm::BitSampling, HashAlgorithm::Lsh];

    /// Canonical name, as accepted in queries.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::BitSampling => "BIT_SAMPLING",
            HashAlgorithm::Lsh => "LSH",
        }
    }

    /// Name used in sidecar field names.
    pub fn short_name(&self) -> &'static str {
        match self {
            HashAlgorithm::BitSampling => "bit_sampling",
            HashAlgorithm::Lsh => "lsh",
        }
    }

    /// Name of the indexed field holding this algorithm's codes for `field`.
    pub fn sidecar_field(&self, field: &str) -> String {
        format!("{field}.hash.{}", self.short_name())
    }

    pub(crate) fn tag(&self) -> u8 {
        match self {
            HashAlgorithm::BitSampling => 0,
            HashAlgorithm::Lsh => 1,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(HashAlgorithm::BitSampling),
            1 => Some(HashAlgorithm::Lsh),
            _ => None,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = PhalanxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "BIT_SAMPLING" => Ok(HashAlgorithm::BitSampling),
            "LSH" => Ok(HashAlgorithm::Lsh),
            _ => Err(PhalanxError::configuration(format!(
                "unrecognized hash [{s}], expected one of BIT_SAMPLING, LSH"
            ))),
        }
    }
}

/// A loaded, immutable hash function family.
#[derive(Debug, Clone, PartialEq)]
pub enum HashFunctionFamily {
    BitSampling(BitSampling),
    Lsh(LocalitySensitiveHashing),
}

impl HashFunctionFamily {
    /// Parse a serialized resource into a family of the expected algorithm.
    pub fn load(algorithm: HashAlgorithm, bytes: &[u8]) -> Result<Self> {
        let (tag, payload) = resource::read_resource(bytes)?;
        match HashAlgorithm::from_tag(tag) {
            Some(found) if found == algorithm => {}
            Some(found) => {
                return Err(PhalanxError::initialization(format!(
                    "resource holds {found} hash functions, expected {algorithm}"
                )));
            }
            None => {
                return Err(PhalanxError::initialization(format!(
                    "unknown hash algorithm tag {tag}"
                )));
            }
        }

        let family = match algorithm {
            HashAlgorithm::BitSampling => {
                let family: BitSampling = bincode::deserialize(payload).map_err(corrupt)?;
                family.validate()?;
                HashFunctionFamily::BitSampling(family)
            }
            HashAlgorithm::Lsh => {
                let family: LocalitySensitiveHashing =
                    bincode::deserialize(payload).map_err(corrupt)?;
                family.validate()?;
                HashFunctionFamily::Lsh(family)
            }
        };
        Ok(family)
    }

    /// Serialize the family into the resource format read by [`load`](Self::load).
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = match self {
            HashFunctionFamily::BitSampling(family) => bincode::serialize(family),
            HashFunctionFamily::Lsh(family) => bincode::serialize(family),
        }
        .map_err(|e| PhalanxError::serialization(format!("failed to encode hash family: {e}")))?;

        resource::write_resource(self.algorithm().tag(), &payload)
    }

    /// Generate a fresh family from a seed.
    pub fn generate(algorithm: HashAlgorithm, config: &HashingConfig, seed: u64) -> Self {
        match algorithm {
            HashAlgorithm::BitSampling => {
                HashFunctionFamily::BitSampling(BitSampling::generate(&config.bit_sampling, seed))
            }
            HashAlgorithm::Lsh => {
                HashFunctionFamily::Lsh(LocalitySensitiveHashing::generate(&config.lsh, seed))
            }
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            HashFunctionFamily::BitSampling(_) => HashAlgorithm::BitSampling,
            HashFunctionFamily::Lsh(_) => HashAlgorithm::Lsh,
        }
    }

    /// Number of functions, i.e. the length of every code sequence.
    pub fn num_functions(&self) -> usize {
        match self {
            HashFunctionFamily::BitSampling(family) => family.num_functions(),
            HashFunctionFamily::Lsh(family) => family.num_functions(),
        }
    }

    /// Largest descriptor dimension the family accepts.
    pub fn dimension(&self) -> usize {
        match self {
            HashFunctionFamily::BitSampling(family) => family.dimension(),
            HashFunctionFamily::Lsh(family) => family.dimension(),
        }
    }

    /// Compute the ordered hash codes of a descriptor.
    ///
    /// The result always has [`num_functions`](Self::num_functions) entries
    /// and depends only on the vector and the family.
    pub fn generate_hashes(&self, vector: &[f64]) -> Result<Vec<i32>> {
        match self {
            HashFunctionFamily::BitSampling(family) => family.generate_hashes(vector),
            HashFunctionFamily::Lsh(family) => family.generate_hashes(vector),
        }
    }
}

fn corrupt(e: bincode::Error) -> PhalanxError {
    PhalanxError::initialization(format!("corrupt hash resource payload: {e}"))
}

/// Descriptors may be shorter than the family dimension; trailing projection
/// components are then ignored.
pub(crate) fn check_input(vector: &[f64], dimension: usize) -> Result<()> {
    if vector.is_empty() {
        return Err(PhalanxError::invalid_argument("cannot hash an empty descriptor"));
    }
    if vector.len() > dimension {
        return Err(PhalanxError::invalid_argument(format!(
            "descriptor has {} dimensions, hash functions support at most {dimension}",
            vector.len()
        )));
    }
    Ok(())
}

#[inline]
pub(crate) fn dot(vector: &[f64], projection: &[f64]) -> f64 {
    vector.iter().zip(projection).map(|(a, b)| a * b).sum()
}
