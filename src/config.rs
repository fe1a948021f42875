//! Configuration types.
//!
//! Everything is serde (de)serializable so a deployment can keep its settings
//! in a single JSON file:
//!
//! ```json
//! {
//!   "hashing": { "resource_dir": "/etc/phalanx/hash", "seed": 42 },
//!   "search": { "parallel_segments": true, "thread_pool_size": 4 }
//! }
//! ```
//!
//! Missing keys fall back to [`Default`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PhalanxError, Result};

/// Default resource file name of the bit sampling family.
pub const BIT_SAMPLING_FILE: &str = "LshBitSampling.obj";

/// Default resource file name of the LSH family.
pub const LSH_HASH_FILE: &str = "lshHashFunctions.obj";

/// Top level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhalanxConfig {
    /// Hash family loading and generation.
    pub hashing: HashingConfig,
    /// Query execution.
    pub search: SearchConfig,
}

impl PhalanxConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: PhalanxConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every section is usable.
    pub fn validate(&self) -> Result<()> {
        self.hashing.validate()?;
        self.search.validate()
    }
}

/// Where hash resources come from and how fresh families are generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    /// Directory holding the serialized hash resources.
    ///
    /// When unset, families are generated in-process from `seed`.
    pub resource_dir: Option<PathBuf>,

    /// File name of the bit sampling resource inside `resource_dir`.
    pub bit_sampling_file: String,

    /// File name of the LSH resource inside `resource_dir`.
    pub lsh_file: String,

    /// Seed used when generating families.
    pub seed: u64,

    /// Shape of generated bit sampling families.
    pub bit_sampling: BitSamplingConfig,

    /// Shape of generated LSH families.
    pub lsh: LshConfig,
}

impl Default for HashingConfig {
    fn default() -> Self {
        HashingConfig {
            resource_dir: None,
            bit_sampling_file: BIT_SAMPLING_FILE.to_string(),
            lsh_file: LSH_HASH_FILE.to_string(),
            seed: 42,
            bit_sampling: BitSamplingConfig::default(),
            lsh: LshConfig::default(),
        }
    }
}

impl HashingConfig {
    /// Path of the bit sampling resource, if a resource directory is set.
    pub fn bit_sampling_path(&self) -> Option<PathBuf> {
        self.resource_dir
            .as_ref()
            .map(|dir| dir.join(&self.bit_sampling_file))
    }

    /// Path of the LSH resource, if a resource directory is set.
    pub fn lsh_path(&self) -> Option<PathBuf> {
        self.resource_dir.as_ref().map(|dir| dir.join(&self.lsh_file))
    }

    /// Check the generation parameters.
    pub fn validate(&self) -> Result<()> {
        self.bit_sampling.validate()?;
        self.lsh.validate()
    }
}

/// Shape of a bit sampling family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitSamplingConfig {
    /// Hyperplanes per function, i.e. bits per hash code.
    pub bits: u32,
    /// Number of hash functions (codes per vector).
    pub num_functions: usize,
    /// Maximum descriptor dimension.
    pub dimension: usize,
}

impl Default for BitSamplingConfig {
    fn default() -> Self {
        BitSamplingConfig {
            bits: 12,
            num_functions: 100,
            dimension: 640,
        }
    }
}

impl BitSamplingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bits == 0 || self.bits > 31 {
            return Err(PhalanxError::invalid_argument(format!(
                "bit sampling bits must be in 1..=31, got {}",
                self.bits
            )));
        }
        if self.num_functions == 0 || self.dimension == 0 {
            return Err(PhalanxError::invalid_argument(
                "bit sampling needs at least one function and one dimension",
            ));
        }
        Ok(())
    }
}

/// Shape of a p-stable LSH family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LshConfig {
    /// Number of hash functions (codes per vector).
    pub num_functions: usize,
    /// Bucket width of each projection.
    pub bin_width: f64,
    /// Maximum descriptor dimension.
    pub dimension: usize,
}

impl Default for LshConfig {
    fn default() -> Self {
        LshConfig {
            num_functions: 50,
            bin_width: 10.0,
            dimension: 640,
        }
    }
}

impl LshConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.bin_width.is_finite() && self.bin_width > 0.0) {
            return Err(PhalanxError::invalid_argument(format!(
                "LSH bin width must be positive, got {}",
                self.bin_width
            )));
        }
        if self.num_functions == 0 || self.dimension == 0 {
            return Err(PhalanxError::invalid_argument(
                "LSH needs at least one function and one dimension",
            ));
        }
        Ok(())
    }
}

/// Query execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Score segments on the thread pool instead of the calling thread.
    pub parallel_segments: bool,
    /// Thread pool size. Defaults to the number of CPUs.
    pub thread_pool_size: Option<usize>,
    /// Number of hits returned when the caller does not ask for a limit.
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            parallel_segments: true,
            thread_pool_size: None,
            default_limit: 10,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.thread_pool_size == Some(0) {
            return Err(PhalanxError::invalid_argument(
                "thread_pool_size must be greater than zero",
            ));
        }
        if self.default_limit == 0 {
            return Err(PhalanxError::invalid_argument(
                "default_limit must be greater than zero",
            ));
        }
        Ok(())
    }
}
