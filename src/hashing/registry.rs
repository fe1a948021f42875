//! The loaded hash families of a process.
//!
//! [`HashFamilies`] is built once at startup and shared by `Arc` with every
//! writer and searcher. Each family loads independently: a missing or corrupt
//! resource is logged once and leaves only that family unavailable. There is
//! no retry; a new `HashFamilies` has to be built to pick up fixed resources.

use std::fs;
use std::path::Path;

use log::{error, info};

use crate::config::HashingConfig;
use crate::error::{PhalanxError, Result};
use crate::hashing::{HashAlgorithm, HashFunctionFamily};

#[derive(Debug)]
enum Slot {
    Ready(HashFunctionFamily),
    Unavailable(String),
}

impl Slot {
    fn from_load(algorithm: HashAlgorithm, loaded: Result<HashFunctionFamily>) -> Self {
        match loaded {
            Ok(family) => {
                info!(
                    "Loaded {algorithm} hash functions ({} functions, dimension {})",
                    family.num_functions(),
                    family.dimension()
                );
                Slot::Ready(family)
            }
            Err(e) => {
                error!("Failed to initialize {algorithm} hash functions: {e}");
                Slot::Unavailable(e.to_string())
            }
        }
    }
}

/// Immutable set of hash families, one slot per [`HashAlgorithm`].
#[derive(Debug)]
pub struct HashFamilies {
    bit_sampling: Slot,
    lsh: Slot,
}

impl HashFamilies {
    /// Load families from in-memory resources. `None` marks a missing resource.
    pub fn from_resources(bit_sampling: Option<&[u8]>, lsh: Option<&[u8]>) -> Self {
        HashFamilies {
            bit_sampling: Slot::from_load(
                HashAlgorithm::BitSampling,
                load_bytes(HashAlgorithm::BitSampling, bit_sampling),
            ),
            lsh: Slot::from_load(HashAlgorithm::Lsh, load_bytes(HashAlgorithm::Lsh, lsh)),
        }
    }

    /// Load families from the resource files named in `config`.
    ///
    /// Falls back to [`generate`](Self::generate) when no resource directory
    /// is configured.
    pub fn load(config: &HashingConfig) -> Self {
        match (config.bit_sampling_path(), config.lsh_path()) {
            (Some(bit_sampling), Some(lsh)) => HashFamilies {
                bit_sampling: Slot::from_load(
                    HashAlgorithm::BitSampling,
                    load_file(HashAlgorithm::BitSampling, &bit_sampling),
                ),
                lsh: Slot::from_load(HashAlgorithm::Lsh, load_file(HashAlgorithm::Lsh, &lsh)),
            },
            _ => Self::generate(config),
        }
    }

    /// Generate both families from the configured seed.
    pub fn generate(config: &HashingConfig) -> Self {
        Self::from_families(
            Some(HashFunctionFamily::generate(
                HashAlgorithm::BitSampling,
                config,
                config.seed,
            )),
            Some(HashFunctionFamily::generate(
                HashAlgorithm::Lsh,
                config,
                config.seed.wrapping_add(1),
            )),
        )
    }

    /// Wrap already loaded families.
    pub fn from_families(
        bit_sampling: Option<HashFunctionFamily>,
        lsh: Option<HashFunctionFamily>,
    ) -> Self {
        let slot = |algorithm: HashAlgorithm, family: Option<HashFunctionFamily>| match family {
            Some(family) if family.algorithm() == algorithm => Slot::Ready(family),
            Some(family) => Slot::Unavailable(format!(
                "{} family supplied for {algorithm}",
                family.algorithm()
            )),
            None => Slot::Unavailable("not loaded".to_string()),
        };

        HashFamilies {
            bit_sampling: slot(HashAlgorithm::BitSampling, bit_sampling),
            lsh: slot(HashAlgorithm::Lsh, lsh),
        }
    }

    fn slot(&self, algorithm: HashAlgorithm) -> &Slot {
        match algorithm {
            HashAlgorithm::BitSampling => &self.bit_sampling,
            HashAlgorithm::Lsh => &self.lsh,
        }
    }

    /// The family for `algorithm`, or a configuration error if it failed to load.
    pub fn get(&self, algorithm: HashAlgorithm) -> Result<&HashFunctionFamily> {
        match self.slot(algorithm) {
            Slot::Ready(family) => Ok(family),
            Slot::Unavailable(reason) => Err(PhalanxError::configuration(format!(
                "{algorithm} hash functions are unavailable: {reason}"
            ))),
        }
    }

    pub fn is_available(&self, algorithm: HashAlgorithm) -> bool {
        matches!(self.slot(algorithm), Slot::Ready(_))
    }

    /// Algorithms that loaded successfully.
    pub fn available(&self) -> Vec<HashAlgorithm> {
        HashAlgorithm::ALL
            .into_iter()
            .filter(|algorithm| self.is_available(*algorithm))
            .collect()
    }

    /// Iterate over the loaded families.
    pub fn families(&self) -> impl Iterator<Item = &HashFunctionFamily> {
        HashAlgorithm::ALL
            .into_iter()
            .filter_map(|algorithm| self.get(algorithm).ok())
    }
}

fn load_bytes(algorithm: HashAlgorithm, bytes: Option<&[u8]>) -> Result<HashFunctionFamily> {
    let bytes = bytes.ok_or_else(|| PhalanxError::initialization("hash resource not found"))?;
    HashFunctionFamily::load(algorithm, bytes)
}

fn load_file(algorithm: HashAlgorithm, path: &Path) -> Result<HashFunctionFamily> {
    let bytes = fs::read(path).map_err(|e| {
        PhalanxError::initialization(format!("cannot read {}: {e}", path.display()))
    })?;
    HashFunctionFamily::load(algorithm, &bytes)
}
