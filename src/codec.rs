//! Binary layout of stored descriptors.
//!
//! A descriptor is stored as one 8-byte IEEE-754 double per dimension in
//! big-endian order, with no header. The dimension is implied by the blob
//! length, so a valid blob is always a non-zero multiple of 8 bytes long.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{PhalanxError, Result};

/// Width of one encoded dimension in bytes.
pub const BYTES_PER_DIMENSION: usize = 8;

/// Encodes and decodes feature vectors to and from their stored form.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorCodec;

impl VectorCodec {
    /// Encode a descriptor into its stored form.
    pub fn encode(vector: &[f64]) -> Vec<u8> {
        let mut bytes = vec![0u8; vector.len() * BYTES_PER_DIMENSION];
        BigEndian::write_f64_into(vector, &mut bytes);
        bytes
    }

    /// Decode a stored descriptor.
    pub fn decode(bytes: &[u8]) -> Result<Vec<f64>> {
        let dimension = Self::dimension(bytes)?;
        let mut vector = vec![0f64; dimension];
        BigEndian::read_f64_into(bytes, &mut vector);
        Ok(vector)
    }

    /// Dimension implied by the length of a stored descriptor.
    pub fn dimension(bytes: &[u8]) -> Result<usize> {
        if bytes.is_empty() {
            return Err(PhalanxError::decode("empty descriptor"));
        }
        if bytes.len() % BYTES_PER_DIMENSION != 0 {
            return Err(PhalanxError::decode(format!(
                "descriptor length {} is not a multiple of {}",
                bytes.len(),
                BYTES_PER_DIMENSION
            )));
        }
        Ok(bytes.len() / BYTES_PER_DIMENSION)
    }
}
