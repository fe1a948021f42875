//! Error types for the Phalanx library.
//!
//! All errors are represented by the [`PhalanxError`] enum. The variants follow
//! the way failures propagate through a descriptor query:
//!
//! - [`PhalanxError::Initialization`]: a hash resource could not be loaded.
//!   The affected hash family stays unavailable, everything else keeps working.
//! - [`PhalanxError::Configuration`]: the query itself is unusable (missing or
//!   unknown hash family, empty descriptor). Rejected before the index is read.
//! - [`PhalanxError::DimensionMismatch`] and [`PhalanxError::Decode`]: scoped to
//!   a single document. The searcher skips that document and continues.
//!
//! # Examples
//!
//! ```
//! use phalanx::error::{PhalanxError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(PhalanxError::configuration("No hash found"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Phalanx operations.
#[derive(Error, Debug)]
pub enum PhalanxError {
    /// I/O errors (resource files, document files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A hash function resource is missing or corrupt.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// The query omits or misnames a required parameter.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Query and stored descriptors disagree on dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A stored descriptor could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Index-related errors
    #[error("Index error: {0}")]
    Index(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with PhalanxError.
pub type Result<T> = std::result::Result<T, PhalanxError>;

impl PhalanxError {
    /// Create a new initialization error.
    pub fn initialization<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Initialization(msg.into())
    }

    /// Create a new configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Configuration(msg.into())
    }

    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        PhalanxError::DimensionMismatch { expected, actual }
    }

    /// Create a new decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Decode(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Index(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        PhalanxError::InvalidArgument(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        PhalanxError::SerializationError(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Whether this error is scoped to a single document.
    ///
    /// Such errors never abort a query; the offending document is skipped.
    pub fn is_per_document(&self) -> bool {
        matches!(
            self,
            PhalanxError::DimensionMismatch { .. } | PhalanxError::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = PhalanxError::configuration("No hash found");
        assert_eq!(error.to_string(), "Configuration error: No hash found");

        let error = PhalanxError::initialization("missing resource");
        assert_eq!(error.to_string(), "Initialization error: missing resource");

        let error = PhalanxError::dimension_mismatch(24, 5);
        assert_eq!(error.to_string(), "Dimension mismatch: expected 24, got 5");
    }

    #[test]
    fn test_per_document_errors() {
        assert!(PhalanxError::decode("truncated").is_per_document());
        assert!(PhalanxError::dimension_mismatch(3, 4).is_per_document());
        assert!(!PhalanxError::configuration("bad").is_per_document());
        assert!(!PhalanxError::initialization("bad").is_per_document());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let phalanx_error = PhalanxError::from(io_error);

        match phalanx_error {
            PhalanxError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
