//! # Phalanx
//!
//! Approximate nearest-neighbour search over fixed-length image descriptors.
//!
//! ## Features
//!
//! - Bit-sampling and p-stable LSH hash families
//! - Hash codes indexed as ordinary terms next to the stored descriptor
//! - Candidate retrieval by hash collision, exact re-ranking by distance
//! - Parallel per-segment scoring with per-query deduplication

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod hashing;
pub mod index;
pub mod query;
pub mod search;

pub mod prelude {
    pub use crate::codec::VectorCodec;
    pub use crate::config::{HashingConfig, PhalanxConfig, SearchConfig};
    pub use crate::error::{PhalanxError, Result};
    pub use crate::hashing::{HashAlgorithm, HashFamilies, HashFunctionFamily};
    pub use crate::index::{Document, IndexReader, IndexWriter, SegmentId};
    pub use crate::query::{DescriptorQuery, DescriptorQueryRequest, SearchHit, SearchResults};
    pub use crate::search::{SearchRequest, Searcher};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
