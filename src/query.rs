//! Query system for descriptor search.

pub mod cache;
pub mod collector;
pub mod descriptor;
pub mod matcher;
pub mod scorer;

use serde::{Deserialize, Serialize};

use crate::index::segment::SegmentId;

pub use cache::{ScoreCache, ScoreKey};
pub use descriptor::{DescriptorQuery, DescriptorQueryBuilder, DescriptorQueryRequest};
pub use scorer::{DistanceScorer, Explanation, Scorer};

/// A search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Segment holding the document.
    pub segment: SegmentId,
    /// Document id local to the segment.
    pub doc_id: u32,
    /// External document id.
    pub id: String,
    /// The relevance score.
    pub score: f32,
}

/// Search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The search hits, best first.
    pub hits: Vec<SearchHit>,
    /// Total number of scored documents.
    pub total_hits: u64,
    /// Maximum score in the results.
    pub max_score: f32,
}
