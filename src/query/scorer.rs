//! Exact distance scoring of candidate documents.
//!
//! The similarity of a stored descriptor `s` to the query `q` is derived from
//! the squared Euclidean distance `d = sum((q[i] - s[i])^2)`:
//!
//! - `d <= 1.0`: `2.0 - d`, the near-duplicate regime, in `[1.0, 2.0]`.
//! - `d > 1.0`: `1.0 / d`, in `(0.0, 1.0)` and strictly decreasing in `d`.
//!
//! The result is multiplied by the query boost.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::codec::VectorCodec;
use crate::error::{PhalanxError, Result};
use crate::index::segment::Segment;

/// Trait for per-document scorers.
pub trait Scorer: Send + Sync + Debug {
    /// Score one document. Per-document failures are returned as errors for
    /// which [`PhalanxError::is_per_document`] holds.
    fn score(&self, doc_id: u32) -> Result<f32>;

    /// Explain the score of one document.
    fn explain(&self, doc_id: u32) -> Explanation;

    /// Get the boost factor for this scorer.
    fn boost(&self) -> f32;
}

/// Squared Euclidean distance. Vectors of different length are never compared.
///
/// A distance that is NaN or overflows to infinity cannot be scored and is
/// reported as a decode error, so the document is skipped.
pub fn squared_distance(query: &[f64], stored: &[f64]) -> Result<f64> {
    if query.len() != stored.len() {
        return Err(PhalanxError::dimension_mismatch(query.len(), stored.len()));
    }
    let distance: f64 = query
        .iter()
        .zip(stored)
        .map(|(q, s)| {
            let diff = q - s;
            diff * diff
        })
        .sum();
    if !distance.is_finite() {
        return Err(PhalanxError::decode(format!(
            "distance {distance} to stored descriptor is not finite"
        )));
    }
    Ok(distance)
}

/// Map a squared distance to an unboosted similarity.
pub fn distance_to_similarity(distance: f64) -> f64 {
    if distance <= 1.0 {
        2.0 - distance
    } else {
        1.0 / distance
    }
}

/// Boosted similarity of two descriptors.
pub fn similarity(query: &[f64], stored: &[f64], boost: f32) -> Result<f32> {
    let distance = squared_distance(query, stored)?;
    Ok(distance_to_similarity(distance) as f32 * boost)
}

/// Scores the documents of one segment against a query descriptor.
#[derive(Debug)]
pub struct DistanceScorer<'a> {
    segment: &'a Segment,
    field: &'a str,
    query: &'a [f64],
    boost: f32,
    description: String,
}

impl<'a> DistanceScorer<'a> {
    pub fn new(
        segment: &'a Segment,
        field: &'a str,
        query: &'a [f64],
        boost: f32,
        description: String,
    ) -> Self {
        DistanceScorer {
            segment,
            field,
            query,
            boost,
            description,
        }
    }

    fn stored_descriptor(&self, doc_id: u32) -> Result<Vec<f64>> {
        let bytes = self.segment.stored(self.field, doc_id).ok_or_else(|| {
            PhalanxError::decode(format!(
                "document {doc_id} has no stored value for [{}]",
                self.field
            ))
        })?;
        VectorCodec::decode(bytes)
    }

    fn no_match(&self, doc_id: u32, reason: &str) -> Explanation {
        Explanation::no_match(format!(
            "weight({}) doesn't match id {doc_id}: {reason}",
            self.description
        ))
    }
}

impl Scorer for DistanceScorer<'_> {
    fn score(&self, doc_id: u32) -> Result<f32> {
        let stored = self.stored_descriptor(doc_id)?;
        similarity(self.query, &stored, self.boost)
    }

    fn explain(&self, doc_id: u32) -> Explanation {
        let stored = match self.stored_descriptor(doc_id) {
            Ok(stored) => stored,
            Err(e) => return self.no_match(doc_id, &e.to_string()),
        };
        let distance = match squared_distance(self.query, &stored) {
            Ok(distance) => distance,
            Err(e) => return self.no_match(doc_id, &e.to_string()),
        };

        let raw = distance_to_similarity(distance) as f32;
        let regime = if distance <= 1.0 {
            "image score (2 - distance)"
        } else {
            "image score (1/distance)"
        };

        let mut details = Vec::with_capacity(3);
        if self.boost != 1.0 {
            details.push(Explanation::matched(self.boost, "boost"));
        }
        details.push(Explanation::matched(raw, regime));
        details.push(Explanation::matched(
            distance as f32,
            "squared euclidean distance",
        ));

        Explanation::matched(
            raw * self.boost,
            format!("weight({}), product of:", self.description),
        )
        .with_details(details)
    }

    fn boost(&self) -> f32 {
        self.boost
    }
}

/// Tree describing how a score was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// Whether the document matched.
    pub is_match: bool,
    /// The value this node contributes.
    pub value: f32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Explanation>,
}

impl Explanation {
    pub fn matched<S: Into<String>>(value: f32, description: S) -> Self {
        Explanation {
            is_match: true,
            value,
            description: description.into(),
            details: Vec::new(),
        }
    }

    pub fn no_match<S: Into<String>>(description: S) -> Self {
        Explanation {
            is_match: false,
            value: 0.0,
            description: description.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<Explanation>) -> Self {
        self.details = details;
        self
    }
}
