//! Collector implementations for gathering search results.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use crate::error::Result;

/// A scored local document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: u32,
    pub score: f32,
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower scores come first, ties keep the lower doc id.
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// Trait for collecting search results.
pub trait Collector: Send + Debug {
    /// Collect a document hit.
    fn collect(&mut self, doc_id: u32, score: f32) -> Result<()>;

    /// Get the final results, best first.
    fn results(&self) -> Vec<ScoredDoc>;

    /// Get the total number of hits collected.
    fn total_hits(&self) -> u64;

    /// Check if this collector needs more results.
    fn needs_more(&self) -> bool;
}

/// A collector that keeps the top N documents by score.
#[derive(Debug)]
pub struct TopDocsCollector {
    /// Maximum number of documents to collect.
    max_docs: usize,
    /// Minimum score threshold.
    min_score: f32,
    /// Stop as soon as `max_docs` hits are held.
    terminate_early: bool,
    /// Collected hits (min-heap based on score).
    hits: BinaryHeap<ScoredDoc>,
    /// Total number of documents processed.
    total_hits: u64,
}

impl TopDocsCollector {
    /// Create a new top docs collector.
    pub fn new(max_docs: usize) -> Self {
        TopDocsCollector {
            max_docs,
            min_score: 0.0,
            terminate_early: false,
            hits: BinaryHeap::new(),
            total_hits: 0,
        }
    }

    /// Create a new top docs collector with minimum score threshold.
    pub fn with_min_score(max_docs: usize, min_score: f32) -> Self {
        TopDocsCollector {
            min_score,
            ..Self::new(max_docs)
        }
    }

    /// Stop collecting once `max_docs` documents are held.
    ///
    /// The result is then the first `max_docs` candidates in doc id order, not
    /// the best ones.
    pub fn terminate_early(mut self, terminate_early: bool) -> Self {
        self.terminate_early = terminate_early;
        self
    }

    /// Get the maximum number of documents to collect.
    pub fn max_docs(&self) -> usize {
        self.max_docs
    }
}

impl Collector for TopDocsCollector {
    fn collect(&mut self, doc_id: u32, score: f32) -> Result<()> {
        // Check minimum score threshold
        if score < self.min_score {
            return Ok(());
        }
        self.total_hits += 1;

        if self.max_docs == 0 {
            return Ok(());
        }

        let scored_doc = ScoredDoc { doc_id, score };
        if self.hits.len() < self.max_docs {
            self.hits.push(scored_doc);
        } else if let Some(worst) = self.hits.peek() {
            if score > worst.score {
                self.hits.pop();
                self.hits.push(scored_doc);
            }
        }

        Ok(())
    }

    fn results(&self) -> Vec<ScoredDoc> {
        let mut results: Vec<_> = self.hits.iter().copied().collect();
        // The heap orders worst first.
        results.sort();
        results
    }

    fn total_hits(&self) -> u64 {
        self.total_hits
    }

    fn needs_more(&self) -> bool {
        !self.terminate_early || self.hits.len() < self.max_docs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_docs_collector() {
        let mut collector = TopDocsCollector::new(3);

        assert_eq!(collector.max_docs(), 3);
        assert_eq!(collector.total_hits(), 0);
        assert!(collector.needs_more());

        collector.collect(1, 0.5).unwrap();
        collector.collect(2, 2.0).unwrap();
        collector.collect(3, 0.1).unwrap();
        collector.collect(4, 1.2).unwrap();

        assert_eq!(collector.total_hits(), 4);
        assert!(collector.needs_more());

        let results = collector.results();
        let docs: Vec<u32> = results.iter().map(|d| d.doc_id).collect();
        assert_eq!(docs, vec![2, 4, 1]);
    }

    #[test]
    fn test_ties_prefer_lower_doc_id() {
        let mut collector = TopDocsCollector::new(2);
        collector.collect(5, 1.0).unwrap();
        collector.collect(3, 1.0).unwrap();
        collector.collect(9, 1.0).unwrap();

        let docs: Vec<u32> = collector.results().iter().map(|d| d.doc_id).collect();
        assert_eq!(docs, vec![3, 5]);
    }

    #[test]
    fn test_min_score() {
        let mut collector = TopDocsCollector::with_min_score(10, 1.0);
        collector.collect(1, 0.5).unwrap();
        collector.collect(2, 1.5).unwrap();

        assert_eq!(collector.total_hits(), 1);
        assert_eq!(collector.results().len(), 1);
    }

    #[test]
    fn test_early_termination() {
        let mut collector = TopDocsCollector::new(2).terminate_early(true);
        collector.collect(1, 0.5).unwrap();
        assert!(collector.needs_more());
        collector.collect(2, 0.7).unwrap();
        assert!(!collector.needs_more());
        assert_eq!(collector.total_hits(), 2);
    }
}
