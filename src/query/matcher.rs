//! Candidate enumeration over hash sidecar postings.
//!
//! Matchers are positioned on their first document when created and only move
//! forward: `next` and `skip_to` never return an id below the current one.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;

use crate::error::Result;

/// Sentinel doc id of an exhausted matcher.
pub const NO_MORE_DOCS: u32 = u32::MAX;

/// Trait for document matchers.
pub trait Matcher: Send + Debug {
    /// Get the current document ID.
    fn doc_id(&self) -> u32;

    /// Move to the next matching position.
    fn next(&mut self) -> Result<bool>;

    /// Skip to the first position whose document is >= target.
    fn skip_to(&mut self, target: u32) -> Result<bool>;

    /// Get the cost of iterating through this matcher.
    fn cost(&self) -> u64;

    /// Check if this matcher is exhausted.
    fn is_exhausted(&self) -> bool;
}

/// A matcher over one sorted posting list, i.e. one hash clause.
#[derive(Debug)]
pub struct PostingMatcher<'a> {
    postings: &'a [u32],
    position: usize,
}

impl<'a> PostingMatcher<'a> {
    pub fn new(postings: &'a [u32]) -> Self {
        PostingMatcher {
            postings,
            position: 0,
        }
    }
}

impl Matcher for PostingMatcher<'_> {
    fn doc_id(&self) -> u32 {
        self.postings
            .get(self.position)
            .copied()
            .unwrap_or(NO_MORE_DOCS)
    }

    fn next(&mut self) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        self.position += 1;
        Ok(!self.is_exhausted())
    }

    fn skip_to(&mut self, target: u32) -> Result<bool> {
        if self.is_exhausted() {
            return Ok(false);
        }
        if self.doc_id() < target {
            let rest = &self.postings[self.position..];
            self.position += rest.partition_point(|&doc| doc < target);
        }
        Ok(!self.is_exhausted())
    }

    fn cost(&self) -> u64 {
        self.postings.len() as u64
    }

    fn is_exhausted(&self) -> bool {
        self.position >= self.postings.len()
    }
}

/// A helper struct for tracking matchers in the disjunction heap.
#[derive(Debug)]
struct MatcherEntry<'a> {
    matcher: Box<dyn Matcher + 'a>,
}

impl PartialEq for MatcherEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.matcher.doc_id() == other.matcher.doc_id()
    }
}

impl Eq for MatcherEntry<'_> {}

impl PartialOrd for MatcherEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatcherEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower doc IDs come first
        other.matcher.doc_id().cmp(&self.matcher.doc_id())
    }
}

/// Disjunction (OR) of hash clauses.
///
/// Every clause position is surfaced: a document posted under `k` clauses is
/// enumerated `k` times in a row. The merge does not deduplicate and does not
/// score; callers decide what a repeated document contributes.
#[derive(Debug)]
pub struct DisjunctionMatcher<'a> {
    /// Min-heap of active matchers, ordered by current doc_id.
    heap: BinaryHeap<MatcherEntry<'a>>,
    /// Total cost estimate.
    cost: u64,
}

impl<'a> DisjunctionMatcher<'a> {
    /// Create a new disjunction matcher from multiple matchers.
    pub fn new(matchers: Vec<Box<dyn Matcher + 'a>>) -> Self {
        let mut heap = BinaryHeap::with_capacity(matchers.len());
        let mut cost = 0;

        for matcher in matchers {
            if !matcher.is_exhausted() {
                cost += matcher.cost();
                heap.push(MatcherEntry { matcher });
            }
        }

        DisjunctionMatcher { heap, cost }
    }

    /// Number of clauses positioned on the current document.
    pub fn matching_clauses(&self) -> usize {
        let current = self.doc_id();
        if current == NO_MORE_DOCS {
            return 0;
        }
        self.heap
            .iter()
            .filter(|entry| entry.matcher.doc_id() == current)
            .count()
    }
}

impl Matcher for DisjunctionMatcher<'_> {
    fn doc_id(&self) -> u32 {
        self.heap
            .peek()
            .map(|entry| entry.matcher.doc_id())
            .unwrap_or(NO_MORE_DOCS)
    }

    /// Advance the clause at the top of the heap by one position.
    fn next(&mut self) -> Result<bool> {
        if let Some(mut entry) = self.heap.pop() {
            if entry.matcher.next()? {
                self.heap.push(entry);
            }
        }
        Ok(!self.is_exhausted())
    }

    fn skip_to(&mut self, target: u32) -> Result<bool> {
        if self.is_exhausted() || target <= self.doc_id() {
            return Ok(!self.is_exhausted());
        }

        let mut matchers_to_reinsert = Vec::with_capacity(self.heap.len());
        while let Some(mut entry) = self.heap.pop() {
            if entry.matcher.doc_id() >= target || entry.matcher.skip_to(target)? {
                matchers_to_reinsert.push(entry);
            }
        }
        self.heap.extend(matchers_to_reinsert);

        Ok(!self.is_exhausted())
    }

    fn cost(&self) -> u64 {
        self.cost
    }

    fn is_exhausted(&self) -> bool {
        self.heap.is_empty()
    }
}
