//! Per-query score deduplication.
//!
//! A document colliding with the query on several hash clauses is enumerated
//! once per clause. The [`ScoreCache`] makes sure only the first visit
//! contributes a score; later visits contribute nothing. A cache lives for a
//! single query execution and is shared by the threads scoring its segments.

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::index::segment::SegmentId;

/// Identity of a document within one query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScoreKey {
    pub segment: SegmentId,
    pub doc_id: u32,
}

impl ScoreKey {
    pub fn new(segment: SegmentId, doc_id: u32) -> Self {
        ScoreKey { segment, doc_id }
    }
}

/// Scores computed so far in one query execution.
#[derive(Debug, Default)]
pub struct ScoreCache {
    scores: RwLock<AHashMap<ScoreKey, f32>>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Previously registered score of a document.
    pub fn lookup(&self, key: ScoreKey) -> Option<f32> {
        self.scores.read().get(&key).copied()
    }

    /// Register a score unless one is already present.
    ///
    /// Returns `true` when this call registered the value. Two threads racing
    /// on the same key compute the same score; exactly one of them wins and
    /// only the winner contributes to the result.
    pub fn store(&self, key: ScoreKey, score: f32) -> bool {
        let mut scores = self.scores.write();
        if scores.contains_key(&key) {
            return false;
        }
        scores.insert(key, score);
        true
    }

    /// Number of scored documents.
    pub fn len(&self) -> usize {
        self.scores.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn test_lookup_and_store() {
        let cache = ScoreCache::new();
        let key = ScoreKey::new(SegmentId(0), 7);

        assert!(cache.is_empty());
        assert_eq!(cache.lookup(key), None);

        assert!(cache.store(key, 1.5));
        assert_eq!(cache.lookup(key), Some(1.5));

        // First writer wins.
        assert!(!cache.store(key, 0.5));
        assert_eq!(cache.lookup(key), Some(1.5));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_segments_disambiguate_local_ids() {
        let cache = ScoreCache::new();
        assert!(cache.store(ScoreKey::new(SegmentId(0), 3), 2.0));
        assert!(cache.store(ScoreKey::new(SegmentId(1), 3), 0.1));

        assert_eq!(cache.lookup(ScoreKey::new(SegmentId(0), 3)), Some(2.0));
        assert_eq!(cache.lookup(ScoreKey::new(SegmentId(1), 3)), Some(0.1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_first_touch_has_one_winner() {
        let cache = Arc::new(ScoreCache::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let key = ScoreKey::new(SegmentId(2), 42);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let winners = Arc::clone(&winners);
                thread::spawn(move || {
                    if cache.lookup(key).is_none() && cache.store(key, 0.75) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert_eq!(cache.lookup(key), Some(0.75));
    }
}
