//! Point-in-time view of an index.

use std::sync::Arc;

use crate::error::{PhalanxError, Result};
use crate::index::segment::{Segment, SegmentId};

/// Immutable snapshot of committed segments.
///
/// Cloning is cheap; segments are shared. Documents committed after the
/// snapshot was taken are not visible through it.
#[derive(Debug, Clone, Default)]
pub struct IndexReader {
    segments: Arc<[Arc<Segment>]>,
}

impl IndexReader {
    pub fn new(segments: Vec<Arc<Segment>>) -> Self {
        IndexReader {
            segments: segments.into(),
        }
    }

    pub fn segments(&self) -> &[Arc<Segment>] {
        &self.segments
    }

    /// Look up a segment by id.
    pub fn segment(&self, id: SegmentId) -> Result<&Arc<Segment>> {
        self.segments
            .iter()
            .find(|segment| segment.id() == id)
            .ok_or_else(|| PhalanxError::index(format!("unknown segment {id}")))
    }

    /// Total number of documents across segments.
    pub fn num_docs(&self) -> u64 {
        self.segments.iter().map(|s| s.num_docs() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::segment::SegmentBuilder;

    #[test]
    fn test_snapshot() {
        let mut builder = SegmentBuilder::default();
        builder.add_document("a".to_string());
        builder.add_document("b".to_string());
        let reader = IndexReader::new(vec![Arc::new(builder.build(SegmentId(3)))]);

        assert_eq!(reader.num_docs(), 2);
        assert_eq!(reader.segment(SegmentId(3)).unwrap().num_docs(), 2);
        assert!(reader.segment(SegmentId(0)).is_err());
        assert_eq!(IndexReader::default().num_docs(), 0);
    }
}
