//! Immutable index segments.
//!
//! A segment holds, per descriptor field, the stored blob of every document
//! (doc-values style, `None` for documents without a value) and the postings
//! of the hash sidecar fields: `sidecar field -> term -> sorted local doc ids`.

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PhalanxError, Result};

/// Identity of a segment, unique within an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}", self.0)
    }
}

/// A flushed, read-only segment.
#[derive(Debug)]
pub struct Segment {
    id: SegmentId,
    external_ids: Vec<String>,
    stored: AHashMap<String, Vec<Option<Vec<u8>>>>,
    postings: AHashMap<String, AHashMap<String, Vec<u32>>>,
}

impl Segment {
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// Number of documents in the segment.
    pub fn num_docs(&self) -> u32 {
        self.external_ids.len() as u32
    }

    /// External id of a local document.
    pub fn external_id(&self, doc_id: u32) -> Result<&str> {
        self.external_ids
            .get(doc_id as usize)
            .map(String::as_str)
            .ok_or_else(|| {
                PhalanxError::index(format!("document {doc_id} not in segment {}", self.id))
            })
    }

    /// Stored descriptor blob of `field` for a local document.
    pub fn stored(&self, field: &str, doc_id: u32) -> Option<&[u8]> {
        self.stored
            .get(field)
            .and_then(|values| values.get(doc_id as usize))
            .and_then(|value| value.as_deref())
    }

    /// Sorted doc ids holding `term` in a sidecar field. Empty when absent.
    pub fn postings(&self, sidecar_field: &str, term: &str) -> &[u32] {
        self.postings
            .get(sidecar_field)
            .and_then(|terms| terms.get(term))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct terms of a sidecar field.
    pub fn num_terms(&self, sidecar_field: &str) -> usize {
        self.postings.get(sidecar_field).map_or(0, |terms| terms.len())
    }
}

/// Accumulates documents for the next segment.
#[derive(Debug, Default)]
pub(crate) struct SegmentBuilder {
    external_ids: Vec<String>,
    stored: AHashMap<String, Vec<Option<Vec<u8>>>>,
    postings: AHashMap<String, AHashMap<String, Vec<u32>>>,
}

impl SegmentBuilder {
    pub(crate) fn is_empty(&self) -> bool {
        self.external_ids.is_empty()
    }

    pub(crate) fn num_docs(&self) -> usize {
        self.external_ids.len()
    }

    /// Append a document, returning its local id.
    pub(crate) fn add_document(&mut self, external_id: String) -> u32 {
        let doc_id = self.external_ids.len() as u32;
        self.external_ids.push(external_id);
        doc_id
    }

    pub(crate) fn add_stored(&mut self, field: &str, doc_id: u32, blob: Vec<u8>) {
        let values = self.stored.entry(field.to_string()).or_default();
        let doc_id = doc_id as usize;
        if doc_id >= values.len() {
            values.resize(doc_id + 1, None);
        }
        values[doc_id] = Some(blob);
    }

    pub(crate) fn add_term(&mut self, sidecar_field: &str, term: String, doc_id: u32) {
        let docs = self
            .postings
            .entry(sidecar_field.to_string())
            .or_default()
            .entry(term)
            .or_default();
        // Doc ids only grow, so the list stays sorted; a code repeated in
        // several slots of one document is posted once.
        if docs.last() != Some(&doc_id) {
            docs.push(doc_id);
        }
    }

    pub(crate) fn build(self, id: SegmentId) -> Segment {
        Segment {
            id,
            external_ids: self.external_ids,
            stored: self.stored,
            postings: self.postings,
        }
    }
}
