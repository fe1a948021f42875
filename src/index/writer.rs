//! Index writer.
//!
//! Documents are buffered into a [`SegmentBuilder`] and become searchable when
//! [`IndexWriter::commit`] flushes them into a new immutable segment. For every
//! non-null descriptor the writer stores the encoded vector and posts one term
//! per hash function slot, for every hash family that is available.

use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, info};

use crate::codec::VectorCodec;
use crate::error::{PhalanxError, Result};
use crate::hashing::HashFamilies;
use crate::index::document::Document;
use crate::index::reader::IndexReader;
use crate::index::segment::{Segment, SegmentBuilder, SegmentId};

/// Terms of one descriptor field, computed before the document is applied.
struct PreparedField<'a> {
    field: &'a str,
    blob: Vec<u8>,
    terms: Vec<(String, Vec<i32>)>,
}

/// Writes documents into segments.
#[derive(Debug)]
pub struct IndexWriter {
    families: Arc<HashFamilies>,
    /// Descriptor dimension per field, fixed by the first indexed value.
    dimensions: AHashMap<String, usize>,
    pending: SegmentBuilder,
    segments: Vec<Arc<Segment>>,
    next_segment_id: u64,
}

impl IndexWriter {
    pub fn new(families: Arc<HashFamilies>) -> Self {
        IndexWriter {
            families,
            dimensions: AHashMap::new(),
            pending: SegmentBuilder::default(),
            segments: Vec::new(),
            next_segment_id: 0,
        }
    }

    /// Add a document to the pending segment.
    ///
    /// The document is validated and hashed before anything is written, so a
    /// rejected document leaves the writer unchanged.
    pub fn add_document(&mut self, document: Document) -> Result<()> {
        let mut prepared = Vec::new();
        let mut new_dimensions = Vec::new();

        for (field, value) in &document.descriptors {
            let Some(descriptor) = value else {
                continue;
            };
            if descriptor.is_empty() {
                return Err(PhalanxError::invalid_argument(format!(
                    "document [{}] has an empty descriptor for field [{field}]",
                    document.id
                )));
            }
            if descriptor.iter().any(|v| !v.is_finite()) {
                return Err(PhalanxError::invalid_argument(format!(
                    "document [{}] has a non-finite component in field [{field}]",
                    document.id
                )));
            }
            match self.dimensions.get(field) {
                Some(&expected) if expected != descriptor.len() => {
                    return Err(PhalanxError::dimension_mismatch(expected, descriptor.len()));
                }
                Some(_) => {}
                None => new_dimensions.push((field.clone(), descriptor.len())),
            }

            let mut terms = Vec::new();
            for family in self.families.families() {
                let codes = family.generate_hashes(descriptor)?;
                terms.push((family.algorithm().sidecar_field(field), codes));
            }

            prepared.push(PreparedField {
                field,
                blob: VectorCodec::encode(descriptor),
                terms,
            });
        }

        let doc_id = self.pending.add_document(document.id.clone());
        for field in prepared {
            self.pending.add_stored(field.field, doc_id, field.blob);
            for (sidecar, codes) in field.terms {
                for code in codes {
                    self.pending.add_term(&sidecar, code.to_string(), doc_id);
                }
            }
        }
        self.dimensions.extend(new_dimensions);

        debug!("Buffered document [{}] as local doc {doc_id}", document.id);
        Ok(())
    }

    /// Add several documents, stopping at the first rejected one.
    pub fn add_documents<I>(&mut self, documents: I) -> Result<()>
    where
        I: IntoIterator<Item = Document>,
    {
        for document in documents {
            self.add_document(document)?;
        }
        Ok(())
    }

    /// Number of buffered, not yet committed documents.
    pub fn pending_docs(&self) -> usize {
        self.pending.num_docs()
    }

    /// Dimension established for a descriptor field.
    pub fn dimension(&self, field: &str) -> Option<usize> {
        self.dimensions.get(field).copied()
    }

    /// Flush buffered documents into a new segment.
    ///
    /// Returns `None` when nothing was buffered.
    pub fn commit(&mut self) -> Option<SegmentId> {
        if self.pending.is_empty() {
            return None;
        }

        let id = SegmentId(self.next_segment_id);
        self.next_segment_id += 1;

        let builder = std::mem::take(&mut self.pending);
        let segment = builder.build(id);
        info!("Committed segment {id} with {} documents", segment.num_docs());
        self.segments.push(Arc::new(segment));
        Some(id)
    }

    /// Snapshot of the committed segments.
    pub fn reader(&self) -> IndexReader {
        IndexReader::new(self.segments.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BitSamplingConfig, HashingConfig, LshConfig};
    use crate::hashing::HashAlgorithm;

    fn families() -> Arc<HashFamilies> {
        Arc::new(HashFamilies::generate(&HashingConfig {
            bit_sampling: BitSamplingConfig {
                bits: 8,
                num_functions: 10,
                dimension: 8,
            },
            lsh: LshConfig {
                num_functions: 6,
                bin_width: 3.0,
                dimension: 8,
            },
            ..HashingConfig::default()
        }))
    }

    #[test]
    fn test_commit_creates_segment() {
        let mut writer = IndexWriter::new(families());
        assert_eq!(writer.commit(), None);

        writer
            .add_document(Document::builder("a").add_descriptor("d", vec![1.0, 2.0, 3.0]).build())
            .unwrap();
        writer
            .add_document(Document::builder("b").add_null("d").build())
            .unwrap();
        assert_eq!(writer.pending_docs(), 2);
        assert_eq!(writer.reader().num_docs(), 0);

        assert_eq!(writer.commit(), Some(SegmentId(0)));
        assert_eq!(writer.pending_docs(), 0);

        let reader = writer.reader();
        assert_eq!(reader.num_docs(), 2);
        let segment = &reader.segments()[0];
        assert_eq!(
            VectorCodec::decode(segment.stored("d", 0).unwrap()).unwrap(),
            vec![1.0, 2.0, 3.0]
        );
        assert_eq!(segment.stored("d", 1), None);
    }

    #[test]
    fn test_sidecar_terms_for_every_family() {
        let families = families();
        let mut writer = IndexWriter::new(Arc::clone(&families));
        let descriptor = vec![0.5, -1.5, 2.0, 4.0];
        writer
            .add_document(Document::builder("a").add_descriptor("d", descriptor.clone()).build())
            .unwrap();
        writer.commit();

        let reader = writer.reader();
        let segment = &reader.segments()[0];
        for algorithm in HashAlgorithm::ALL {
            let codes = families
                .get(algorithm)
                .unwrap()
                .generate_hashes(&descriptor)
                .unwrap();
            let sidecar = algorithm.sidecar_field("d");
            for code in codes {
                assert_eq!(segment.postings(&sidecar, &code.to_string()), &[0]);
            }
        }
    }

    #[test]
    fn test_null_descriptor_has_no_terms() {
        let mut writer = IndexWriter::new(families());
        writer
            .add_document(Document::builder("a").add_null("d").build())
            .unwrap();
        writer.commit();

        let reader = writer.reader();
        let segment = &reader.segments()[0];
        assert_eq!(segment.num_terms("d.hash.bit_sampling"), 0);
        assert_eq!(segment.num_terms("d.hash.lsh"), 0);
    }

    #[test]
    fn test_dimension_fixed_by_first_value() {
        let mut writer = IndexWriter::new(families());
        writer
            .add_document(Document::builder("a").add_descriptor("d", vec![1.0; 4]).build())
            .unwrap();
        assert_eq!(writer.dimension("d"), Some(4));

        let err = writer
            .add_document(Document::builder("b").add_descriptor("d", vec![1.0; 5]).build())
            .unwrap_err();
        assert!(matches!(
            err,
            PhalanxError::DimensionMismatch {
                expected: 4,
                actual: 5
            }
        ));
        // The rejected document was not buffered.
        assert_eq!(writer.pending_docs(), 1);
    }

    #[test]
    fn test_rejected_document_leaves_no_trace() {
        let mut writer = IndexWriter::new(families());
        // Longer than the hash functions support.
        let err = writer
            .add_document(Document::builder("a").add_descriptor("d", vec![1.0; 9]).build())
            .unwrap_err();
        assert!(matches!(err, PhalanxError::InvalidArgument(_)));
        assert_eq!(writer.pending_docs(), 0);
        assert_eq!(writer.dimension("d"), None);
    }

    #[test]
    fn test_non_finite_descriptor_is_rejected() {
        let mut writer = IndexWriter::new(families());
        for descriptor in [vec![1.0, f64::NAN], vec![f64::INFINITY, 0.0]] {
            let err = writer
                .add_document(Document::builder("a").add_descriptor("d", descriptor).build())
                .unwrap_err();
            assert!(matches!(err, PhalanxError::InvalidArgument(_)));
        }
        assert_eq!(writer.pending_docs(), 0);
        assert_eq!(writer.dimension("d"), None);
        assert_eq!(writer.commit(), None);
    }

    #[test]
    fn test_segment_ids_increase() {
        let mut writer = IndexWriter::new(families());
        for i in 0..3 {
            let document = Document::builder(format!("doc{i}"))
                .add_descriptor("d", vec![i as f64, 1.0])
                .build();
            writer.add_document(document).unwrap();
            assert_eq!(writer.commit(), Some(SegmentId(i)));
        }
        let ids: Vec<_> = writer.reader().segments().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![SegmentId(0), SegmentId(1), SegmentId(2)]);
    }
}
