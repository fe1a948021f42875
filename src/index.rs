//! Minimal in-memory segmented index.
//!
//! The index only keeps what descriptor search needs: the stored descriptor
//! blob of every document and the hash sidecar postings. Writers append
//! documents and commit them as immutable segments; readers are snapshots.

pub mod document;
pub mod reader;
pub mod segment;
pub mod writer;

pub use document::{Document, DocumentBuilder};
pub use reader::IndexReader;
pub use segment::{Segment, SegmentId};
pub use writer::IndexWriter;
