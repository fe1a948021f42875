//! Documents carrying descriptor fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A document to index.
///
/// Each descriptor field maps to a vector or to `None` when the source
/// explicitly held a null value. Null and absent fields behave the same way:
/// nothing is stored and no hash terms are produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// External identifier, returned with search hits.
    pub id: String,
    /// Descriptor fields.
    #[serde(default)]
    pub descriptors: HashMap<String, Option<Vec<f64>>>,
}

impl Document {
    /// Create a document without descriptors.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Document {
            id: id.into(),
            descriptors: HashMap::new(),
        }
    }

    /// Start building a document.
    pub fn builder<S: Into<String>>(id: S) -> DocumentBuilder {
        DocumentBuilder {
            document: Document::new(id),
        }
    }

    /// The descriptor of `field`, if present and not null.
    pub fn descriptor(&self, field: &str) -> Option<&[f64]> {
        self.descriptors.get(field).and_then(|v| v.as_deref())
    }
}

/// Builder for [`Document`].
#[derive(Debug)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Set a descriptor field.
    pub fn add_descriptor<S: Into<String>>(mut self, field: S, descriptor: Vec<f64>) -> Self {
        self.document
            .descriptors
            .insert(field.into(), Some(descriptor));
        self
    }

    /// Set a descriptor field to null.
    pub fn add_null<S: Into<String>>(mut self, field: S) -> Self {
        self.document.descriptors.insert(field.into(), None);
        self
    }

    pub fn build(self) -> Document {
        self.document
    }
}
