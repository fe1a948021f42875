//! Descriptor similarity queries.
//!
//! A [`DescriptorQuery`] asks for the documents whose descriptor in `field` is
//! closest to `descriptor`. Candidates are the documents sharing at least one
//! hash code of the chosen family with the query; each candidate is then
//! scored exactly by distance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PhalanxError, Result};
use crate::hashing::{HashAlgorithm, HashFunctionFamily};
use crate::index::segment::Segment;
use crate::query::matcher::{DisjunctionMatcher, Matcher, PostingMatcher};

/// Wire form of a descriptor query.
///
/// ```json
/// {"field": "test_descriptor", "descriptor": [93.28, 1.60], "hash": "BIT_SAMPLING", "boost": 2.0}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorQueryRequest {
    pub field: String,
    #[serde(default)]
    pub descriptor: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<f32>,
}

/// A validated descriptor query.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorQuery {
    field: String,
    descriptor: Vec<f64>,
    hash: HashAlgorithm,
    boost: f32,
}

impl DescriptorQuery {
    /// Start building a query on `field`.
    pub fn builder<S: Into<String>>(field: S) -> DescriptorQueryBuilder {
        DescriptorQueryBuilder {
            field: field.into(),
            descriptor: None,
            hash: None,
            boost: None,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn descriptor(&self) -> &[f64] {
        &self.descriptor
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn boost(&self) -> f32 {
        self.boost
    }

    /// Name of the sidecar field holding this query's hash terms.
    pub fn sidecar_field(&self) -> String {
        self.hash.sidecar_field(&self.field)
    }

    /// Hash codes of the query descriptor, one per clause.
    pub fn hash_codes(&self, family: &HashFunctionFamily) -> Result<Vec<i32>> {
        if family.algorithm() != self.hash {
            return Err(PhalanxError::configuration(format!(
                "query uses {} but {} hash functions were supplied",
                self.hash,
                family.algorithm()
            )));
        }
        family
            .generate_hashes(&self.descriptor)
            .map_err(|e| PhalanxError::configuration(format!("cannot hash query descriptor: {e}")))
    }

    /// Candidate cursor over one segment: one posting clause per hash code,
    /// combined disjunctively.
    pub fn matcher<'a>(&self, segment: &'a Segment, codes: &[i32]) -> DisjunctionMatcher<'a> {
        let sidecar = self.sidecar_field();
        let clauses = codes
            .iter()
            .map(|code| {
                Box::new(PostingMatcher::new(segment.postings(&sidecar, &code.to_string())))
                    as Box<dyn Matcher + 'a>
            })
            .collect();
        DisjunctionMatcher::new(clauses)
    }

    /// Convert back into the wire form.
    pub fn to_request(&self) -> DescriptorQueryRequest {
        DescriptorQueryRequest {
            field: self.field.clone(),
            descriptor: self.descriptor.clone(),
            hash: Some(self.hash.name().to_string()),
            boost: Some(self.boost),
        }
    }
}

impl fmt::Display for DescriptorQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "descriptor({}, hash={}, dims={})",
            self.field,
            self.hash,
            self.descriptor.len()
        )?;
        if self.boost != 1.0 {
            write!(f, "^{}", self.boost)?;
        }
        Ok(())
    }
}

impl TryFrom<DescriptorQueryRequest> for DescriptorQuery {
    type Error = PhalanxError;

    fn try_from(request: DescriptorQueryRequest) -> Result<Self> {
        let mut builder = DescriptorQuery::builder(request.field).descriptor(request.descriptor);
        if let Some(boost) = request.boost {
            builder = builder.boost(boost);
        }
        let hash = request
            .hash
            .ok_or_else(|| PhalanxError::configuration("No hash found"))?
            .parse::<HashAlgorithm>()?;
        builder.hash(hash).build()
    }
}

/// Builder for [`DescriptorQuery`].
#[derive(Debug, Clone)]
pub struct DescriptorQueryBuilder {
    field: String,
    descriptor: Option<Vec<f64>>,
    hash: Option<HashAlgorithm>,
    boost: Option<f32>,
}

impl DescriptorQueryBuilder {
    pub fn descriptor(mut self, descriptor: Vec<f64>) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = Some(boost);
        self
    }

    /// Validate and build the query.
    pub fn build(self) -> Result<DescriptorQuery> {
        if self.field.is_empty() {
            return Err(PhalanxError::configuration(
                "[descriptor] query malformed, no field",
            ));
        }
        let hash = self
            .hash
            .ok_or_else(|| PhalanxError::configuration("No hash found"))?;
        let descriptor = self
            .descriptor
            .filter(|d| !d.is_empty())
            .ok_or_else(|| PhalanxError::configuration("No descriptor found"))?;
        if let Some(i) = descriptor.iter().position(|v| !v.is_finite()) {
            return Err(PhalanxError::configuration(format!(
                "descriptor component {i} is not finite: {}",
                descriptor[i]
            )));
        }
        let boost = self.boost.unwrap_or(1.0);
        if !(boost.is_finite() && boost > 0.0) {
            return Err(PhalanxError::configuration(format!(
                "boost must be a positive number, got {boost}"
            )));
        }

        Ok(DescriptorQuery {
            field: self.field,
            descriptor,
            hash,
            boost,
        })
    }
}
