//! Descriptor query execution.
//!
//! One search is one query execution: the hash family is resolved and the
//! query hashed before any segment is read, a fresh [`ScoreCache`] is created,
//! and every segment is visited by its own candidate cursor. Segments may be
//! scored concurrently on the searcher's thread pool; the cache is the only
//! state they share and is dropped when the search returns.

use std::sync::Arc;

use log::{debug, trace};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::SearchConfig;
use crate::error::{PhalanxError, Result};
use crate::hashing::HashFamilies;
use crate::index::reader::IndexReader;
use crate::index::segment::{Segment, SegmentId};
use crate::query::collector::{Collector, TopDocsCollector};
use crate::query::descriptor::DescriptorQuery;
use crate::query::matcher::Matcher;
use crate::query::scorer::{DistanceScorer, Explanation, Scorer};
use crate::query::{ScoreCache, ScoreKey, SearchHit, SearchResults};

/// A search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: DescriptorQuery,
    /// Maximum number of hits. Falls back to the configured default.
    pub limit: Option<usize>,
    /// Hits scoring below this are dropped.
    pub min_score: f32,
    /// Stop each segment's cursor once `limit` hits were collected there.
    pub terminate_early: bool,
}

impl SearchRequest {
    pub fn new(query: DescriptorQuery) -> Self {
        SearchRequest {
            query,
            limit: None,
            min_score: 0.0,
            terminate_early: false,
        }
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn terminate_early(mut self, terminate_early: bool) -> Self {
        self.terminate_early = terminate_early;
        self
    }
}

struct SegmentHits {
    hits: Vec<SearchHit>,
    total_hits: u64,
    /// Postings the segment's candidate cursor could visit.
    postings: u64,
}

/// Executes descriptor queries against an index snapshot.
#[derive(Debug)]
pub struct Searcher {
    reader: IndexReader,
    families: Arc<HashFamilies>,
    config: SearchConfig,
    thread_pool: Option<Arc<ThreadPool>>,
}

impl Searcher {
    pub fn new(
        reader: IndexReader,
        families: Arc<HashFamilies>,
        config: SearchConfig,
    ) -> Result<Self> {
        config.validate()?;

        let thread_pool = if config.parallel_segments {
            let size = config.thread_pool_size.unwrap_or_else(num_cpus::get);
            let pool = ThreadPoolBuilder::new()
                .num_threads(size)
                .thread_name(|i| format!("phalanx-search-{i}"))
                .build()
                .map_err(|e| PhalanxError::internal(format!("Failed to create thread pool: {e}")))?;
            Some(Arc::new(pool))
        } else {
            None
        };

        Ok(Searcher {
            reader,
            families,
            config,
            thread_pool,
        })
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// Top `limit` documents for a query.
    pub fn search(&self, query: &DescriptorQuery, limit: usize) -> Result<SearchResults> {
        self.execute(&SearchRequest::new(query.clone()).limit(limit))
    }

    /// Run a search request.
    pub fn execute(&self, request: &SearchRequest) -> Result<SearchResults> {
        let query = &request.query;
        let family = self.families.get(query.hash())?;
        let codes = query.hash_codes(family)?;
        let limit = request.limit.unwrap_or(self.config.default_limit);

        let cache = ScoreCache::new();
        let segments = self.reader.segments();
        let search_segment =
            |segment: &Arc<Segment>| self.search_segment(segment, request, &codes, &cache, limit);

        let per_segment: Vec<Result<SegmentHits>> = match &self.thread_pool {
            Some(pool) if segments.len() > 1 => {
                pool.install(|| segments.par_iter().map(search_segment).collect())
            }
            _ => segments.iter().map(search_segment).collect(),
        };

        let mut hits = Vec::new();
        let mut total_hits = 0;
        let mut postings = 0;
        for segment_hits in per_segment {
            let segment_hits = segment_hits?;
            total_hits += segment_hits.total_hits;
            postings += segment_hits.postings;
            hits.extend(segment_hits.hits);
        }

        // Ties keep index order, as each segment's collector did.
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| (a.segment, a.doc_id).cmp(&(b.segment, b.doc_id)))
        });
        hits.truncate(limit);
        let max_score = hits.first().map_or(0.0, |hit| hit.score);

        debug!(
            "{query}: {} hash clauses over {postings} postings, {} segments, \
             {} documents scored, {total_hits} hits",
            codes.len(),
            segments.len(),
            cache.len()
        );

        Ok(SearchResults {
            hits,
            total_hits,
            max_score,
        })
    }

    fn search_segment(
        &self,
        segment: &Segment,
        request: &SearchRequest,
        codes: &[i32],
        cache: &ScoreCache,
        limit: usize,
    ) -> Result<SegmentHits> {
        let query = &request.query;
        let scorer = DistanceScorer::new(
            segment,
            query.field(),
            query.descriptor(),
            query.boost(),
            query.to_string(),
        );
        let mut matcher = query.matcher(segment, codes);
        let postings = matcher.cost();
        let mut collector = TopDocsCollector::with_min_score(limit, request.min_score)
            .terminate_early(request.terminate_early);

        // Repeated visits of a document are adjacent; remember the last one
        // that failed so it is not decoded once per clause.
        let mut skipped = None;

        while !matcher.is_exhausted() {
            let doc_id = matcher.doc_id();
            let key = ScoreKey::new(segment.id(), doc_id);

            if skipped != Some(doc_id) && cache.lookup(key).is_none() {
                match scorer.score(doc_id) {
                    Ok(score) => {
                        if cache.store(key, score) {
                            collector.collect(doc_id, score)?;
                        }
                    }
                    Err(e) if e.is_per_document() => {
                        debug!("Skipping document {doc_id} of segment {}: {e}", segment.id());
                        skipped = Some(doc_id);
                    }
                    Err(e) => return Err(e),
                }

                if !collector.needs_more() {
                    trace!("Segment {} terminated early at document {doc_id}", segment.id());
                    break;
                }
            }

            matcher.next()?;
        }

        let hits = collector
            .results()
            .into_iter()
            .map(|doc| {
                Ok(SearchHit {
                    segment: segment.id(),
                    doc_id: doc.doc_id,
                    id: segment.external_id(doc.doc_id)?.to_string(),
                    score: doc.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SegmentHits {
            hits,
            total_hits: collector.total_hits(),
            postings,
        })
    }

    /// Explain how a document scores for a query.
    pub fn explain(
        &self,
        query: &DescriptorQuery,
        segment: SegmentId,
        doc_id: u32,
    ) -> Result<Explanation> {
        let family = self.families.get(query.hash())?;
        let codes = query.hash_codes(family)?;
        let segment = self.reader.segment(segment)?;

        let mut matcher = query.matcher(segment, &codes);
        if !matcher.skip_to(doc_id)? || matcher.doc_id() != doc_id {
            return Ok(Explanation::no_match(format!(
                "weight({query}) doesn't match id {doc_id}: no shared hash code"
            )));
        }
        debug!(
            "Document {doc_id} of segment {} shares {} of {} hash codes with {query}",
            segment.id(),
            matcher.matching_clauses(),
            codes.len()
        );

        let scorer = DistanceScorer::new(
            segment,
            query.field(),
            query.descriptor(),
            query.boost(),
            query.to_string(),
        );
        Ok(scorer.explain(doc_id))
    }
}
