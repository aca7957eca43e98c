//! Retriever - the query-answering entry point
//!
//! Owns the active corpus slot and the embedding provider. Queries read the
//! slot; rebuilds and ingests construct a fresh `Corpus` with no read lock
//! held and then swap it in under a short write lock, so every query sees
//! either the whole old corpus or the whole new one.
//!
//! # Query flow
//! ```text
//! query text → provider.embed → normalize → VectorIndex::search(k)
//!            → join with DocumentStore → drop score <= min_score
//!            → Matches([...]) | NoMatch
//! ```

mod lifecycle;

pub use lifecycle::IndexState;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use instant::Instant;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::{self, RetrieverConfig};
use crate::corpus::{Corpus, CorpusBuilder};
use crate::embeddings::EmbeddingProvider;
use crate::error::{ProviderError, Result, RetrievalError};
use crate::index::distance::normalize;
use crate::store::{Document, DocumentInput};

/// A document paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    #[serde(flatten)]
    pub document: Document,
    pub score: f32,
}

/// Outcome of a query that ran against a ready corpus.
///
/// `NoMatch` means nothing cleared the score threshold. It is not an error
/// and is distinct from `RetrievalError::IndexNotReady`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "results", rename_all = "snake_case")]
pub enum Retrieval {
    /// Non-empty, best first.
    Matches(Vec<RetrievedDocument>),
    NoMatch,
}

impl Retrieval {
    pub fn is_match(&self) -> bool {
        matches!(self, Retrieval::Matches(_))
    }

    pub fn results(&self) -> &[RetrievedDocument] {
        match self {
            Retrieval::Matches(results) => results,
            Retrieval::NoMatch => &[],
        }
    }

    pub fn into_results(self) -> Vec<RetrievedDocument> {
        match self {
            Retrieval::Matches(results) => results,
            Retrieval::NoMatch => Vec::new(),
        }
    }
}

/// Snapshot of the active corpus for health/stats reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub state: IndexState,
    /// A rebuild is in flight behind a still-serving corpus.
    pub rebuilding: bool,
    pub total_documents: usize,
    pub dimensions: Option<usize>,
    pub built_at: Option<DateTime<Utc>>,
    pub build_millis: Option<u64>,
    pub memory_bytes: usize,
}

struct Published {
    corpus: Arc<Corpus>,
    built_at: DateTime<Utc>,
    build_millis: u64,
}

#[derive(Default)]
struct Slot {
    state: IndexState,
    rebuilding: bool,
    active: Option<Published>,
}

pub struct Retriever {
    provider: Arc<dyn EmbeddingProvider>,
    config: RetrieverConfig,
    slot: RwLock<Slot>,
    /// Serializes rebuilds/ingests so two writers never extend the same base.
    writer: Mutex<()>,
}

impl Retriever {
    /// Retriever with default configuration and no corpus.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            config: RetrieverConfig::default(),
            slot: RwLock::new(Slot::default()),
            writer: Mutex::new(()),
        }
    }

    pub fn with_config(provider: Arc<dyn EmbeddingProvider>, config: RetrieverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(provider)
        })
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn state(&self) -> IndexState {
        self.slot.read().state
    }

    pub fn is_ready(&self) -> bool {
        self.state().accepts_queries()
    }

    /// The corpus queries currently run against, if ready.
    pub fn snapshot(&self) -> Option<Arc<Corpus>> {
        let slot = self.slot.read();
        if !slot.state.accepts_queries() {
            return None;
        }
        slot.active.as_ref().map(|p| Arc::clone(&p.corpus))
    }

    pub fn stats(&self) -> IndexStats {
        let slot = self.slot.read();
        let active = slot.active.as_ref();
        IndexStats {
            state: slot.state,
            rebuilding: slot.rebuilding,
            total_documents: active.map_or(0, |p| p.corpus.len()),
            dimensions: active.and_then(|p| p.corpus.dimensions()),
            built_at: active.map(|p| p.built_at),
            build_millis: active.map(|p| p.build_millis),
            memory_bytes: active.map_or(0, |p| p.corpus.index().memory_usage()),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Query with the configured `top_k` and `min_score`.
    pub fn retrieve_default(&self, query_text: &str) -> Result<Retrieval> {
        self.retrieve(query_text, self.config.top_k, self.config.min_score)
    }

    /// Rank corpus documents against `query_text`.
    ///
    /// Results scoring `<= min_score` are dropped; if none remain the
    /// outcome is `Retrieval::NoMatch`. Provider failures surface as
    /// `EmbeddingUnavailable` and are not retried.
    pub fn retrieve(&self, query_text: &str, top_k: usize, min_score: f32) -> Result<Retrieval> {
        if top_k == 0 {
            return Err(RetrievalError::InvalidArgument("top_k must be positive".into()));
        }
        if !min_score.is_finite() {
            return Err(RetrievalError::InvalidArgument(format!(
                "min_score must be finite, got {}",
                min_score
            )));
        }

        let corpus = self.snapshot().ok_or_else(|| {
            debug!(target: "seekcore::retriever", "query rejected: index not ready");
            RetrievalError::IndexNotReady
        })?;

        let raw = self.provider.embed(query_text).map_err(|e| {
            warn!(target: "seekcore::retriever", error = %e, "query embedding failed");
            RetrievalError::EmbeddingUnavailable(e)
        })?;

        if let Some(dim) = corpus.dimensions() {
            if raw.len() != dim {
                warn!(
                    target: "seekcore::retriever",
                    expected = dim,
                    got = raw.len(),
                    "provider returned wrong query dimension"
                );
                return Err(RetrievalError::EmbeddingUnavailable(ProviderError::Malformed(
                    format!("expected {} dimensions, got {}", dim, raw.len()),
                )));
            }
        }

        let query = normalize(&raw).map_err(|e| {
            warn!(target: "seekcore::retriever", "query vector has zero norm");
            e
        })?;

        let hits = corpus.index().search(&query, top_k)?;
        let candidates = hits.len();

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            if hit.score <= min_score {
                continue;
            }
            let document = corpus.documents().get(hit.document_id).map_err(|e| {
                error!(
                    target: "seekcore::retriever",
                    document_id = hit.document_id,
                    "search hit has no document; corpus is misaligned"
                );
                e
            })?;
            results.push(RetrievedDocument {
                document: document.clone(),
                score: hit.score,
            });
        }

        debug!(
            target: "seekcore::retriever",
            candidates,
            matches = results.len(),
            top_k,
            min_score,
            "query answered"
        );

        if results.is_empty() {
            Ok(Retrieval::NoMatch)
        } else {
            Ok(Retrieval::Matches(results))
        }
    }

    // ========================================================================
    // Building
    // ========================================================================

    /// Replace the active corpus with one built from `inputs`.
    ///
    /// The old corpus keeps serving until the new one is complete. On
    /// failure the old corpus stays active and nothing is published.
    pub fn rebuild(&self, inputs: Vec<DocumentInput>) -> Result<IndexStats> {
        let _writer = self.writer.lock();
        let start = Instant::now();
        self.begin_build();

        let mut builder = CorpusBuilder::new(self.config.batch_size);
        builder.extend(inputs);
        let built = builder.build(self.provider.as_ref());

        self.finish_build(built, start)?;
        Ok(self.stats())
    }

    /// Rebuild from a JSON corpus file.
    pub fn load_corpus_file(&self, path: impl AsRef<Path>) -> Result<IndexStats> {
        let inputs = config::load_corpus_file(path)?;
        self.rebuild(inputs)
    }

    /// Promote a corpus built elsewhere.
    pub fn publish(&self, corpus: Corpus) {
        let _writer = self.writer.lock();
        let start = Instant::now();
        self.begin_build();
        let mut slot = self.slot.write();
        Self::install(&mut slot, corpus, start);
    }

    /// Add one document; returns its id.
    pub fn ingest(&self, input: DocumentInput) -> Result<u32> {
        let ids = self.ingest_many(vec![input])?;
        ids.first()
            .copied()
            .ok_or_else(|| RetrievalError::Corpus("ingest produced no id".into()))
    }

    /// Add documents on top of the active corpus.
    ///
    /// Only the new documents are embedded. The extended corpus replaces the
    /// active one in a single swap; on failure the active one is unchanged.
    pub fn ingest_many(&self, inputs: Vec<DocumentInput>) -> Result<Vec<u32>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let _writer = self.writer.lock();
        let start = Instant::now();
        let base = self
            .slot
            .read()
            .active
            .as_ref()
            .map(|p| Arc::clone(&p.corpus));
        let first_id = base.as_ref().map_or(0, |c| c.len()) as u32;
        let count = inputs.len() as u32;

        self.begin_build();
        let extended = match base {
            Some(corpus) => corpus.extend(
                inputs,
                self.provider.as_ref(),
                self.config.batch_size,
                self.config.norm_tolerance,
            ),
            None => Corpus::empty().extend(
                inputs,
                self.provider.as_ref(),
                self.config.batch_size,
                self.config.norm_tolerance,
            ),
        };

        self.finish_build(extended, start)?;
        info!(target: "seekcore::retriever", first_id, count, "documents ingested");
        Ok((first_id..first_id + count).collect())
    }

    fn begin_build(&self) {
        let mut slot = self.slot.write();
        slot.state = slot.state.begin_build();
        slot.rebuilding = true;
    }

    fn finish_build(&self, built: Result<Corpus>, start: Instant) -> Result<()> {
        let mut slot = self.slot.write();

        match built {
            Ok(corpus) => {
                Self::install(&mut slot, corpus, start);
                Ok(())
            }
            Err(e) => {
                slot.rebuilding = false;
                let has_previous = slot.active.is_some();
                slot.state = slot.state.finish_build(false, has_previous);
                warn!(
                    target: "seekcore::retriever",
                    error = %e,
                    kept_previous = has_previous,
                    "build failed; nothing published"
                );
                Err(e)
            }
        }
    }

    /// Swap `corpus` in as the active one. Caller holds the slot write lock.
    fn install(slot: &mut Slot, corpus: Corpus, start: Instant) {
        let build_millis = start.elapsed().as_millis() as u64;
        let documents = corpus.len();
        slot.rebuilding = false;
        slot.active = Some(Published {
            corpus: Arc::new(corpus),
            built_at: Utc::now(),
            build_millis,
        });
        slot.state = slot.state.finish_build(true, true);
        info!(target: "seekcore::retriever", documents, build_millis, "corpus published");
    }
}

#[cfg(test)]
mod tests;
