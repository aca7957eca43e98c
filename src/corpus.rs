//! Corpus - a Document Store and Vector Index built as one unit
//!
//! Document id `i` is row `i` of the index by construction: the only way to
//! get a `Corpus` is through `CorpusBuilder` (or `Corpus::extend`, which
//! goes through the same path). A corpus is never mutated once built; an
//! update produces a new corpus.

use instant::Instant;
use tracing::{debug, info, warn};

use crate::embeddings::EmbeddingProvider;
use crate::error::{ProviderError, Result, RetrievalError};
use crate::index::distance::is_unit;
use crate::index::VectorIndex;
use crate::store::{Document, DocumentInput, DocumentStore};

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    store: DocumentStore,
    index: VectorIndex,
}

impl Corpus {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.store
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.index.dimensions()
    }

    /// Document and its stored vector for `id`.
    pub fn entry(&self, id: u32) -> Result<(&Document, &[f32])> {
        let doc = self.store.get(id)?;
        let vector = self.index.vector(id).ok_or(RetrievalError::NotFound(id))?;
        Ok((doc, vector))
    }

    /// Build a new corpus holding this one's documents followed by `inputs`.
    ///
    /// Existing rows are copied, not re-embedded; only `inputs` go through
    /// the provider. `self` is left untouched whether this succeeds or not.
    pub fn extend(
        &self,
        inputs: Vec<DocumentInput>,
        provider: &dyn EmbeddingProvider,
        batch_size: usize,
        norm_tolerance: f32,
    ) -> Result<Corpus> {
        let mut index = VectorIndex::from_normalized_rows(self.index.rows())?;
        if let Some(position) = index.rows().position(|row| !is_unit(row, norm_tolerance)) {
            return Err(RetrievalError::DegenerateVector { position: Some(position) });
        }

        let vectors = embed_all(&inputs, provider, batch_size)?;
        index.append(vectors)?;

        let mut store = self.store.clone();
        for input in inputs {
            store.add(input);
        }

        Corpus::assemble(store, index)
    }

    fn assemble(store: DocumentStore, index: VectorIndex) -> Result<Corpus> {
        if store.len() != index.len() {
            // Unreachable through the builder; guard the invariant anyway
            return Err(RetrievalError::Corpus(format!(
                "store holds {} documents but index holds {} vectors",
                store.len(),
                index.len()
            )));
        }
        Ok(Corpus { store, index })
    }
}

/// Collects documents, then embeds and indexes them in one go.
#[derive(Debug, Clone)]
pub struct CorpusBuilder {
    inputs: Vec<DocumentInput>,
    batch_size: usize,
}

impl CorpusBuilder {
    pub fn new(batch_size: usize) -> Self {
        Self {
            inputs: Vec::new(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn push(&mut self, input: DocumentInput) -> &mut Self {
        self.inputs.push(input);
        self
    }

    pub fn extend<I: IntoIterator<Item = DocumentInput>>(&mut self, inputs: I) -> &mut Self {
        self.inputs.extend(inputs);
        self
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Embed every queued document and build the aligned pair.
    ///
    /// Any provider, dimension or normalization failure aborts the whole
    /// build; no partial corpus is returned.
    pub fn build(self, provider: &dyn EmbeddingProvider) -> Result<Corpus> {
        let start = Instant::now();
        let vectors = embed_all(&self.inputs, provider, self.batch_size)?;
        let index = VectorIndex::build(vectors).map_err(|e| {
            warn!(target: "seekcore::corpus", error = %e, "vector index build failed");
            e
        })?;

        let mut store = DocumentStore::new();
        for input in self.inputs {
            store.add(input);
        }

        let corpus = Corpus::assemble(store, index)?;
        info!(
            target: "seekcore::corpus",
            documents = corpus.len(),
            dimensions = ?corpus.dimensions(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "corpus built"
        );
        Ok(corpus)
    }
}

/// Embed the composed text of each input, `batch_size` texts per call.
fn embed_all(
    inputs: &[DocumentInput],
    provider: &dyn EmbeddingProvider,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = inputs.iter().map(DocumentInput::embedding_text).collect();
    let mut vectors = Vec::with_capacity(texts.len());
    let declared = provider.dimensions();

    for (batch_no, batch) in texts.chunks(batch_size.max(1)).enumerate() {
        let embedded = provider.embed_batch(batch).map_err(|e| {
            warn!(target: "seekcore::corpus", batch = batch_no, error = %e, "embedding batch failed");
            RetrievalError::EmbeddingUnavailable(e)
        })?;

        if embedded.len() != batch.len() {
            warn!(
                target: "seekcore::corpus",
                batch = batch_no,
                expected = batch.len(),
                got = embedded.len(),
                "provider returned wrong batch size"
            );
            return Err(RetrievalError::EmbeddingUnavailable(ProviderError::Malformed(format!(
                "expected {} vectors, got {}",
                batch.len(),
                embedded.len()
            ))));
        }

        if let Some(dim) = declared {
            if let Some(bad) = embedded.iter().find(|v| v.len() != dim) {
                return Err(RetrievalError::EmbeddingUnavailable(ProviderError::Malformed(format!(
                    "provider declares {} dimensions, returned {}",
                    dim,
                    bad.len()
                ))));
            }
        }

        debug!(target: "seekcore::corpus", batch = batch_no, size = batch.len(), "batch embedded");
        vectors.extend(embedded);
    }

    Ok(vectors)
}
