// seekcore/src/config.rs
//
// Retrieval defaults and corpus file loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};
use crate::store::DocumentInput;

/// Retriever configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    /// Results requested from the index per query
    pub top_k: usize,

    /// Results must score strictly above this to count as a match
    pub min_score: f32,

    /// Texts per provider call when building a corpus
    pub batch_size: usize,

    /// Allowed deviation from unit norm for stored rows
    pub norm_tolerance: f32,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            min_score: 0.3,
            batch_size: 32,
            norm_tolerance: 1e-5,
        }
    }
}

impl RetrieverConfig {
    /// Builder: set top-k
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Builder: set score threshold
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Builder: set embedding batch size
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RetrievalError::InvalidArgument("top_k must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(RetrievalError::InvalidArgument("batch_size must be positive".into()));
        }
        if !self.min_score.is_finite() {
            return Err(RetrievalError::InvalidArgument(format!(
                "min_score must be finite, got {}",
                self.min_score
            )));
        }
        if !(self.norm_tolerance > 0.0 && self.norm_tolerance < 1.0) {
            return Err(RetrievalError::InvalidArgument(format!(
                "norm_tolerance must be in (0, 1), got {}",
                self.norm_tolerance
            )));
        }
        Ok(())
    }

    /// Parse and validate a JSON config. Missing keys take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RetrievalError::InvalidArgument(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            RetrievalError::InvalidArgument(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}

/// Parse a corpus: a JSON array of document records.
pub fn parse_corpus(json: &str) -> Result<Vec<DocumentInput>> {
    serde_json::from_str(json).map_err(|e| RetrievalError::Corpus(format!("invalid corpus: {}", e)))
}

/// Read a corpus file from disk.
pub fn load_corpus_file(path: impl AsRef<Path>) -> Result<Vec<DocumentInput>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|e| RetrievalError::Corpus(format!("cannot read {}: {}", path.display(), e)))?;
    let documents = parse_corpus(&json)?;
    tracing::debug!(
        target: "seekcore::config",
        path = %path.display(),
        documents = documents.len(),
        "corpus file parsed"
    );
    Ok(documents)
}
