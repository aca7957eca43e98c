// seekcore/src/embeddings/mod.rs
//
// Embedding provider seam. Text-to-vector inference lives outside the crate;
// callers plug a model in through `EmbeddingProvider`.

pub mod hashing;

pub use hashing::FeatureHashEmbedder;

use crate::error::ProviderError;

/// Maps text to a fixed-dimension vector.
///
/// Implementations must be deterministic for identical input and return the
/// same length on every call. Timeouts are the implementation's concern; the
/// retriever never retries.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Batch form used at corpus build time. The default embeds one by one.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Output dimension, when known up front.
    fn dimensions(&self) -> Option<usize> {
        None
    }
}
