// seekcore/src/embeddings/hashing.rs
//
// Deterministic feature-hashing embedder. It is a stand-in for a real model
// in demos and tests: texts that share words or character bigrams land near
// each other, but there is no semantics beyond surface overlap.

use unicode_segmentation::UnicodeSegmentation;

use super::EmbeddingProvider;
use crate::error::ProviderError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bigram features count for less than whole words.
const BIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct FeatureHashEmbedder {
    dimensions: usize,
}

impl FeatureHashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, feature: &str, salt: u8) -> (usize, f32) {
        let mut hash = FNV_OFFSET;
        for byte in std::iter::once(salt).chain(feature.bytes()) {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        let index = (hash % self.dimensions as u64) as usize;
        // Top bit picks the sign so collisions cancel instead of pile up
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

impl Default for FeatureHashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EmbeddingProvider for FeatureHashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if self.dimensions == 0 {
            return Err(ProviderError::Malformed("zero output dimensions".into()));
        }

        let mut vector = vec![0.0f32; self.dimensions];

        for word in text.unicode_words() {
            let word = word.to_lowercase();
            let (i, sign) = self.bucket(&word, 0);
            vector[i] += sign;

            let chars: Vec<&str> = word.graphemes(true).collect();
            for pair in chars.windows(2) {
                let bigram = format!("{}{}", pair[0], pair[1]);
                let (i, sign) = self.bucket(&bigram, 1);
                vector[i] += sign * BIGRAM_WEIGHT;
            }
        }

        Ok(vector)
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}
