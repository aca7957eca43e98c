//! SeekCore: embedding-indexed document retrieval
//!
//! Answers free-text queries with the most similar documents from a small
//! corpus. Documents and queries are embedded by an external provider,
//! L2-normalized, and ranked by exact cosine similarity with a
//! minimum-score cutoff.
//!
//! # Architecture
//!
//! - `index/` - VectorIndex: contiguous normalized rows, brute-force top-k
//!   - `distance.rs` - magnitude / dot / normalize kernels
//!   - `pqueue.rs` - ScoredItem (score desc, id asc) for the top-k heap
//! - `store/` - DocumentStore: append-only metadata, id = position
//! - `corpus.rs` - Corpus: store + index built together, immutable once built
//! - `embeddings/` - EmbeddingProvider seam + feature-hashing stand-in
//! - `retriever/` - Retriever: lifecycle, atomic publish, retrieve()
//! - `config.rs` - RetrieverConfig and corpus file loading
//! - `wasm.rs` - RetrieverHandle for JS callers
//!
//! # Usage
//! ```
//! use std::sync::Arc;
//! use seekcore::{DocumentInput, FeatureHashEmbedder, Retrieval, Retriever};
//!
//! let retriever = Retriever::new(Arc::new(FeatureHashEmbedder::default()));
//! retriever
//!     .rebuild(vec![
//!         DocumentInput::new("Knight stat guide", "Strength first, stamina second")
//!             .with_category("class guide"),
//!         DocumentInput::new("Party tips", "One tank, two dealers, one healer")
//!             .with_category("play"),
//!     ])
//!     .unwrap();
//!
//! match retriever.retrieve("knight strength", 2, 0.0).unwrap() {
//!     Retrieval::Matches(hits) => assert_eq!(hits[0].document.title, "Knight stat guide"),
//!     Retrieval::NoMatch => unreachable!(),
//! }
//! ```

pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod index;
pub mod retriever;
pub mod store;
pub mod wasm;

pub use config::RetrieverConfig;
pub use corpus::{Corpus, CorpusBuilder};
pub use embeddings::{EmbeddingProvider, FeatureHashEmbedder};
pub use error::{ProviderError, Result, RetrievalError};
pub use index::{SearchResult, VectorIndex};
pub use retriever::{IndexState, IndexStats, Retrieval, RetrievedDocument, Retriever};
pub use store::{Document, DocumentInput, DocumentStore};

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("seekcore v{}", env!("CARGO_PKG_VERSION"))
}
