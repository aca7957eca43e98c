//! JS bindings for the retriever.
//!
//! The embedding model lives on the JS side: the handle is constructed with
//! a synchronous `(text: string) => number[]` function and calls it for every
//! document at build time and every query.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use js_sys::Function;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::config::RetrieverConfig;
use crate::embeddings::EmbeddingProvider;
use crate::error::{ProviderError, RetrievalError};
use crate::retriever::Retriever;
use crate::store::DocumentInput;

thread_local! {
    /// Embed functions registered by live handles, keyed by provider id.
    static EMBED_FNS: RefCell<HashMap<u32, Function>> = RefCell::new(HashMap::new());
}

static NEXT_PROVIDER_ID: AtomicU32 = AtomicU32::new(0);

/// Adapts a JS embed function to `EmbeddingProvider`.
///
/// The `Function` stays in the registry of the thread that created it; the
/// provider only carries the key. Calls from any other thread find no entry
/// and fail as `Unavailable`.
struct JsEmbeddingProvider {
    id: u32,
}

impl JsEmbeddingProvider {
    fn register(embed_fn: Function) -> Self {
        let id = NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed);
        EMBED_FNS.with(|fns| fns.borrow_mut().insert(id, embed_fn));
        Self { id }
    }
}

impl Drop for JsEmbeddingProvider {
    fn drop(&mut self) {
        // try_with: the registry may already be gone during thread teardown
        let _ = EMBED_FNS.try_with(|fns| fns.borrow_mut().remove(&self.id));
    }
}

impl EmbeddingProvider for JsEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let embed_fn = EMBED_FNS
            .with(|fns| fns.borrow().get(&self.id).cloned())
            .ok_or_else(|| {
                ProviderError::Unavailable("embed function not registered on this thread".into())
            })?;

        let value = embed_fn
            .call1(&JsValue::NULL, &JsValue::from_str(text))
            .map_err(|e| ProviderError::Unavailable(format!("{:?}", e)))?;

        serde_wasm_bindgen::from_value::<Vec<f32>>(value)
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

/// Serialize as plain JS objects. Flattened structs go through
/// `serialize_map`, which the default serializer turns into an ES `Map`.
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js(e: RetrievalError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryOptions {
    top_k: Option<usize>,
    min_score: Option<f32>,
}

/// Retriever handle exported to JS.
///
/// # Example (TypeScript)
/// ```typescript
/// const seek = new RetrieverHandle((text) => model.embed(text));
/// seek.loadCorpus(docs);
/// const out = seek.retrieve("how should a knight spend stat points?");
/// if (out.status === "matches") render(out.results);
/// ```
#[wasm_bindgen]
pub struct RetrieverHandle {
    inner: Retriever,
}

#[wasm_bindgen]
impl RetrieverHandle {
    #[wasm_bindgen(constructor)]
    pub fn new(embed_fn: Function) -> RetrieverHandle {
        RetrieverHandle {
            inner: Retriever::new(Arc::new(JsEmbeddingProvider::register(embed_fn))),
        }
    }

    /// Create with a `RetrieverConfig` object (missing keys take defaults).
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(embed_fn: Function, config: JsValue) -> Result<RetrieverHandle, JsValue> {
        let config: RetrieverConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        let inner = Retriever::with_config(Arc::new(JsEmbeddingProvider::register(embed_fn)), config)
            .map_err(to_js)?;
        Ok(RetrieverHandle { inner })
    }

    /// Replace the corpus. Returns stats for the published corpus.
    #[wasm_bindgen(js_name = loadCorpus)]
    pub fn load_corpus(&self, docs: JsValue) -> Result<JsValue, JsValue> {
        let docs: Vec<DocumentInput> = serde_wasm_bindgen::from_value(docs)
            .map_err(|e| JsValue::from_str(&format!("Invalid documents: {}", e)))?;
        let stats = self.inner.rebuild(docs).map_err(to_js)?;
        to_js_value(&stats)
    }

    /// Add one document; returns its id.
    #[wasm_bindgen(js_name = addDocument)]
    pub fn add_document(&self, doc: JsValue) -> Result<u32, JsValue> {
        let doc: DocumentInput = serde_wasm_bindgen::from_value(doc)
            .map_err(|e| JsValue::from_str(&format!("Invalid document: {}", e)))?;
        self.inner.ingest(doc).map_err(to_js)
    }

    /// Returns `{ status: "matches", results }` or `{ status: "no_match" }`.
    /// `options` may carry `topK` and `minScore`.
    #[wasm_bindgen]
    pub fn retrieve(&self, query: &str, options: JsValue) -> Result<JsValue, JsValue> {
        let (top_k, min_score) = if options.is_undefined() || options.is_null() {
            (self.inner.config().top_k, self.inner.config().min_score)
        } else {
            let opts: QueryOptions = serde_wasm_bindgen::from_value(options)
                .map_err(|e| JsValue::from_str(&format!("Invalid options: {}", e)))?;
            (
                opts.top_k.unwrap_or(self.inner.config().top_k),
                opts.min_score.unwrap_or(self.inner.config().min_score),
            )
        };

        let retrieval = self.inner.retrieve(query, top_k, min_score).map_err(to_js)?;
        to_js_value(&retrieval)
    }

    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> JsValue {
        to_js_value(&self.inner.stats()).unwrap_or(JsValue::NULL)
    }
}
