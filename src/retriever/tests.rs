use super::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Provider backed by a lookup table, with a switch to simulate an outage.
struct ScriptedProvider {
    table: HashMap<String, Vec<f32>>,
    down: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(entries: &[(&str, &[f32])]) -> Arc<Self> {
        Arc::new(Self {
            table: entries.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect(),
            down: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

impl EmbeddingProvider for ScriptedProvider {
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("connection refused".into()));
        }
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| ProviderError::Malformed(format!("unknown text {:?}", text)))
    }
}

fn titled(title: &str) -> DocumentInput {
    DocumentInput::new(title, "")
        .with_category("")
        .with_source_url(format!("https://example.com/{}", title))
}

/// Corpus of three 2-D documents: (1,0), (0,1), (0.7,0.7).
fn scenario() -> (Arc<ScriptedProvider>, Retriever) {
    let provider = ScriptedProvider::new(&[
        ("doc0", &[1.0, 0.0]),
        ("doc1", &[0.0, 1.0]),
        ("doc2", &[0.7, 0.7]),
        ("east", &[1.0, 0.0]),
        ("zero", &[0.0, 0.0]),
        ("wide", &[1.0, 0.0, 0.0]),
    ]);
    let retriever = Retriever::new(provider.clone());
    retriever
        .rebuild(vec![titled("doc0"), titled("doc1"), titled("doc2")])
        .unwrap();
    (provider, retriever)
}

fn ids(retrieval: &Retrieval) -> Vec<u32> {
    retrieval.results().iter().map(|r| r.document.id).collect()
}

// ============================================================================
// Readiness
// ============================================================================

#[test]
fn test_retrieve_before_build_is_not_ready() {
    let provider = ScriptedProvider::new(&[("east", &[1.0, 0.0])]);
    let retriever = Retriever::new(provider.clone());

    assert_eq!(retriever.state(), IndexState::Uninitialized);
    assert_eq!(retriever.retrieve("east", 2, 0.3), Err(RetrievalError::IndexNotReady));
    // Rejected before the provider is consulted
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failed_first_build_returns_to_uninitialized() {
    let provider = ScriptedProvider::new(&[("a", &[0.0, 0.0])]);
    let retriever = Retriever::new(provider);

    let err = retriever.rebuild(vec![titled("a")]).unwrap_err();
    assert_eq!(err, RetrievalError::DegenerateVector { position: Some(0) });
    assert_eq!(retriever.state(), IndexState::Uninitialized);
    assert!(retriever.snapshot().is_none());
}

#[test]
fn test_rebuild_makes_ready() {
    let (_, retriever) = scenario();
    assert!(retriever.is_ready());
    let stats = retriever.stats();
    assert_eq!(stats.state, IndexState::Ready);
    assert_eq!(stats.total_documents, 3);
    assert_eq!(stats.dimensions, Some(2));
    assert!(stats.built_at.is_some());
    assert!(!stats.rebuilding);
}

// ============================================================================
// Query behaviour
// ============================================================================

#[test]
fn test_three_document_scenario() {
    let (_, retriever) = scenario();
    let retrieval = retriever.retrieve("east", 2, 0.3).unwrap();

    assert_eq!(ids(&retrieval), vec![0, 2]);
    let results = retrieval.results();
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert!((results[1].score - 0.7071).abs() < 1e-3);
    assert_eq!(results[0].document.title, "doc0");
    assert_eq!(results[1].document.source_url, "https://example.com/doc2");
}

#[test]
fn test_retrieve_default_uses_config() {
    let (_, retriever) = scenario();
    assert_eq!(
        retriever.retrieve_default("east").unwrap(),
        retriever.retrieve("east", 2, 0.3).unwrap()
    );
}

#[test]
fn test_threshold_is_exclusive() {
    let low = (1.0f32 - 0.29 * 0.29).sqrt();
    let high = (1.0f32 - 0.31 * 0.31).sqrt();
    let provider = ScriptedProvider::new(&[
        ("low", &[0.29, low]),
        ("high", &[0.31, high]),
        ("east", &[1.0, 0.0]),
    ]);
    let retriever = Retriever::new(provider);
    retriever.rebuild(vec![titled("low"), titled("high")]).unwrap();

    let retrieval = retriever.retrieve("east", 5, 0.3).unwrap();
    assert_eq!(ids(&retrieval), vec![1]);
}

#[test]
fn test_no_match_sentinel() {
    let provider = ScriptedProvider::new(&[("north", &[0.0, 1.0]), ("east", &[1.0, 0.0])]);
    let retriever = Retriever::new(provider);
    retriever.rebuild(vec![titled("north")]).unwrap();

    let retrieval = retriever.retrieve("east", 2, 0.3).unwrap();
    assert_eq!(retrieval, Retrieval::NoMatch);
    assert!(!retrieval.is_match());
    assert!(retrieval.into_results().is_empty());
}

#[test]
fn test_empty_corpus_is_ready_but_matches_nothing() {
    let provider = ScriptedProvider::new(&[("east", &[1.0, 0.0])]);
    let retriever = Retriever::new(provider);
    retriever.rebuild(Vec::new()).unwrap();

    assert!(retriever.is_ready());
    assert_eq!(retriever.retrieve("east", 2, 0.3).unwrap(), Retrieval::NoMatch);
}

#[test]
fn test_retrieve_is_idempotent() {
    let (_, retriever) = scenario();
    let first = retriever.retrieve("east", 3, -1.0).unwrap();
    let second = retriever.retrieve("east", 3, -1.0).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_top_k_caps_results() {
    let (_, retriever) = scenario();
    let retrieval = retriever.retrieve("east", 1, -1.0).unwrap();
    assert_eq!(retrieval.results().len(), 1);

    let retrieval = retriever.retrieve("east", 10, -1.0).unwrap();
    assert_eq!(ids(&retrieval), vec![0, 2, 1]);
}

// ============================================================================
// Query errors
// ============================================================================

#[test]
fn test_provider_outage_surfaces() {
    let (provider, retriever) = scenario();
    provider.set_down(true);

    let err = retriever.retrieve("east", 2, 0.3).unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::EmbeddingUnavailable(ProviderError::Unavailable(_))
    ));
}

#[test]
fn test_wrong_query_dimension_is_unavailable() {
    let (_, retriever) = scenario();
    let err = retriever.retrieve("wide", 2, 0.3).unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::EmbeddingUnavailable(ProviderError::Malformed(_))
    ));
}

#[test]
fn test_zero_query_vector_is_degenerate() {
    let (_, retriever) = scenario();
    let err = retriever.retrieve("zero", 2, 0.3).unwrap_err();
    assert_eq!(err, RetrievalError::DegenerateVector { position: None });
}

#[test]
fn test_invalid_arguments() {
    let (_, retriever) = scenario();
    assert!(matches!(
        retriever.retrieve("east", 0, 0.3),
        Err(RetrievalError::InvalidArgument(_))
    ));
    assert!(matches!(
        retriever.retrieve("east", 2, f32::NAN),
        Err(RetrievalError::InvalidArgument(_))
    ));
}

#[test]
fn test_with_config_validates() {
    let provider = ScriptedProvider::new(&[]);
    let bad = RetrieverConfig::default().with_top_k(0);
    assert!(Retriever::with_config(provider.clone(), bad).is_err());

    let good = RetrieverConfig::default().with_top_k(3);
    let retriever = Retriever::with_config(provider, good).unwrap();
    assert_eq!(retriever.config().top_k, 3);
}

// ============================================================================
// Rebuild / ingest
// ============================================================================

#[test]
fn test_failed_rebuild_keeps_previous_corpus() {
    let (provider, retriever) = scenario();
    let before = retriever.snapshot().unwrap();

    provider.set_down(true);
    let err = retriever.rebuild(vec![titled("doc0")]).unwrap_err();
    assert!(matches!(err, RetrievalError::EmbeddingUnavailable(_)));
    provider.set_down(false);

    assert_eq!(retriever.state(), IndexState::Ready);
    let after = retriever.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(ids(&retriever.retrieve("east", 2, 0.3).unwrap()), vec![0, 2]);
}

#[test]
fn test_rebuild_replaces_wholesale() {
    let (_, retriever) = scenario();
    let before = retriever.snapshot().unwrap();

    retriever.rebuild(vec![titled("doc1")]).unwrap();
    let after = retriever.snapshot().unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.len(), 3);
    assert_eq!(after.len(), 1);
    assert_eq!(retriever.retrieve("east", 2, 0.3).unwrap(), Retrieval::NoMatch);
}

#[test]
fn test_ingest_into_uninitialized() {
    let provider = ScriptedProvider::new(&[("doc0", &[1.0, 0.0]), ("east", &[1.0, 0.0])]);
    let retriever = Retriever::new(provider);

    assert_eq!(retriever.ingest(titled("doc0")).unwrap(), 0);
    assert!(retriever.is_ready());
    assert_eq!(ids(&retriever.retrieve("east", 2, 0.3).unwrap()), vec![0]);
}

#[test]
fn test_ingest_appends_ids() {
    let provider = ScriptedProvider::new(&[
        ("doc0", &[1.0, 0.0]),
        ("doc1", &[0.0, 1.0]),
        ("doc2", &[0.7, 0.7]),
        ("more", &[0.9, 0.1]),
        ("east", &[1.0, 0.0]),
    ]);
    let retriever = Retriever::new(provider.clone());
    retriever.rebuild(vec![titled("doc0"), titled("doc1"), titled("doc2")]).unwrap();
    let calls_after_build = provider.calls.load(Ordering::SeqCst);

    let new_ids = retriever.ingest_many(vec![titled("more")]).unwrap();
    assert_eq!(new_ids, vec![3]);
    // Only the new document was embedded
    assert_eq!(provider.calls.load(Ordering::SeqCst), calls_after_build + 1);
    assert_eq!(retriever.stats().total_documents, 4);
    assert_eq!(ids(&retriever.retrieve("east", 2, 0.3).unwrap()), vec![0, 3]);
}

#[test]
fn test_failed_ingest_keeps_corpus() {
    let (_, retriever) = scenario();
    let before = retriever.snapshot().unwrap();

    let err = retriever.ingest(titled("wide")).unwrap_err();
    assert_eq!(err, RetrievalError::DimensionMismatch { expected: 2, got: 3 });
    assert!(Arc::ptr_eq(&before, &retriever.snapshot().unwrap()));
}

#[test]
fn test_ingest_many_empty_is_noop() {
    let provider = ScriptedProvider::new(&[]);
    let retriever = Retriever::new(provider);
    assert!(retriever.ingest_many(Vec::new()).unwrap().is_empty());
    assert_eq!(retriever.state(), IndexState::Uninitialized);
}

#[test]
fn test_publish_prebuilt_corpus() {
    let provider = ScriptedProvider::new(&[("doc0", &[1.0, 0.0]), ("east", &[1.0, 0.0])]);
    let mut builder = CorpusBuilder::new(8);
    builder.push(titled("doc0"));
    let corpus = builder.build(provider.as_ref()).unwrap();

    let retriever = Retriever::new(provider);
    retriever.publish(corpus);
    assert!(retriever.is_ready());
    assert_eq!(ids(&retriever.retrieve("east", 1, 0.3).unwrap()), vec![0]);
}

#[test]
fn test_publish_replaces_active_corpus() {
    let provider = ScriptedProvider::new(&[
        ("doc0", &[1.0, 0.0]),
        ("doc1", &[0.0, 1.0]),
        ("north", &[0.0, 1.0]),
    ]);
    let retriever = Retriever::new(provider.clone());
    retriever.rebuild(vec![titled("doc0")]).unwrap();

    let mut builder = CorpusBuilder::new(8);
    builder.push(titled("doc0")).push(titled("doc1"));
    retriever.publish(builder.build(provider.as_ref()).unwrap());

    let stats = retriever.stats();
    assert_eq!(stats.state, IndexState::Ready);
    assert!(!stats.rebuilding);
    assert_eq!(stats.total_documents, 2);
    assert!(stats.built_at.is_some());
    assert_eq!(ids(&retriever.retrieve("north", 1, 0.3).unwrap()), vec![1]);
}

#[test]
fn test_load_corpus_file() {
    let path = std::env::temp_dir().join(format!("seekcore-corpus-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"[{"title": "doc0", "content": ""}, {"title": "doc1", "content": "", "genre": ""}]"#,
    )
    .unwrap();

    let provider = ScriptedProvider::new(&[("doc0", &[1.0, 0.0]), ("doc1", &[0.0, 1.0])]);
    let retriever = Retriever::new(provider);
    let stats = retriever.load_corpus_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(stats.total_documents, 2);
    assert_eq!(stats.state, IndexState::Ready);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_retriever_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Retriever>();
}

#[test]
fn test_readers_see_whole_corpora_during_rebuilds() {
    let provider = ScriptedProvider::new(&[("doc0", &[1.0, 0.0]), ("east", &[1.0, 0.0])]);
    let retriever = Retriever::new(provider);
    let small: Vec<DocumentInput> = (0..2).map(|_| titled("doc0")).collect();
    let large: Vec<DocumentInput> = (0..7).map(|_| titled("doc0")).collect();
    retriever.rebuild(small.clone()).unwrap();

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..200 {
                    let n = retriever.retrieve("east", 10, 0.3).unwrap().results().len();
                    assert!(n == 2 || n == 7, "saw partial corpus of {} documents", n);
                }
            });
        }
        s.spawn(|| {
            for round in 0..20 {
                let docs = if round % 2 == 0 { large.clone() } else { small.clone() };
                retriever.rebuild(docs).unwrap();
            }
        });
    });

    assert!(retriever.is_ready());
}

#[test]
fn test_concurrent_ingests_lose_nothing() {
    let provider = ScriptedProvider::new(&[("doc0", &[1.0, 0.0])]);
    let retriever = Retriever::new(provider);

    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..10 {
                    retriever.ingest(titled("doc0")).unwrap();
                }
            });
        }
    });

    let corpus = retriever.snapshot().unwrap();
    assert_eq!(corpus.len(), 40);
    let ids: Vec<u32> = corpus.documents().all().map(|(id, _)| id).collect();
    assert_eq!(ids, (0..40).collect::<Vec<u32>>());
}
