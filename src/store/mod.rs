//! Document Store - metadata for indexed documents
//!
//! Documents are append-only and addressed by insertion position, which is
//! also their row in the paired `VectorIndex`.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Ingestion record, one per corpus entry.
///
/// Older corpus files label the category as `genre`; both keys are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub title: String,
    pub content: String,
    #[serde(default, alias = "genre")]
    pub category: String,
    #[serde(default)]
    pub source_url: String,
}

impl DocumentInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category: String::new(),
            source_url: String::new(),
        }
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Builder: set source URL
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = url.into();
        self
    }

    /// Text handed to the embedding provider: title, category, content.
    pub fn embedding_text(&self) -> String {
        [self.title.trim(), self.category.trim(), self.content.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A stored document. Immutable once added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: u32,
    pub title: String,
    pub content: String,
    pub category: String,
    pub source_url: String,
}

impl Document {
    fn from_input(id: u32, input: DocumentInput) -> Self {
        Self {
            id,
            title: input.title,
            content: input.content,
            category: input.category,
            source_url: input.source_url,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document; its id is the current count.
    pub fn add(&mut self, input: DocumentInput) -> u32 {
        let id = self.documents.len() as u32;
        self.documents.push(Document::from_input(id, input));
        id
    }

    pub fn get(&self, id: u32) -> Result<&Document> {
        self.documents
            .get(id as usize)
            .ok_or(RetrievalError::NotFound(id))
    }

    /// `(id, document)` pairs in insertion order. Call again to restart.
    pub fn all(&self) -> impl Iterator<Item = (u32, &Document)> + '_ {
        self.documents.iter().map(|doc| (doc.id, doc))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
