use crate::error::CorpusError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A single knowledge-base entry.
///
/// Documents are immutable once handed to a [`DocumentStore`]; the store owns
/// them for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Stable identifier, unique within a store.
    pub id: String,
    pub title: String,
    /// Full body text.
    pub text: String,
    /// Citation URL. Serialized as `null` when absent.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
            url: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Read-only collection of documents with id lookup.
///
/// Insertion order is preserved so that full scans (and therefore search tie
/// breaking) are deterministic. There is no mutation API after construction,
/// which makes the store safe to share behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    by_id: HashMap<String, usize>,
}

impl DocumentStore {
    /// Build a store, rejecting empty or duplicate ids.
    pub fn new(documents: Vec<Document>) -> Result<Self, CorpusError> {
        let mut by_id = HashMap::with_capacity(documents.len());
        for (position, doc) in documents.iter().enumerate() {
            if doc.id.trim().is_empty() {
                return Err(CorpusError::EmptyId);
            }
            if by_id.insert(doc.id.clone(), position).is_some() {
                return Err(CorpusError::DuplicateId(doc.id.clone()));
            }
        }

        tracing::debug!(documents = documents.len(), "document store loaded");
        Ok(Self { documents, by_id })
    }

    /// The built-in sample corpus.
    pub fn sample() -> Self {
        let documents = crate::sample::sample_documents();
        let by_id = documents
            .iter()
            .enumerate()
            .map(|(position, doc)| (doc.id.clone(), position))
            .collect();
        Self { documents, by_id }
    }

    pub fn get(&self, id: &str) -> Result<&Document, CorpusError> {
        self.by_id
            .get(id)
            .map(|&position| &self.documents[position])
            .ok_or_else(|| CorpusError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All documents in insertion order.
    pub fn all(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
