//! Workspace umbrella crate for the knowledge-base gateway.
//!
//! Re-exports the corpus layer (document store and ranking) and adds corpus
//! file loading so the server and the demo CLI share one entry point for
//! building a [`DocumentStore`].

pub mod config;

pub use config::{load_store, CorpusFile, CorpusFileError};
pub use corpus::{
    sample_documents, score_document, snippet, CorpusError, Document, DocumentStore, Query,
    SearchEngine, SearchResult, DEFAULT_MAX_RESULTS, DEFAULT_METADATA_WEIGHT, SNIPPET_CHARS, TEXT_WEIGHT,
    TITLE_WEIGHT,
};
