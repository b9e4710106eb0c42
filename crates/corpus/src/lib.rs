//! Knowledge-base corpus: storage and ranking.
//!
//! The corpus is small and static. It is loaded once at startup into a
//! [`DocumentStore`] and shared read-only between requests, so nothing in
//! this crate takes a lock or performs I/O.
//!
//! ## Ranking
//!
//! [`SearchEngine::search`] scores every document against the query terms:
//!
//! - a term found in the title counts [`TITLE_WEIGHT`]
//! - a term found in the body text counts [`TEXT_WEIGHT`]
//! - a term found in any metadata value counts the engine's metadata
//!   weight, which is [`DEFAULT_METADATA_WEIGHT`] (zero) unless configured
//!
//! Matching is a case-insensitive substring test per term. Zero-score
//! documents are dropped and ties keep store order, so the same query over
//! the same store always yields the same sequence.

mod document;
mod error;
mod query;
mod sample;
mod search;

pub use crate::document::{Document, DocumentStore};
pub use crate::error::CorpusError;
pub use crate::query::{find_case_insensitive, Query, MIN_TERM_CHARS};
pub use crate::sample::sample_documents;
pub use crate::search::{
    score_document, snippet, SearchEngine, SearchResult, DEFAULT_MAX_RESULTS, DEFAULT_METADATA_WEIGHT,
    SNIPPET_CHARS, TEXT_WEIGHT, TITLE_WEIGHT,
};
