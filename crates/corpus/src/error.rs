use thiserror::Error;

/// Errors raised by the document store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorpusError {
    #[error("document id must not be empty")]
    EmptyId,
    #[error("duplicate document id: {0}")]
    DuplicateId(String),
    #[error("document with id '{0}' not found")]
    NotFound(String),
}
