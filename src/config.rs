//! Corpus file support.
//!
//! A deployment can replace the built-in sample knowledge base with its own
//! documents by pointing the server at a YAML or JSON file. The format is
//! picked from the file extension (`.yaml`/`.yml` → YAML, anything else →
//! JSON).
//!
//! ## Example YAML corpus
//!
//! ```yaml
//! version: "1.0"
//! name: "Team handbook"
//! documents:
//!   - id: "onboarding"
//!     title: "Onboarding Checklist"
//!     text: "Request laptop access, join the team channel, read the runbook."
//!     url: "https://intranet.example/onboarding"
//!     metadata:
//!       category: "people"
//!   - id: "oncall"
//!     title: "On-call Rotation"
//!     text: "Primary and secondary rotate weekly on Monday mornings."
//! ```

use std::fs;
use std::path::Path;

use corpus::{CorpusError, Document, DocumentStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a corpus file
#[derive(Debug, Error)]
pub enum CorpusFileError {
    #[error("failed to read corpus file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("unsupported corpus version: {0}")]
    UnsupportedVersion(String),

    #[error("corpus contains no documents")]
    Empty,

    #[error("invalid corpus: {0}")]
    Invalid(#[from] CorpusError),
}

/// On-disk corpus description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusFile {
    /// Format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional human-readable corpus name
    #[serde(default)]
    pub name: Option<String>,

    pub documents: Vec<Document>,
}

impl CorpusFile {
    /// Load a corpus file, choosing the parser from the extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CorpusFileError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let corpus = if is_yaml {
            Self::from_yaml(&content)?
        } else {
            Self::from_json(&content)?
        };
        tracing::info!(
            path = %path.display(),
            documents = corpus.documents.len(),
            "corpus file loaded"
        );
        Ok(corpus)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, CorpusFileError> {
        let corpus: CorpusFile = serde_yaml::from_str(yaml)?;
        corpus.validate()?;
        Ok(corpus)
    }

    pub fn from_json(json: &str) -> Result<Self, CorpusFileError> {
        let corpus: CorpusFile = serde_json::from_str(json)?;
        corpus.validate()?;
        Ok(corpus)
    }

    fn validate(&self) -> Result<(), CorpusFileError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(CorpusFileError::UnsupportedVersion(v.to_string())),
        }
        if self.documents.is_empty() {
            return Err(CorpusFileError::Empty);
        }
        Ok(())
    }

    /// Build the read-only store; duplicate or empty ids are rejected here.
    pub fn into_store(self) -> Result<DocumentStore, CorpusFileError> {
        Ok(DocumentStore::new(self.documents)?)
    }
}

/// Store from `path` when given, otherwise the built-in sample corpus.
pub fn load_store(path: Option<&Path>) -> Result<DocumentStore, CorpusFileError> {
    match path {
        Some(path) => CorpusFile::from_file(path)?.into_store(),
        None => Ok(DocumentStore::sample()),
    }
}

fn default_version() -> String {
    "1.0".to_string()
}
