use serde::{Deserialize, Serialize};

/// Terms shorter than this carry no useful signal for substring matching.
pub const MIN_TERM_CHARS: usize = 2;

/// A free-text search request. Built per call and discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub raw_text: String,
}

impl Query {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }

    /// Lowercased alphanumeric terms in order of first appearance, deduplicated.
    ///
    /// When every token is shorter than [`MIN_TERM_CHARS`] (`"C"`, `"3.7"`),
    /// the whole trimmed query becomes the single term instead.
    pub fn terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for raw in self.raw_text.split(|c: char| !c.is_alphanumeric()) {
            if raw.chars().count() < MIN_TERM_CHARS {
                continue;
            }
            let term = raw.to_lowercase();
            if !terms.contains(&term) {
                terms.push(term);
            }
        }

        if terms.is_empty() && !self.is_blank() {
            terms.push(self.raw_text.trim().to_lowercase());
        }
        terms
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Query::new(value)
    }
}

/// Byte offset in `haystack` of the first case-insensitive occurrence of
/// `needle_lower`, which must already be lowercase.
///
/// Works on the original text so the returned offset is always a valid char
/// boundary, even where lowercasing changes byte lengths.
pub fn find_case_insensitive(haystack: &str, needle_lower: &str) -> Option<usize> {
    if needle_lower.is_empty() {
        return None;
    }
    haystack
        .char_indices()
        .map(|(offset, _)| offset)
        .find(|&offset| starts_with_lower(&haystack[offset..], needle_lower))
}

fn starts_with_lower(candidate: &str, needle_lower: &str) -> bool {
    let mut lowered = candidate.chars().flat_map(char::to_lowercase);
    needle_lower
        .chars()
        .all(|expected| lowered.next() == Some(expected))
}
