use crate::document::{Document, DocumentStore};
use crate::query::{find_case_insensitive, Query};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Weight of a query term found in the title.
pub const TITLE_WEIGHT: u32 = 3;
/// Weight of a query term found in the body text.
pub const TEXT_WEIGHT: u32 = 1;
/// Default weight of a query term found in any metadata value. Metadata
/// does not count unless an engine opts in with
/// [`SearchEngine::with_metadata_weight`].
pub const DEFAULT_METADATA_WEIGHT: u32 = 0;

/// Maximum snippet length in characters, excluding ellipses.
pub const SNIPPET_CHARS: usize = 200;
/// Characters of context kept before the first matched term.
const SNIPPET_LEAD_CHARS: usize = 40;

pub const DEFAULT_MAX_RESULTS: usize = 10;

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    /// Excerpt of the document text around the first match.
    #[serde(rename = "text")]
    pub snippet: String,
    pub url: Option<String>,
    pub score: u32,
}

/// Ranks documents of a [`DocumentStore`] against free-text queries.
///
/// Every call scans the store afresh; nothing is cached between queries.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    store: Arc<DocumentStore>,
    max_results: usize,
    metadata_weight: u32,
}

impl SearchEngine {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            store,
            max_results: DEFAULT_MAX_RESULTS,
            metadata_weight: DEFAULT_METADATA_WEIGHT,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_metadata_weight(mut self, weight: u32) -> Self {
        self.metadata_weight = weight;
        self
    }

    pub fn metadata_weight(&self) -> u32 {
        self.metadata_weight
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Results ordered by descending score; ties keep store order.
    ///
    /// Blank queries return no results.
    pub fn search(&self, query: &Query) -> Vec<SearchResult> {
        if query.is_blank() {
            return Vec::new();
        }
        let terms = query.terms();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(u32, &Document)> = self
            .store
            .all()
            .iter()
            .filter_map(|doc| {
                let score = score_document(doc, &terms, self.metadata_weight);
                (score > 0).then_some((score, doc))
            })
            .collect();

        // stable: equal scores stay in insertion order
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(self.max_results);

        tracing::debug!(
            query = %query.raw_text,
            terms = terms.len(),
            hits = scored.len(),
            "search completed"
        );

        scored
            .into_iter()
            .map(|(score, doc)| SearchResult {
                id: doc.id.clone(),
                title: doc.title.clone(),
                snippet: snippet(&doc.text, &terms),
                url: doc.url.clone(),
                score,
            })
            .collect()
    }
}

/// Weighted count of query terms present in each field.
///
/// With `metadata_weight == 0` this is `3 × title overlap + 1 × text overlap`.
pub fn score_document(doc: &Document, terms: &[String], metadata_weight: u32) -> u32 {
    let overlap = |field: &str| -> u32 {
        terms
            .iter()
            .filter(|term| find_case_insensitive(field, term).is_some())
            .count() as u32
    };
    let base = TITLE_WEIGHT * overlap(&doc.title) + TEXT_WEIGHT * overlap(&doc.text);
    if metadata_weight == 0 {
        return base;
    }

    let metadata_overlap = terms
        .iter()
        .filter(|term| {
            doc.metadata
                .values()
                .any(|value| find_case_insensitive(value, term).is_some())
        })
        .count() as u32;

    base + metadata_weight * metadata_overlap
}

/// Bounded excerpt of `text` starting shortly before the earliest term match,
/// or the leading characters when no term occurs in the text.
pub fn snippet(text: &str, terms: &[String]) -> String {
    let first_match = terms
        .iter()
        .filter_map(|term| find_case_insensitive(text, term))
        .min();

    let start = match first_match {
        Some(offset) => text[..offset]
            .chars()
            .count()
            .saturating_sub(SNIPPET_LEAD_CHARS),
        None => 0,
    };

    let total = text.chars().count();
    let body: String = text.chars().skip(start).take(SNIPPET_CHARS).collect();

    let mut out = String::with_capacity(body.len() + 6);
    if start > 0 {
        out.push_str("...");
    }
    out.push_str(&body);
    if start + SNIPPET_CHARS < total {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SearchEngine {
        SearchEngine::new(Arc::new(DocumentStore::sample()))
    }

    fn terms(raw: &str) -> Vec<String> {
        Query::new(raw).terms()
    }

    #[test]
    fn python_ranks_best_practices_first() {
        let results = engine().search(&Query::new("python"));
        assert!(!results.is_empty());
        assert_eq!(results[0].id, "doc1");
        assert_eq!(results[0].title, "Python Best Practices");
        assert!(results[0].score > 0);
    }

    #[test]
    fn scores_are_non_increasing() {
        let engine = engine();
        for raw in ["python", "tests design", "data integrity input", "api python type"] {
            let results = engine.search(&Query::new(raw));
            for pair in results.windows(2) {
                assert!(pair[0].score >= pair[1].score, "query {raw:?}");
            }
        }
    }

    #[test]
    fn empty_and_blank_queries_return_nothing() {
        let engine = engine();
        assert!(engine.search(&Query::new("")).is_empty());
        assert!(engine.search(&Query::new("   \n")).is_empty());
        assert!(engine.search(&Query::new("a ? !")).is_empty());
    }

    #[test]
    fn short_queries_still_match() {
        let results = engine().search(&Query::new("3.7"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "doc2");
        assert_eq!(results[0].score, TEXT_WEIGHT);
    }

    #[test]
    fn non_matching_documents_are_excluded() {
        let results = engine().search(&Query::new("kubernetes"));
        assert!(results.is_empty());
    }

    #[test]
    fn title_outweighs_text() {
        let store = DocumentStore::new(vec![
            Document::new("body", "Unrelated", "all about gardening"),
            Document::new("head", "Gardening", "nothing here"),
        ])
        .unwrap();
        let results = SearchEngine::new(Arc::new(store)).search(&Query::new("gardening"));
        assert_eq!(results[0].id, "head");
        assert_eq!(results[0].score, TITLE_WEIGHT);
        assert_eq!(results[1].score, TEXT_WEIGHT);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let store = DocumentStore::new(vec![
            Document::new("first", "A", "shared word"),
            Document::new("second", "B", "shared word"),
            Document::new("third", "C", "shared word"),
        ])
        .unwrap();
        let results = SearchEngine::new(Arc::new(store)).search(&Query::new("shared"));
        let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn default_scores_use_title_and_text_only() {
        let scored = |raw: &str| -> Vec<(String, u32)> {
            engine()
                .search(&Query::new(raw))
                .into_iter()
                .map(|r| (r.id, r.score))
                .collect()
        };

        assert_eq!(
            scored("python"),
            vec![("doc1".to_string(), 4), ("doc2".to_string(), 1)]
        );
        // only present as a metadata value
        assert!(scored("programming").is_empty());
    }

    #[test]
    fn metadata_values_contribute_when_weighted() {
        let store = Arc::new(
            DocumentStore::new(vec![
                Document::new("plain", "Notes", "nothing relevant"),
                Document::new("tagged", "Notes", "nothing relevant").with_metadata("topic", "rust"),
            ])
            .unwrap(),
        );

        let unweighted = SearchEngine::new(Arc::clone(&store)).search(&Query::new("rust"));
        assert!(unweighted.is_empty());

        let results = SearchEngine::new(store)
            .with_metadata_weight(2)
            .search(&Query::new("rust"));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "tagged");
        assert_eq!(results[0].score, 2);
    }

    #[test]
    fn max_results_caps_output() {
        let results = engine().with_max_results(1).search(&Query::new("tests python"));
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn snippet_starts_near_match() {
        let text = format!("{}needle and more", "x".repeat(300));
        let out = snippet(&text, &terms("needle"));
        assert!(out.starts_with("..."));
        assert!(out.contains("needle"));
        assert!(out.chars().count() <= SNIPPET_CHARS + 6);
    }

    #[test]
    fn snippet_without_match_uses_prefix() {
        let text = "y".repeat(250);
        let out = snippet(&text, &terms("absent"));
        assert!(out.starts_with("yyy"));
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), SNIPPET_CHARS + 3);
    }

    #[test]
    fn short_text_snippet_is_whole_text() {
        let out = snippet("short body", &terms("body"));
        assert_eq!(out, "short body");
    }

    #[test]
    fn results_resolve_in_store() {
        let engine = engine();
        for result in engine.search(&Query::new("tests design python security")) {
            assert!(engine.store().contains(&result.id));
        }
    }
}
