//! Term -> posting list storage with a tf-idf cache.
//!
//! Mutation follows a two-phase protocol: `add_documents` /
//! `remove_documents` edit postings and mark terms dirty, then
//! `build_inverted_index` refreshes scores and drops emptied terms. Queries
//! read the cache produced by the last build.

use crate::extraction::ExtractedDocument;
use crate::matching::relevance_coefficient;
use crate::models::{Position, SearchResult, WeightedPosition};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Document id -> occurrences of one term in that document.
pub type PostingList = BTreeMap<String, Vec<WeightedPosition>>;

#[derive(Debug, Clone, PartialEq)]
struct TfIdf {
    document_id: String,
    score: f64,
}

#[derive(Debug, Default)]
pub struct InvertedIndex {
    dictionary: BTreeMap<String, PostingList>,
    /// Total number of token occurrences per document.
    doc_length: BTreeMap<String, u32>,
    /// Terms of each document, so removal does not scan the dictionary.
    doc_terms: BTreeMap<String, BTreeSet<String>>,
    tfidf_cache: BTreeMap<String, Vec<TfIdf>>,
    terms_to_update: BTreeSet<String>,
    /// Document count the cache was last computed against.
    built_num_docs: u64,
    is_index_built: bool,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self {
            is_index_built: true,
            ..Default::default()
        }
    }

    pub fn number_documents(&self) -> u64 {
        self.doc_length.len() as u64
    }

    pub fn is_index_built(&self) -> bool {
        self.is_index_built
    }

    /// Exact-term lookup. Empty when the term is not indexed.
    pub fn find_term(&self, term: &str) -> PostingList {
        self.dictionary.get(term).cloned().unwrap_or_default()
    }

    /// Adds documents, replacing any earlier version with the same id.
    pub fn add_documents(&mut self, documents: Vec<ExtractedDocument>) {
        for document in documents {
            self.remove_document(&document.id);
            if document.tokens.is_empty() {
                continue;
            }

            let mut length = 0u32;
            let mut terms = BTreeSet::new();
            for token in document.tokens {
                length = length.saturating_add(token.positions.len() as u32);
                self.dictionary
                    .entry(token.content.clone())
                    .or_default()
                    .insert(document.id.clone(), token.positions);
                self.terms_to_update.insert(token.content.clone());
                terms.insert(token.content);
            }
            self.doc_length.insert(document.id.clone(), length);
            self.doc_terms.insert(document.id, terms);
        }
        self.is_index_built = false;
    }

    /// Removes every posting of the given ids. Returns how many of them were
    /// indexed.
    pub fn remove_documents<S: AsRef<str>>(&mut self, ids: &[S]) -> u32 {
        let mut removed = 0;
        for id in ids {
            if self.remove_document(id.as_ref()) {
                removed += 1;
            }
        }
        if removed > 0 {
            self.is_index_built = false;
        }
        removed
    }

    fn remove_document(&mut self, id: &str) -> bool {
        let Some(terms) = self.doc_terms.remove(id) else {
            return false;
        };
        self.doc_length.remove(id);
        for term in terms {
            if let Some(postings) = self.dictionary.get_mut(&term) {
                postings.remove(id);
            }
            self.terms_to_update.insert(term);
        }
        self.is_index_built = false;
        true
    }

    pub fn clear_inverted_index(&mut self) {
        *self = Self::new();
    }

    /// Refreshes the tf-idf cache and purges terms left without postings.
    pub fn build_inverted_index(&mut self) {
        let num_docs = self.number_documents();
        let terms: Vec<String> = if num_docs != self.built_num_docs {
            // idf depends on the document count, so every term is stale.
            self.terms_to_update.clear();
            self.dictionary.keys().cloned().collect()
        } else {
            std::mem::take(&mut self.terms_to_update).into_iter().collect()
        };

        for term in &terms {
            let empty = self.dictionary.get(term).map_or(true, BTreeMap::is_empty);
            if empty {
                self.dictionary.remove(term);
                self.tfidf_cache.remove(term);
                continue;
            }
            let entries = self.compute_tfidf(term, num_docs);
            self.tfidf_cache.insert(term.clone(), entries);
        }
        self.built_num_docs = num_docs;
        self.is_index_built = true;
        debug!(
            num_docs,
            num_terms = self.dictionary.len(),
            rebuilt_terms = terms.len(),
            "inverted index built"
        );
    }

    fn compute_tfidf(&self, term: &str, num_docs: u64) -> Vec<TfIdf> {
        let Some(postings) = self.dictionary.get(term) else {
            return Vec::new();
        };
        let idf = 1.0 + ((1.0 + num_docs as f64) / (1.0 + postings.len() as f64)).ln();
        postings
            .iter()
            .map(|(document_id, positions)| {
                let length = self.doc_length.get(document_id).copied().unwrap_or(1).max(1);
                let weighted: f64 = positions.iter().map(|p| p.weight).sum();
                TfIdf {
                    document_id: document_id.clone(),
                    score: weighted / f64::from(length) * idf,
                }
            })
            .collect()
    }

    /// Scores every document containing a term that approximately matches
    /// one of `terms`. Results are sorted by descending score, then id.
    pub fn find_matching_documents_approximately(
        &self,
        terms: &BTreeSet<String>,
        prefix_threshold: f64,
        fuzzy_threshold: f64,
    ) -> Vec<SearchResult> {
        debug_assert!(self.is_index_built, "query against an unbuilt index");

        let mut matches: BTreeMap<&str, (f64, Vec<Position>)> = BTreeMap::new();
        for (term, entries) in &self.tfidf_cache {
            for query in terms {
                let relevance =
                    relevance_coefficient(query, term, prefix_threshold, fuzzy_threshold);
                if relevance <= 0.0 {
                    continue;
                }
                for entry in entries {
                    let (score, positions) = matches
                        .entry(entry.document_id.as_str())
                        .or_insert_with(|| (0.0, Vec::new()));
                    *score += relevance * entry.score;
                    if let Some(occurrences) = self
                        .dictionary
                        .get(term)
                        .and_then(|postings| postings.get(&entry.document_id))
                    {
                        positions.extend(occurrences.iter().map(|p| p.position.clone()));
                    }
                }
            }
        }

        let mut results: Vec<SearchResult> = matches
            .into_iter()
            .map(|(id, (score, mut positions))| {
                positions.sort();
                positions.dedup();
                SearchResult {
                    id: id.to_string(),
                    score,
                    positions,
                }
            })
            .collect();
        sort_results(&mut results);
        results
    }
}

/// Descending score, ties by ascending id.
pub fn sort_results(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
}
