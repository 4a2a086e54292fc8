use crate::config::SearchConfig;
use crate::error::Result;
use crate::extraction::{consolidate_tokens, ContentExtractor, Token};
use crate::inverted_index::sort_results;
use crate::matching::relevance_coefficient;
use crate::models::{Backend, Data, IndexId, Position, ResponseStatus, SearchParams, SearchResult};
use crate::search::{check_query, truncate_results, IndexCore, SearchIndex};
use crate::storage::PrefStore;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

struct ContentTokens {
    weight: f64,
    tokens: Vec<Token>,
}

/// Backend that keeps every document's tokens and scans all of them on each
/// query. Updates are applied synchronously.
pub struct LinearMapSearch {
    core: IndexCore,
    extractor: ContentExtractor,
    documents: BTreeMap<String, Vec<ContentTokens>>,
}

impl LinearMapSearch {
    pub fn new(
        index_id: IndexId,
        prefs: Option<Arc<dyn PrefStore>>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            core: IndexCore::new(index_id, Backend::LinearMap, prefs, config.search_params),
            extractor: ContentExtractor::new(config.default_locale.clone()),
            documents: BTreeMap::new(),
        }
    }

    fn extract(&self, data: &Data) -> Vec<ContentTokens> {
        let locale = self.extractor.resolve_locale(&data.locale);
        data.contents
            .iter()
            .map(|content| {
                debug_assert!(
                    (0.0..=1.0).contains(&content.weight),
                    "content weight {} of {}/{} is outside [0, 1]",
                    content.weight,
                    data.id,
                    content.id
                );
                let tokens = self
                    .extractor
                    .extract_content(&content.id, &content.text, content.weight, locale)
                    .collect();
                ContentTokens {
                    weight: content.weight,
                    tokens: consolidate_tokens(tokens),
                }
            })
            .filter(|content| !content.tokens.is_empty())
            .collect()
    }

    /// Weighted mean, over query terms, of each term's best match in one
    /// content field.
    fn score_content(
        &self,
        terms: &BTreeSet<String>,
        content: &ContentTokens,
    ) -> (f64, Vec<Position>) {
        let params = self.core.search_params;
        let mut total = 0.0;
        let mut positions = Vec::new();
        for query in terms {
            let best = content
                .tokens
                .iter()
                .map(|token| {
                    let relevance = relevance_coefficient(
                        query,
                        &token.content,
                        params.prefix_threshold,
                        params.fuzzy_threshold,
                    );
                    (relevance, token)
                })
                .filter(|(relevance, _)| *relevance > 0.0)
                .max_by(|a, b| a.0.total_cmp(&b.0));
            if let Some((relevance, token)) = best {
                total += relevance;
                positions.extend(token.positions.iter().map(|p| p.position.clone()));
            }
        }
        (content.weight * total / terms.len() as f64, positions)
    }
}

#[async_trait]
impl SearchIndex for LinearMapSearch {
    fn index_id(&self) -> IndexId {
        self.core.index_id
    }

    fn backend(&self) -> Backend {
        self.core.backend
    }

    fn get_size(&mut self) -> u64 {
        self.documents.len() as u64
    }

    fn add_or_update(&mut self, data: Vec<Data>) {
        for d in data {
            let contents = self.extract(&d);
            if contents.is_empty() {
                warn!(document_id = %d.id, "document produced no searchable tokens");
                self.documents.remove(&d.id);
                continue;
            }
            self.documents.insert(d.id, contents);
        }
    }

    fn delete(&mut self, ids: &[String]) -> u32 {
        ids.iter()
            .filter(|id| self.documents.remove(id.as_str()).is_some())
            .count() as u32
    }

    fn clear_index(&mut self) {
        self.documents.clear();
    }

    fn find(
        &mut self,
        query: &str,
        max_results: u32,
        results: &mut Vec<SearchResult>,
    ) -> ResponseStatus {
        let start = Instant::now();
        results.clear();

        if let Some(status) = check_query(query, self.get_size()) {
            self.core.log_search_results_stats(status, 0, None);
            return status;
        }

        let terms = self.extractor.query_terms(query);
        if !terms.is_empty() {
            for (id, contents) in &self.documents {
                let best = contents
                    .iter()
                    .map(|content| self.score_content(&terms, content))
                    .filter(|(score, _)| *score > 0.0)
                    .max_by(|a, b| a.0.total_cmp(&b.0));
                if let Some((score, mut positions)) = best {
                    positions.sort();
                    // Two query terms can share a best-matching token.
                    positions.dedup();
                    results.push(SearchResult {
                        id: id.clone(),
                        score,
                        positions,
                    });
                }
            }
            sort_results(results);
            truncate_results(results, max_results);
        }

        let status = ResponseStatus::Success;
        self.core
            .log_search_results_stats(status, results.len(), Some(start.elapsed()));
        status
    }

    fn search_params(&self) -> SearchParams {
        self.core.search_params
    }

    fn set_search_params(&mut self, params: SearchParams) -> Result<()> {
        self.core.set_search_params(params)
    }
}
