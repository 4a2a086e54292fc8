use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::extraction::{ContentExtractor, ExtractedDocument};
use crate::inverted_index::InvertedIndex;
use crate::models::{Backend, Data, IndexId, ResponseStatus, SearchParams, SearchResult};
use crate::search::{check_query, truncate_results, IndexCore, SearchIndex};
use crate::storage::PrefStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinSet};
use tracing::error;

type Extraction = std::result::Result<Vec<ExtractedDocument>, JoinError>;

/// Inverted-index backend.
///
/// Tokenizing documents runs on tokio's blocking pool. The finished token
/// lists are merged into the index on the owning sequence, in the order the
/// extractions complete, the next time any entry point runs (or when
/// `wait_for_pending_updates` is awaited). Two overlapping `add_or_update`
/// calls may therefore land out of submission order.
pub struct InvertedIndexSearch {
    core: IndexCore,
    inverted_index: InvertedIndex,
    extractor: Arc<ContentExtractor>,
    runtime: Handle,
    pending: JoinSet<Vec<ExtractedDocument>>,
}

impl InvertedIndexSearch {
    /// Must be called from within a tokio runtime; extraction tasks are
    /// spawned onto it.
    pub fn new(
        index_id: IndexId,
        prefs: Option<Arc<dyn PrefStore>>,
        config: &SearchConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| SearchError::NoRuntime)?;
        Ok(Self {
            core: IndexCore::new(index_id, Backend::InvertedIndex, prefs, config.search_params),
            inverted_index: InvertedIndex::new(),
            extractor: Arc::new(ContentExtractor::new(config.default_locale.clone())),
            runtime,
            pending: JoinSet::new(),
        })
    }

    /// Documents containing exactly `term`, with its frequency in each.
    /// Bypasses scoring; meant for diagnostics.
    pub fn find_term(&mut self, term: &str) -> Vec<(String, u32)> {
        self.apply_completed_updates();
        self.inverted_index
            .find_term(term)
            .into_iter()
            .map(|(document_id, positions)| (document_id, positions.len() as u32))
            .collect()
    }

    /// Extractions spawned but not yet merged into the index.
    pub fn pending_updates(&self) -> usize {
        self.pending.len()
    }

    fn apply_completed_updates(&mut self) {
        while let Some(extraction) = self.pending.try_join_next() {
            self.on_extraction_finished(extraction);
        }
    }

    fn on_extraction_finished(&mut self, extraction: Extraction) {
        match extraction {
            Ok(documents) => {
                self.inverted_index.add_documents(documents);
                self.inverted_index.build_inverted_index();
            }
            Err(err) => {
                error!(index = %self.core.index_id, error = %err, "document extraction failed");
            }
        }
    }
}

#[async_trait]
impl SearchIndex for InvertedIndexSearch {
    fn index_id(&self) -> IndexId {
        self.core.index_id
    }

    fn backend(&self) -> Backend {
        self.core.backend
    }

    fn get_size(&mut self) -> u64 {
        self.apply_completed_updates();
        self.inverted_index.number_documents()
    }

    fn add_or_update(&mut self, data: Vec<Data>) {
        if data.is_empty() {
            return;
        }
        let extractor = Arc::clone(&self.extractor);
        self.pending.spawn_blocking_on(
            move || extractor.extract_documents_content(&data),
            &self.runtime,
        );
    }

    fn delete(&mut self, ids: &[String]) -> u32 {
        self.apply_completed_updates();
        let num_deleted = self.inverted_index.remove_documents(ids);
        self.inverted_index.build_inverted_index();
        num_deleted
    }

    fn clear_index(&mut self) {
        self.apply_completed_updates();
        self.inverted_index.clear_inverted_index();
    }

    fn find(
        &mut self,
        query: &str,
        max_results: u32,
        results: &mut Vec<SearchResult>,
    ) -> ResponseStatus {
        let start = Instant::now();
        results.clear();
        self.apply_completed_updates();

        if let Some(status) = check_query(query, self.inverted_index.number_documents()) {
            self.core.log_search_results_stats(status, 0, None);
            return status;
        }

        // Query terms are segmented with the default locale's rules; the
        // query's own language is unknown.
        let terms = self.extractor.query_terms(query);
        let params = self.core.search_params;
        *results = self.inverted_index.find_matching_documents_approximately(
            &terms,
            params.prefix_threshold,
            params.fuzzy_threshold,
        );
        truncate_results(results, max_results);

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

    async fn wait_for_pending_updates(&mut self) {
        while let Some(extraction) = self.pending.join_next().await {
            self.on_extraction_finished(extraction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Content;
    use crate::storage::memory::MemoryPrefStore;

    fn doc(id: &str, text: &str) -> Data {
        Data::new(id, vec![Content::new("c1", text, 1.0)])
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    fn new_index() -> InvertedIndexSearch {
        InvertedIndexSearch::new(IndexId::CrosSettings, None, &SearchConfig::default()).unwrap()
    }

    async fn index_with(docs: Vec<Data>) -> InvertedIndexSearch {
        let mut index = new_index();
        index.add_or_update(docs);
        index.wait_for_pending_updates().await;
        index
    }

    #[test]
    fn test_requires_runtime() {
        let result = InvertedIndexSearch::new(IndexId::HelpApp, None, &SearchConfig::default());
        assert!(matches!(result, Err(SearchError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_prefix_match_scenario() {
        let mut index = index_with(vec![doc("doc1", "apple banana")]).await;
        assert_eq!(index.get_size(), 1);

        let mut results = Vec::new();
        let status = index.find("appl", 10, &mut results);
        assert_eq!(status, ResponseStatus::Success);
        assert_eq!(ids(&results), vec!["doc1"]);
    }

    #[tokio::test]
    async fn test_exact_match_ranks_above_looser_match() {
        let mut index = index_with(vec![doc("doc1", "settings"), doc("doc2", "setting")]).await;

        let mut results = Vec::new();
        let status = index.find("setting", 10, &mut results);
        assert_eq!(status, ResponseStatus::Success);
        assert_eq!(ids(&results), vec!["doc2", "doc1"]);
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_empty_query() {
        let mut index = new_index();
        let mut results = vec![SearchResult {
            id: "stale".to_string(),
            score: 1.0,
            positions: Vec::new(),
        }];
        assert_eq!(index.find("", 10, &mut results), ResponseStatus::EmptyQuery);
        assert!(results.is_empty());

        let mut index = index_with(vec![doc("doc1", "apple")]).await;
        assert_eq!(index.find("", 10, &mut results), ResponseStatus::EmptyQuery);
        assert_eq!(index.find(" \t", 10, &mut results), ResponseStatus::EmptyQuery);
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_index() {
        let mut index = new_index();
        let mut results = Vec::new();
        assert_eq!(
            index.find("anything", 10, &mut results),
            ResponseStatus::EmptyIndex
        );

        let mut index = index_with(vec![doc("doc1", "apple")]).await;
        index.clear_index();
        assert_eq!(index.get_size(), 0);
        assert_eq!(
            index.find("apple", 10, &mut results),
            ResponseStatus::EmptyIndex
        );
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let mut index = new_index();
        index.clear_index();
        assert_eq!(index.get_size(), 0);

        let mut index = index_with(vec![doc("doc1", "apple"), doc("doc2", "pear")]).await;
        index.clear_index();
        index.clear_index();
        assert_eq!(index.get_size(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let mut index = index_with(vec![doc("doc1", "apple")]).await;

        assert_eq!(index.delete(&["nonexistent".to_string()]), 0);
        assert_eq!(index.get_size(), 1);

        assert_eq!(index.delete(&["doc1".to_string()]), 1);
        assert_eq!(index.get_size(), 0);

        let mut results = Vec::new();
        assert_eq!(
            index.find("apple", 10, &mut results),
            ResponseStatus::EmptyIndex
        );
    }

    #[tokio::test]
    async fn test_add_remove_symmetry() {
        let docs: Vec<Data> = (0..5)
            .map(|i| doc(&format!("doc{i}"), &format!("topic{i} shared words")))
            .collect();
        let all_ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();
        let mut index = index_with(docs).await;
        assert_eq!(index.get_size(), 5);

        assert_eq!(index.delete(&all_ids), 5);
        assert_eq!(index.get_size(), 0);
        assert!(index.find_term("shared").is_empty());
        let mut results = Vec::new();
        assert_eq!(
            index.find("shared", 10, &mut results),
            ResponseStatus::EmptyIndex
        );
    }

    #[tokio::test]
    async fn test_result_cap_keeps_top_scores() {
        let docs = vec![
            Data::new("a", vec![Content::new("c", "network", 0.2)]),
            Data::new("b", vec![Content::new("c", "network", 1.0)]),
            Data::new("c", vec![Content::new("c", "network", 0.6)]),
            Data::new("d", vec![Content::new("c", "network", 0.4)]),
        ];
        let mut index = index_with(docs).await;

        let mut all = Vec::new();
        index.find("network", 0, &mut all);
        assert_eq!(ids(&all), vec!["b", "c", "d", "a"]);

        let mut capped = Vec::new();
        assert_eq!(index.find("network", 2, &mut capped), ResponseStatus::Success);
        assert_eq!(capped, all[..2].to_vec());
    }

    #[tokio::test]
    async fn test_find_is_deterministic() {
        let mut index = index_with(vec![
            doc("doc1", "bluetooth devices pairing"),
            doc("doc2", "blue light filter"),
            doc("doc3", "device storage"),
        ])
        .await;

        let mut first = Vec::new();
        let mut second = Vec::new();
        index.find("blue device", 10, &mut first);
        index.find("blue device", 10, &mut second);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_success_with_no_matches() {
        let mut index = index_with(vec![doc("doc1", "apple")]).await;
        let mut results = Vec::new();
        assert_eq!(index.find("zebra", 10, &mut results), ResponseStatus::Success);
        assert!(results.is_empty());
        assert_eq!(index.find("!!!", 10, &mut results), ResponseStatus::Success);
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_document() {
        let mut index = index_with(vec![doc("doc1", "apple")]).await;
        index.add_or_update(vec![doc("doc1", "cherry")]);
        index.wait_for_pending_updates().await;

        assert_eq!(index.get_size(), 1);
        assert!(index.find_term("apple").is_empty());
        assert_eq!(index.find_term("cherry"), vec![("doc1".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_find_term_reports_frequency() {
        let mut index = index_with(vec![
            Data::new(
                "doc1",
                vec![
                    Content::new("title", "Wallpaper", 1.0),
                    Content::new("body", "Pick a wallpaper", 0.5),
                ],
            ),
            doc("doc2", "wallpaper"),
        ])
        .await;

        assert_eq!(
            index.find_term("wallpaper"),
            vec![("doc1".to_string(), 2), ("doc2".to_string(), 1)]
        );
        // Stopwords never reach the index.
        assert!(index.find_term("a").is_empty());
    }

    #[tokio::test]
    async fn test_updates_apply_on_next_call() {
        let mut index = new_index();
        index.add_or_update(vec![doc("doc1", "apple")]);
        index.add_or_update(vec![doc("doc2", "pear")]);

        // Without an explicit wait, completions land on a later call.
        while index.get_size() < 2 {
            tokio::task::yield_now().await;
        }
        assert_eq!(index.pending_updates(), 0);
    }

    #[tokio::test]
    async fn test_search_params_loaded_from_prefs() {
        let prefs: Arc<dyn PrefStore> = Arc::new(MemoryPrefStore::new());
        let mut index = InvertedIndexSearch::new(
            IndexId::CrosSettings,
            Some(Arc::clone(&prefs)),
            &SearchConfig::default(),
        )
        .unwrap();
        let strict = SearchParams {
            prefix_threshold: 1.0,
            fuzzy_threshold: 0.0,
        };
        index.set_search_params(strict).unwrap();

        let mut index =
            InvertedIndexSearch::new(IndexId::CrosSettings, Some(prefs), &SearchConfig::default())
                .unwrap();
        assert_eq!(index.search_params(), strict);

        index.add_or_update(vec![doc("doc1", "apple")]);
        index.wait_for_pending_updates().await;
        let mut results = Vec::new();
        index.find("appl", 10, &mut results);
        assert!(results.is_empty());
        index.find("apple", 10, &mut results);
        assert_eq!(ids(&results), vec!["doc1"]);
    }

    #[tokio::test]
    async fn test_non_latin_default_locale_uses_camel_case() {
        let config = SearchConfig::new("zh-CN");
        let mut index = InvertedIndexSearch::new(IndexId::HelpApp, None, &config).unwrap();
        index.add_or_update(vec![doc("doc1", "蓝牙 bluetoothSettings")]);
        index.wait_for_pending_updates().await;

        assert_eq!(index.find_term("settings").len(), 1);
        let mut results = Vec::new();
        assert_eq!(index.find("蓝牙", 10, &mut results), ResponseStatus::Success);
        assert_eq!(ids(&results), vec!["doc1"]);
    }

    #[tokio::test]
    async fn test_document_locale_matches_exact_query() {
        let mut index = index_with(vec![doc("doc1", "йод").with_locale("ru")]).await;
        assert_eq!(index.find_term("йод"), vec![("doc1".to_string(), 1)]);

        let mut results = Vec::new();
        assert_eq!(index.find("йод", 10, &mut results), ResponseStatus::Success);
        assert_eq!(ids(&results), vec!["doc1"]);
    }

    #[tokio::test]
    async fn test_failed_extraction_is_skipped() {
        let mut index = index_with(vec![doc("doc1", "apple")]).await;
        index
            .pending
            .spawn_blocking_on(|| panic!("extraction failed"), &index.runtime);
        index.wait_for_pending_updates().await;
        assert_eq!(index.get_size(), 1);
    }
}
