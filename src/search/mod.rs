use crate::error::Result;
use crate::models::{Backend, Data, IndexId, ResponseStatus, SearchParams, SearchResult};
use crate::storage::{load_search_params, store_search_params, PrefStore};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Capability shared by every search backend.
///
/// All methods run on the sequence that owns the index; `&mut self` makes
/// that the only place the index can be touched from.
#[async_trait]
pub trait SearchIndex: Send {
    fn index_id(&self) -> IndexId;
    fn backend(&self) -> Backend;

    /// Number of documents currently searchable.
    fn get_size(&mut self) -> u64;

    /// Adds new documents or replaces existing ones with the same id. May
    /// return before the documents become searchable.
    fn add_or_update(&mut self, data: Vec<Data>);

    /// Removes documents by id and returns how many were present.
    fn delete(&mut self, ids: &[String]) -> u32;

    fn clear_index(&mut self);

    /// Ranks documents against `query`. `results` is cleared first; a
    /// `max_results` of 0 means no limit.
    fn find(
        &mut self,
        query: &str,
        max_results: u32,
        results: &mut Vec<SearchResult>,
    ) -> ResponseStatus;

    fn search_params(&self) -> SearchParams;
    fn set_search_params(&mut self, params: SearchParams) -> Result<()>;

    /// Resolves once every earlier `add_or_update` has been applied.
    async fn wait_for_pending_updates(&mut self) {}
}

/// State and bookkeeping common to all backends.
pub(crate) struct IndexCore {
    pub(crate) index_id: IndexId,
    pub(crate) backend: Backend,
    prefs: Option<Arc<dyn PrefStore>>,
    pub(crate) search_params: SearchParams,
}

impl IndexCore {
    pub(crate) fn new(
        index_id: IndexId,
        backend: Backend,
        prefs: Option<Arc<dyn PrefStore>>,
        defaults: SearchParams,
    ) -> Self {
        let search_params = match &prefs {
            Some(prefs) => load_search_params(prefs.as_ref(), index_id, defaults),
            None => defaults,
        };
        Self {
            index_id,
            backend,
            prefs,
            search_params,
        }
    }

    pub(crate) fn set_search_params(&mut self, params: SearchParams) -> Result<()> {
        params.validate()?;
        if let Some(prefs) = &self.prefs {
            store_search_params(prefs.as_ref(), self.index_id, params);
        }
        self.search_params = params;
        Ok(())
    }

    pub(crate) fn log_search_results_stats(
        &self,
        status: ResponseStatus,
        num_results: usize,
        latency: Option<Duration>,
    ) {
        debug!(
            index = %self.index_id,
            backend = ?self.backend,
            status = ?status,
            num_results,
            latency_us = latency.map(|l| l.as_micros() as u64),
            "search finished"
        );
    }
}

/// Status for queries that can be answered without touching the index.
pub(crate) fn check_query(query: &str, num_documents: u64) -> Option<ResponseStatus> {
    if query.trim().is_empty() {
        Some(ResponseStatus::EmptyQuery)
    } else if num_documents == 0 {
        Some(ResponseStatus::EmptyIndex)
    } else {
        None
    }
}

pub(crate) fn truncate_results(results: &mut Vec<SearchResult>, max_results: u32) {
    if max_results > 0 {
        results.truncate(max_results as usize);
    }
}

pub mod inverted_index_search;
pub mod linear_map;

pub use inverted_index_search::InvertedIndexSearch;
pub use linear_map::LinearMapSearch;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryPrefStore;

    fn result(id: &str) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            score: 1.0,
            positions: Vec::new(),
        }
    }

    #[test]
    fn test_check_query_order() {
        assert_eq!(check_query("", 0), Some(ResponseStatus::EmptyQuery));
        assert_eq!(check_query("   ", 5), Some(ResponseStatus::EmptyQuery));
        assert_eq!(check_query("wifi", 0), Some(ResponseStatus::EmptyIndex));
        assert_eq!(check_query("wifi", 1), None);
    }

    #[test]
    fn test_truncate_results() {
        let mut results = vec![result("a"), result("b"), result("c")];
        truncate_results(&mut results, 0);
        assert_eq!(results.len(), 3);
        truncate_results(&mut results, 5);
        assert_eq!(results.len(), 3);
        truncate_results(&mut results, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].id, "b");
    }

    #[test]
    fn test_core_persists_params() {
        let prefs: Arc<dyn PrefStore> = Arc::new(MemoryPrefStore::new());
        let mut core = IndexCore::new(
            IndexId::HelpApp,
            Backend::InvertedIndex,
            Some(Arc::clone(&prefs)),
            SearchParams::default(),
        );
        let params = SearchParams {
            prefix_threshold: 0.9,
            fuzzy_threshold: 0.05,
        };
        core.set_search_params(params).unwrap();

        let reloaded = IndexCore::new(
            IndexId::HelpApp,
            Backend::LinearMap,
            Some(prefs),
            SearchParams::default(),
        );
        assert_eq!(reloaded.search_params, params);
    }

    #[test]
    fn test_core_rejects_invalid_params() {
        let mut core = IndexCore::new(
            IndexId::HelpApp,
            Backend::InvertedIndex,
            None,
            SearchParams::default(),
        );
        let invalid = SearchParams {
            prefix_threshold: -1.0,
            fuzzy_threshold: 0.2,
        };
        assert!(core.set_search_params(invalid).is_err());
        assert_eq!(core.search_params, SearchParams::default());
    }
}
