use crate::models::{IndexId, SearchParams};

/// Persisted preferences. Only the tunable search thresholds are stored here.
pub trait PrefStore: Send + Sync {
    fn get_f64(&self, key: &str) -> Option<f64>;
    fn set_f64(&self, key: &str, value: f64);
}

pub mod memory;

pub fn prefix_threshold_key(index_id: IndexId) -> String {
    format!("local_search_service.{index_id}.prefix_threshold")
}

pub fn fuzzy_threshold_key(index_id: IndexId) -> String {
    format!("local_search_service.{index_id}.fuzzy_threshold")
}

/// Stored thresholds for `index_id`, each falling back to `defaults` when
/// missing or out of range.
pub fn load_search_params(
    prefs: &dyn PrefStore,
    index_id: IndexId,
    defaults: SearchParams,
) -> SearchParams {
    let read = |key: String, default: f64| {
        prefs
            .get_f64(&key)
            .filter(|value| (0.0..=1.0).contains(value))
            .unwrap_or(default)
    };
    SearchParams {
        prefix_threshold: read(prefix_threshold_key(index_id), defaults.prefix_threshold),
        fuzzy_threshold: read(fuzzy_threshold_key(index_id), defaults.fuzzy_threshold),
    }
}

pub fn store_search_params(prefs: &dyn PrefStore, index_id: IndexId, params: SearchParams) {
    prefs.set_f64(&prefix_threshold_key(index_id), params.prefix_threshold);
    prefs.set_f64(&fuzzy_threshold_key(index_id), params.fuzzy_threshold);
}
