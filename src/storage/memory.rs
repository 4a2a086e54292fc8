use crate::storage::PrefStore;
use dashmap::DashMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryPrefStore {
    values: DashMap<String, f64>,
}

impl MemoryPrefStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrefStore for MemoryPrefStore {
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).map(|value| *value)
    }

    fn set_f64(&self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }
}
