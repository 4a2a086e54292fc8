//! On-device search over small local corpora such as settings pages and
//! help articles.
//!
//! Documents are tokenized into weighted terms, stored in an inverted index
//! and matched approximately (prefix and edit-distance) against queries.

pub mod config;
pub mod error;
pub mod extraction;
pub mod inverted_index;
pub mod matching;
mod models;
pub mod search;
pub mod storage;
pub mod tokenizer;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use models::{
    Backend, Content, Data, IndexId, Position, ResponseStatus, SearchParams, SearchResult,
    WeightedPosition,
};

use search::{InvertedIndexSearch, LinearMapSearch, SearchIndex};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use storage::PrefStore;
use tracing::{info, warn};

/// Owns one index per `IndexId`, creating each on first request.
pub struct LocalSearchService {
    config: SearchConfig,
    prefs: Option<Arc<dyn PrefStore>>,
    indices: HashMap<IndexId, Box<dyn SearchIndex>>,
}

impl LocalSearchService {
    pub fn new(config: SearchConfig, prefs: Option<Arc<dyn PrefStore>>) -> Self {
        Self {
            config,
            prefs,
            indices: HashMap::new(),
        }
    }

    /// Returns the index for `index_id`, creating it with `backend` if it
    /// does not exist yet. An existing index keeps its original backend.
    pub fn get_index(
        &mut self,
        index_id: IndexId,
        backend: Backend,
    ) -> Result<&mut dyn SearchIndex> {
        let config = &self.config;
        let prefs = &self.prefs;
        let index = match self.indices.entry(index_id) {
            Entry::Occupied(entry) => {
                let index = entry.into_mut();
                if index.backend() != backend {
                    warn!(
                        index = %index_id,
                        existing = ?index.backend(),
                        requested = ?backend,
                        "index already exists with a different backend"
                    );
                }
                index
            }
            Entry::Vacant(entry) => {
                let index = create_index(index_id, backend, prefs.clone(), config)?;
                info!(index = %index_id, backend = ?backend, "created search index");
                entry.insert(index)
            }
        };
        Ok(index.as_mut())
    }
}

fn create_index(
    index_id: IndexId,
    backend: Backend,
    prefs: Option<Arc<dyn PrefStore>>,
    config: &SearchConfig,
) -> Result<Box<dyn SearchIndex>> {
    Ok(match backend {
        Backend::InvertedIndex => Box::new(InvertedIndexSearch::new(index_id, prefs, config)?),
        Backend::LinearMap => Box::new(LinearMapSearch::new(index_id, prefs, config)),
    })
}
