use crate::error::{Result, SearchError};
use crate::models::SearchParams;
use std::str::FromStr;

pub const LOCALE_ENV: &str = "LOCAL_SEARCH_LOCALE";
pub const PREFIX_THRESHOLD_ENV: &str = "LOCAL_SEARCH_PREFIX_THRESHOLD";
pub const FUZZY_THRESHOLD_ENV: &str = "LOCAL_SEARCH_FUZZY_THRESHOLD";

/// Construction-time settings shared by every index of a service.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Used for documents with an empty locale and for segmenting queries.
    pub default_locale: String,
    /// Thresholds applied when no preference has been stored yet.
    pub search_params: SearchParams,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            search_params: SearchParams::default(),
        }
    }
}

impl SearchConfig {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            ..Default::default()
        }
    }

    pub fn with_search_params(mut self, search_params: SearchParams) -> Self {
        self.search_params = search_params;
        self
    }

    /// Reads overrides from the process environment. Unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(locale) = lookup(LOCALE_ENV) {
            let locale = locale.trim();
            if !locale.is_empty() {
                config.default_locale = locale.to_string();
            }
        }
        if let Some(value) = lookup(PREFIX_THRESHOLD_ENV) {
            config.search_params.prefix_threshold = parse_value(PREFIX_THRESHOLD_ENV, &value)?;
        }
        if let Some(value) = lookup(FUZZY_THRESHOLD_ENV) {
            config.search_params.fuzzy_threshold = parse_value(FUZZY_THRESHOLD_ENV, &value)?;
        }

        config.search_params.validate()?;
        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SearchError::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        })
}
