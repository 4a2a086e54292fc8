use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One weighted text field of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub text: String,
    /// Must lie in `[0, 1]`.
    pub weight: f64,
}

impl Content {
    pub fn new(id: impl Into<String>, text: impl Into<String>, weight: f64) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            weight,
        }
    }
}

/// A document handed to an index. An empty `locale` means the default locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub id: String,
    #[serde(default)]
    pub locale: String,
    pub contents: Vec<Content>,
}

impl Data {
    pub fn new(id: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            id: id.into(),
            locale: String::new(),
            contents,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

/// Byte range of a token occurrence inside one content field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub content_id: String,
    pub start: u32,
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPosition {
    pub weight: f64,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f64,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
    EmptyQuery,
    EmptyIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexId {
    CrosSettings,
    HelpApp,
    HelpAppLauncher,
    Personalization,
}

impl fmt::Display for IndexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexId::CrosSettings => "CrosSettings",
            IndexId::HelpApp => "HelpApp",
            IndexId::HelpAppLauncher => "HelpAppLauncher",
            IndexId::Personalization => "Personalization",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    LinearMap,
    InvertedIndex,
}

/// Tunable matching thresholds.
///
/// `prefix_threshold` is the minimum `shorter / longer` length ratio for a
/// prefix match to count. `fuzzy_threshold` is the maximum edit distance,
/// normalized by the longer term, for a fuzzy match to count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub prefix_threshold: f64,
    pub fuzzy_threshold: f64,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            prefix_threshold: 0.35,
            fuzzy_threshold: 0.25,
        }
    }
}

impl SearchParams {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("prefix_threshold", self.prefix_threshold),
            ("fuzzy_threshold", self.fuzzy_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SearchError::InvalidSearchParams(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}
