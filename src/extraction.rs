use crate::models::{Data, Position, WeightedPosition};
use crate::tokenizer::{is_stopword, tokenize, TokenizeMode};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// A normalized term together with every place it occurs in one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub content: String,
    pub positions: Vec<WeightedPosition>,
}

impl Token {
    pub fn frequency(&self) -> usize {
        self.positions.len()
    }

    /// Largest weight among the occurrences.
    pub fn weight(&self) -> f64 {
        self.positions
            .iter()
            .map(|p| p.weight)
            .fold(0.0, f64::max)
    }
}

/// Consolidated tokens of one document, ready to be merged into an index.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDocument {
    pub id: String,
    pub tokens: Vec<Token>,
}

/// Turns `Data` records into token lists. Holds no mutable state, so one
/// extractor can be moved onto a worker thread and used there.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    default_locale: String,
}

impl ContentExtractor {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn resolve_locale<'a>(&'a self, locale: &'a str) -> &'a str {
        if locale.is_empty() {
            &self.default_locale
        } else {
            locale
        }
    }

    /// One token per non-stopword occurrence in `text`, in text order.
    pub fn extract_content<'a>(
        &self,
        content_id: &'a str,
        text: &'a str,
        weight: f64,
        locale: &'a str,
    ) -> impl Iterator<Item = Token> + 'a {
        tokenize(text, TokenizeMode::for_locale(locale))
            .filter(move |span| !is_stopword(&span.text, locale))
            .map(move |span| Token {
                content: span.text,
                positions: vec![WeightedPosition {
                    weight,
                    position: Position {
                        content_id: content_id.to_string(),
                        start: to_u32(span.start),
                        length: to_u32(span.length),
                    },
                }],
            })
    }

    pub fn extract_document_tokens(&self, data: &Data) -> Vec<Token> {
        let locale = self.resolve_locale(&data.locale);
        let mut document_tokens = Vec::new();
        for content in &data.contents {
            debug_assert!(
                (0.0..=1.0).contains(&content.weight),
                "content weight {} of {}/{} is outside [0, 1]",
                content.weight,
                data.id,
                content.id
            );
            document_tokens.extend(self.extract_content(
                &content.id,
                &content.text,
                content.weight,
                locale,
            ));
        }
        consolidate_tokens(document_tokens)
    }

    pub fn extract_documents_content(&self, data: &[Data]) -> Vec<ExtractedDocument> {
        data.iter()
            .map(|d| {
                let tokens = self.extract_document_tokens(d);
                if tokens.is_empty() && d.contents.iter().any(|c| !c.text.trim().is_empty()) {
                    warn!(document_id = %d.id, "document produced no searchable tokens");
                }
                ExtractedDocument {
                    id: d.id.clone(),
                    tokens,
                }
            })
            .collect()
    }

    /// Distinct normalized query terms. Stopwords are kept: they never reach
    /// the index, so they simply fail to match.
    pub fn query_terms(&self, query: &str) -> BTreeSet<String> {
        tokenize(query, TokenizeMode::for_locale(&self.default_locale))
            .map(|span| span.text)
            .collect()
    }
}

/// Merges tokens sharing the same text. Positions keep their original
/// order, so a token's weight is the max of its contributing weights.
pub fn consolidate_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut merged: BTreeMap<String, Vec<WeightedPosition>> = BTreeMap::new();
    for token in tokens {
        merged
            .entry(token.content)
            .or_default()
            .extend(token.positions);
    }
    merged
        .into_iter()
        .map(|(content, positions)| Token { content, positions })
        .collect()
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
