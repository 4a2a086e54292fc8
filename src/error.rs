use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search index must be created inside a tokio runtime")]
    NoRuntime,

    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: String, value: String },

    #[error("invalid search params: {0}")]
    InvalidSearchParams(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
