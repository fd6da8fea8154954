use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid order specification: {0}")]
    InvalidOrder(String),

    #[error("No order fields supplied")]
    EmptyOrder,

    #[error("Invalid query: {0}")]
    InvalidFilter(String),

    #[error("Invalid updates: {0}")]
    InvalidUpdates(String),

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),
}
