//! Fetch error types.

use thiserror::Error;

pub type SourceResult<T> = Result<T, SourceError>;

pub type FetchResult<T> = Result<T, FetchError>;

/// A provider call that could not complete (auth, network, throttling).
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("{operation} request failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
    },

    #[error("provider configuration error: {0}")]
    Config(String),
}

impl SourceError {
    pub fn request(operation: &'static str, err: impl std::fmt::Display) -> Self {
        SourceError::Request {
            operation,
            message: err.to_string(),
        }
    }
}

/// Errors that discard a region's contribution to a scrape cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(#[from] SourceError),

    #[error("scrape cancelled")]
    Cancelled,
}

/// The inventory query behind the instance catalog failed.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("instance catalog unavailable: {0}")]
    CatalogUnavailable(#[from] FetchError),
}

/// A single malformed price record. Counted and skipped, never fatal.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("malformed price document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid price value '{0}'")]
    Price(String),

    #[error("unsupported savings plan duration of {0} seconds (expected 1 or 3 years)")]
    Duration(i64),
}
