//! Error types for Storefront

use thiserror::Error;

/// Result type alias using Storefront's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown to shoppers when a product listing cannot be produced.
pub const GENERIC_LISTING_FAILURE: &str = "Unable to load products. Please try again.";

/// Storefront error types
#[derive(Error, Debug)]
pub enum Error {
    // Catalog errors (E100-E199)
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Catalog is temporarily unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Item group '{0}' not found.")]
    ItemGroupNotFound(String),

    // Query errors (E200-E299)
    #[error("Product query failed: {0}")]
    QueryFailed(String),

    // Search errors (E300-E399)
    #[error("Full-text engine error: {0}")]
    SearchEngine(String),

    // Cache errors (E400-E499)
    #[error("Response cache error: {0}")]
    Cache(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "E100",
            Self::CatalogUnavailable(_) => "E101",
            Self::ItemGroupNotFound(_) => "E102",
            Self::QueryFailed(_) => "E200",
            Self::SearchEngine(_) => "E300",
            Self::Cache(_) => "E400",
            Self::InvalidInput(_) => "E800",
            Self::Json(_) => "E801",
        }
    }

    /// Whether retrying the same call later could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::CatalogUnavailable(_) | Self::SearchEngine(_) | Self::Cache(_) => true,
            Self::QueryFailed(inner) => inner.contains("unavailable"),
            _ => false,
        }
    }

    /// Wrap any error raised while executing a product query.
    ///
    /// Errors that are already `QueryFailed` pass through unchanged.
    pub fn into_query_failure(self) -> Self {
        match self {
            Self::QueryFailed(_) => self,
            other => Self::QueryFailed(other.to_string()),
        }
    }
}
