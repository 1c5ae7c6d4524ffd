//! Full-text engine port
//!
//! The index and its autocomplete dictionaries are owned elsewhere; this is
//! the read side the search service consumes.

use async_trait::async_trait;

use crate::domain::catalog::Record;
use crate::error::Result;

use super::entity::{SuggestRequest, Suggestion};

#[async_trait]
pub trait FullTextEngine: Send + Sync {
    /// Whether the engine can currently serve queries
    async fn is_enabled(&self) -> bool;

    /// Autocomplete suggestions from a dictionary
    async fn suggest(&self, request: &SuggestRequest) -> Result<Vec<Suggestion>>;

    /// Documents of `index` matching a query expression
    async fn search(&self, index: &str, expression: &str) -> Result<Vec<Record>>;
}
