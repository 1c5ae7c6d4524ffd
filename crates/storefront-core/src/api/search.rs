//! Search API
//!
//! Thin wrappers that coerce loosely typed limits and flags before handing
//! over to the search service.

use serde_json::Value;

use crate::domain::coerce;
use crate::domain::search::{CategorySuggestions, ProductHit, ProductSearchResponse, SearchResponse};
use crate::error::Result;

use super::Storefront;

fn limit_or(value: Option<&Value>, default: usize) -> usize {
    coerce::to_count(value).unwrap_or(default)
}

impl Storefront {
    /// Products and categories for the search box
    pub async fn search(&self, query: &str) -> SearchResponse {
        self.search.search(query).await
    }

    pub async fn product_search(
        &self,
        query: &str,
        limit: Option<&Value>,
        fuzzy: Option<&Value>,
    ) -> ProductSearchResponse {
        let limit = limit_or(limit, self.search.config().product_limit);
        let fuzzy = coerce::to_flag(fuzzy, true);
        self.search.product_search(query, limit, fuzzy).await
    }

    pub async fn get_category_suggestions(&self, query: &str, limit: Option<&Value>) -> CategorySuggestions {
        let limit = limit_or(limit, self.search.config().category_limit);
        self.search.category_suggestions(query, limit).await
    }

    /// Paginated product list for the search page
    pub async fn get_product_list(
        &self,
        search: Option<&str>,
        start: Option<&Value>,
        limit: Option<&Value>,
    ) -> Result<Vec<ProductHit>> {
        let start = start
            .map(coerce::to_i64)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        let limit = limit_or(limit, self.search.config().list_limit);
        self.search.product_list(search, start, limit).await
    }
}
