//! Products API
//!
//! Listing data, listing page context and cache invalidation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::coerce;
use crate::domain::facets::{AttributeFacet, Facet, FacetContext};
use crate::domain::listing::ProductListing;
use crate::error::{Error, GENERIC_LISTING_FAILURE, Result};

use super::Storefront;

/// Listing data, or the shopper-facing failure message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterDataResponse {
    Listing(Box<ProductListing>),
    Failure { exc: String },
}

impl FilterDataResponse {
    pub fn failure() -> Self {
        Self::Failure {
            exc: GENERIC_LISTING_FAILURE.to_string(),
        }
    }

    pub fn listing(&self) -> Option<&ProductListing> {
        match self {
            Self::Listing(listing) => Some(listing.as_ref()),
            Self::Failure { .. } => None,
        }
    }
}

/// Everything the listing page renders around the product grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPageContext {
    pub field_filters: Vec<Facet>,
    pub attribute_filters: Vec<AttributeFacet>,
    pub page_length: usize,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
}

/// Accepts an argument object, its JSON string form, or nothing
fn query_args_map(query_args: Option<&Value>) -> Result<Map<String, Value>> {
    match query_args {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Map::new()),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            other => Err(Error::InvalidInput(format!(
                "query_args must be an object, got {}",
                other
            ))),
        },
        Some(other) => Err(Error::InvalidInput(format!(
            "query_args must be an object, got {}",
            other
        ))),
    }
}

impl Storefront {
    /// Filtered, sorted, paginated products with discount bands and
    /// sub-categories. Never fails: errors become the generic message.
    pub async fn get_product_filter_data(&self, query_args: Option<&Value>) -> FilterDataResponse {
        let result = match query_args_map(query_args) {
            Ok(raw) => self.listing.get_product_filter_data(&raw).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(listing) => FilterDataResponse::Listing(Box::new(listing)),
            Err(err) => {
                tracing::error!(category = "product_query", code = err.code(), error = %err, "Unable to load products");
                FilterDataResponse::failure()
            }
        }
    }

    /// Drop the cached listing for these arguments
    pub async fn invalidate_product_filter_data(&self, query_args: Option<&Value>) -> Result<()> {
        let raw = query_args_map(query_args)?;
        self.listing.invalidate(&raw).await
    }

    /// Facets and paging for the listing page. `form` may carry
    /// `item_group`, `items_per_page`, `price_min` and `price_max`.
    pub async fn listing_page_context(&self, form: &Map<String, Value>) -> Result<ListingPageContext> {
        let context = FacetContext {
            item_group: form.get("item_group").and_then(coerce::to_text),
        };

        let field_filters = self.facets.field_filters(&context).await?;
        let attribute_filters = self.facets.attribute_filters(&context).await?;

        let page_length = coerce::to_count(form.get("items_per_page"))
            .or(Some(self.config.listing.products_per_page).filter(|n| *n > 0))
            .unwrap_or(20);

        Ok(ListingPageContext {
            field_filters,
            attribute_filters,
            page_length,
            price_min: form.get("price_min").and_then(coerce::to_text),
            price_max: form.get("price_max").and_then(coerce::to_text),
        })
    }

    /// Whether guests are sent to login on cart actions
    pub fn guest_redirect_on_action(&self) -> bool {
        self.config.site.redirect_on_action
    }
}
