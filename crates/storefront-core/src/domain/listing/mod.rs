//! Listing domain module
//!
//! Product listings with price filtering and response caching.
//!
//! # Architecture
//!
//! - **Entities**: `QueryArgs`, `SortBy`, `ProductListing`
//! - **Engine**: `QueryEngine` contract and `CatalogQueryEngine`
//! - **Cache**: `ResponseCache` port and deterministic cache keys
//! - **Service**: `ListingService`, the read-through/write-through orchestrator
//!
//! # Example
//!
//! ```ignore
//! use storefront_core::domain::listing::ListingService;
//!
//! let args = serde_json::json!({"item_group": "Spices", "sort_by": "price_asc"});
//! let listing = service.get_product_filter_data(args.as_object().unwrap()).await?;
//! println!("{} products", listing.items_count);
//! ```

pub mod cache;
pub mod cache_key;
pub mod engine;
pub mod entity;
pub mod price;
pub mod service;

// Re-export main types
pub use cache::ResponseCache;
pub use cache_key::{CACHE_KEY_PREFIX, cache_key};
pub use engine::{CatalogQueryEngine, EngineRequest, EngineResult, PageLength, QueryEngine};
pub use entity::{
    ListingFilters, ListingSettings, PriceBounds, ProductListing, QueryArgs, SortBy,
};
pub use price::apply_price_filter_and_sort;
pub use service::ListingService;
