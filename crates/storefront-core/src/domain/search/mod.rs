//! Search domain module
//!
//! Product and category search for the storefront search box.
//!
//! # Architecture
//!
//! - **Entities**: `ProductHit`, `ProductSearchResponse`, `CategorySuggestion`
//! - **Engine**: `FullTextEngine`, the optional external full-text index
//! - **Service**: `SearchService` with full-text first and catalog scan as
//!   the fallback
//! - **Normalize**: absolute thumbnail URLs for every result

pub mod engine;
pub mod entity;
pub mod normalize;
pub mod service;

// Re-export main types
pub use engine::FullTextEngine;
pub use entity::{
    CategorySuggestion, CategorySuggestions, ProductHit, ProductSearchResponse, SearchResponse,
    SuggestRequest, Suggestion,
};
pub use normalize::{HasImages, absolute_url, normalize, normalize_images};
pub use service::{Attempt, SearchService, sanitize, search_expression};
