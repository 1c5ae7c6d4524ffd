//! Storefront Core Library
//!
//! This crate provides product discovery for a storefront catalog:
//! - Facet building (field, attribute and discount filters)
//! - Product listings with price filtering and response caching
//! - Product and category search with a catalog-scan fallback
//! - In-memory catalog and cache adapters
//! - The guest-facing API facade

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use api::Storefront;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{FilterDataResponse, Storefront};
    pub use crate::config::Config;
    pub use crate::domain::catalog::{CatalogPort, Record};
    pub use crate::error::{Error, Result};
    pub use crate::infrastructure::catalog::InMemoryCatalog;
}
