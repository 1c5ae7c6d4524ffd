//! Facet domain module
//!
//! Decides which filters a listing page offers.
//!
//! # Architecture
//!
//! - **Entities**: `Facet`, `FilterFieldSpec`, `AttributeFacet`, `DiscountBand`
//! - **Builder**: `FacetBuilder` for field, attribute and discount facets
//! - **Discount**: band computation over an observed discount range

pub mod builder;
pub mod discount;
pub mod entity;

// Re-export main types
pub use builder::FacetBuilder;
pub use discount::discount_bands;
pub use entity::{
    AttributeFacet, DiscountBand, Facet, FacetContext, FacetSettings, FilterFieldSpec,
};
