//! Domain layer
//!
//! Catalog access, facet building, listing orchestration and search.

pub mod catalog;
pub mod coerce;
pub mod facets;
pub mod listing;
pub mod search;
pub mod specification;
