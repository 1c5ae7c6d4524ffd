//! Catalog domain module
//!
//! Read-only view over the external catalog record store.
//!
//! # Architecture
//!
//! - **Port**: `CatalogPort` plus the loosely typed `Record` and query types
//! - **Entities**: `CatalogItem`, `ItemGroup`, `SubCategory`
//! - **Scope**: `ItemScope`, the qualifying-item filters shared by facets and
//!   product queries, and item-group tree helpers
//! - **Validity**: `LinkValidity` for enabled / visible linked records

pub mod entity;
pub mod port;
pub mod scope;
pub mod validity;

// Re-export main types
pub use entity::{CatalogItem, ItemGroup, SubCategory};
pub use port::{
    CatalogPort, Condition, EntityMeta, FieldMeta, FieldType, ListQuery, Operator, OrderBy,
    Record, entities, like_match, pluck,
};
pub use scope::{ItemScope, child_groups_for_website, immediate_child_groups};
pub use validity::{LinkCapabilities, LinkValidity};
