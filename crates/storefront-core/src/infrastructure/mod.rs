//! Infrastructure layer
//!
//! In-process adapters for the domain ports.

pub mod cache;
pub mod catalog;
