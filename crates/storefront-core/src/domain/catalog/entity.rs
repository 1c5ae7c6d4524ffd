//! Catalog entities
//!
//! Typed views over catalog records. Records are parsed at the port boundary
//! so loosely typed values (numeric strings, `0`/`1` flags) never travel
//! further into the domain.

use serde::{Deserialize, Serialize};

use crate::domain::coerce::{de_flag, de_i64, de_opt_f64, de_opt_text};

/// Storefront projection of a master item
///
/// Supplier associations are not part of the record; they live in
/// `item_supplier` rows and are matched through representative links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Record key
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub item_code: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub item_name: Option<String>,
    /// Display name
    #[serde(default, deserialize_with = "de_opt_text")]
    pub web_item_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub item_group: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub route: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub price_list_rate: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub discount_percent: Option<f64>,
    #[serde(default, deserialize_with = "de_i64")]
    pub ranking: i64,
    #[serde(default, deserialize_with = "de_flag")]
    pub published: bool,
    /// Template item this variant derives from
    #[serde(default, deserialize_with = "de_opt_text")]
    pub variant_of: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub website_image: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub creation: Option<String>,
}

impl CatalogItem {
    /// Listing price; missing prices read as 0 ("unknown")
    pub fn price(&self) -> f64 {
        self.price_list_rate.unwrap_or(0.0)
    }

    /// Best available display name
    pub fn display_name(&self) -> &str {
        self.web_item_name
            .as_deref()
            .or(self.item_name.as_deref())
            .unwrap_or(&self.name)
    }
}

/// Hierarchical category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemGroup {
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub parent_item_group: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub route: Option<String>,
    #[serde(default, deserialize_with = "de_flag")]
    pub show_in_website: bool,
    /// Whether listings scoped to this group include descendant groups
    #[serde(default, deserialize_with = "de_flag")]
    pub include_descendants: bool,
    /// Facet fields overriding the global configuration
    #[serde(default)]
    pub filter_fields: Vec<String>,
    /// Facet attributes overriding the global configuration
    #[serde(default)]
    pub filter_attributes: Vec<String>,
}

/// Child category surfaced next to a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub route: Option<String>,
}
