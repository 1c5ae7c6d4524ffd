//! Listing entities
//!
//! [`QueryArgs`] is parsed from the loosely typed argument map a client sends;
//! [`ProductListing`] is the response, which is also what gets cached.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{FilterConfig, ListingConfig};
use crate::domain::catalog::{CatalogItem, OrderBy, SubCategory};
use crate::domain::coerce;
use crate::domain::facets::DiscountBand;

/// Requested sort order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    New,
    /// Engine default (ranking)
    #[default]
    None,
}

impl SortBy {
    /// Unknown names fall back to the engine default
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "price_asc" => Self::PriceAsc,
            "price_desc" => Self::PriceDesc,
            "name_asc" => Self::NameAsc,
            "name_desc" => Self::NameDesc,
            "new" => Self::New,
            _ => Self::None,
        }
    }

    pub fn is_price(&self) -> bool {
        matches!(self, Self::PriceAsc | Self::PriceDesc)
    }

    /// Engine order for non-price sorts; `None` leaves the engine default
    pub fn engine_order(&self) -> Option<OrderBy> {
        match self {
            Self::NameAsc => Some(OrderBy::asc("web_item_name")),
            Self::NameDesc => Some(OrderBy::desc("web_item_name")),
            Self::New => Some(OrderBy::desc("creation")),
            Self::PriceAsc | Self::PriceDesc | Self::None => None,
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::NameAsc => "name_asc",
            Self::NameDesc => "name_desc",
            Self::New => "new",
            Self::None => "none",
        };
        f.write_str(s)
    }
}

/// Inclusive price bounds; unset bounds are `None`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceBounds {
    pub fn is_set(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

/// Parsed listing request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryArgs {
    pub search: Option<String>,
    /// Field name to accepted values ("any of")
    pub field_filters: BTreeMap<String, Vec<String>>,
    /// Attribute name to accepted values ("any of")
    pub attribute_filters: BTreeMap<String, Vec<String>>,
    pub item_group: Option<String>,
    pub sort_by: SortBy,
    pub price: PriceBounds,
    pub start: usize,
    pub from_filters: bool,
    /// Page length override; `None` uses the configured default
    pub items_per_page: Option<usize>,
}

impl QueryArgs {
    /// Parse the raw argument map. Malformed values fall back to defaults
    /// rather than failing the request.
    pub fn from_map(raw: &Map<String, Value>) -> Self {
        let text = |key: &str| raw.get(key).and_then(coerce::to_text);
        let from_filters = raw.get("from_filters").is_some_and(coerce::is_truthy);

        let start = if from_filters {
            0
        } else {
            raw.get("start")
                .map(coerce::to_i64)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(0)
        };

        Self {
            search: text("search").filter(|s| !s.trim().is_empty()),
            field_filters: value_lists(raw.get("field_filters")),
            attribute_filters: value_lists(raw.get("attribute_filters")),
            item_group: text("item_group"),
            sort_by: text("sort_by").map(|s| SortBy::parse(&s)).unwrap_or_default(),
            price: PriceBounds {
                min: positive(raw.get("price_min")),
                max: positive(raw.get("price_max")),
            },
            start,
            from_filters,
            items_per_page: coerce::to_count(raw.get("items_per_page")),
        }
    }

    /// Whether the price pass has anything to do
    pub fn needs_price_pass(&self) -> bool {
        self.price.is_set() || self.sort_by.is_price()
    }
}

/// A bound of 0 or less counts as unset
fn positive(value: Option<&Value>) -> Option<f64> {
    value.map(coerce::to_f64).filter(|v| *v > 0.0)
}

/// `{field: [values]}` from an object (or its JSON string form). Scalars
/// become one-element lists; empty values are dropped.
fn value_lists(value: Option<&Value>) -> BTreeMap<String, Vec<String>> {
    let object = match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            _ => return BTreeMap::new(),
        },
        _ => return BTreeMap::new(),
    };

    object
        .into_iter()
        .filter_map(|(field, values)| {
            let values: Vec<String> = match values {
                Value::Array(items) => items.iter().filter_map(coerce::to_text).collect(),
                scalar => coerce::to_text(&scalar).into_iter().collect(),
            };
            (!values.is_empty()).then_some((field, values))
        })
        .collect()
}

/// Settings echoed back with every listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSettings {
    pub products_per_page: usize,
    pub hide_variants: bool,
    pub enable_field_filters: bool,
    pub enable_attribute_filters: bool,
}

impl ListingSettings {
    pub fn from_config(listing: &ListingConfig, filters: &FilterConfig) -> Self {
        Self {
            products_per_page: listing.products_per_page,
            hide_variants: listing.hide_variants,
            enable_field_filters: filters.enable_field_filters,
            enable_attribute_filters: filters.enable_attribute_filters,
        }
    }
}

/// Filters computed alongside the items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_filters: Option<Vec<DiscountBand>>,
}

/// One page of products with everything the listing page needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListing {
    pub items: Vec<CatalogItem>,
    pub filters: ListingFilters,
    pub settings: ListingSettings,
    pub sub_categories: Vec<SubCategory>,
    /// Matches after price filtering, across all pages
    pub items_count: u64,
}
