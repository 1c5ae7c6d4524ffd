//! Facet entities

use serde::{Deserialize, Serialize};

use crate::domain::catalog::{FieldMeta, FieldType};

/// A catalog item field offered as a facet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterFieldSpec {
    pub fieldname: String,
    pub field_type: FieldType,
    pub label: String,
    /// Entity type referenced by Link / TableMultiselect fields
    pub link_target: Option<String>,
}

impl FilterFieldSpec {
    pub fn from_meta(field: &FieldMeta) -> Self {
        Self {
            fieldname: field.name.clone(),
            field_type: field.field_type,
            label: field.label.clone().unwrap_or_else(|| field.name.clone()),
            link_target: field.link_target.clone(),
        }
    }
}

/// A field facet with its selectable values.
///
/// Check facets carry no values; their presence alone means at least one
/// qualifying item has the flag set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facet {
    pub field: FilterFieldSpec,
    pub values: Vec<String>,
}

/// A variant attribute facet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFacet {
    pub name: String,
    pub values: Vec<String>,
}

/// One "up to N% off" choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountBand {
    pub threshold: i64,
    pub label: String,
}

impl DiscountBand {
    pub fn new(threshold: i64) -> Self {
        Self {
            threshold,
            label: format!("<={}% off", threshold),
        }
    }
}

/// What the facets are being built for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetContext {
    /// Active item group; `None` for the all-products listing
    pub item_group: Option<String>,
}

impl FacetContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_item_group(item_group: impl Into<String>) -> Self {
        Self {
            item_group: Some(item_group.into()),
        }
    }
}

/// Facet settings in effect for one context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSettings {
    pub fields: Vec<String>,
    pub attributes: Vec<String>,
    pub field_filters_enabled: bool,
    pub attribute_filters_enabled: bool,
}
