//! Search entities

use serde::{Deserialize, Serialize};

use crate::domain::coerce::{de_i64, de_opt_text};

/// A product as shown in search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductHit {
    #[serde(default, deserialize_with = "de_opt_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub web_item_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub item_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub item_code: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub route: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub item_group: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub website_image: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub description: Option<String>,
    #[serde(default, alias = "web_long_description", deserialize_with = "de_opt_text")]
    pub website_description: Option<String>,
    #[serde(default, deserialize_with = "de_i64")]
    pub ranking: i64,
}

/// Result of a product search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSearchResponse {
    /// Whether the full-text engine served the results
    pub from_redisearch: bool,
    pub results: Vec<ProductHit>,
}

impl ProductSearchResponse {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A suggested category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub name: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub route: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySuggestions {
    pub results: Vec<CategorySuggestion>,
}

/// Combined product and category search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub product_results: Vec<ProductHit>,
    pub category_results: Vec<CategorySuggestion>,
}

/// An autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(default)]
    pub payload: Option<String>,
}

impl Suggestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }
}

/// Autocomplete lookup parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestRequest {
    pub dictionary: String,
    pub prefix: String,
    pub limit: usize,
    pub fuzzy: bool,
    pub with_payloads: bool,
}
