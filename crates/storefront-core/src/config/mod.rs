//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Storefront configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub listing: ListingConfig,
    pub filters: FilterConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Absolute base URL used to rewrite relative image paths
    pub url: String,
    /// Whether guests are redirected to login on cart actions
    pub redirect_on_action: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub products_per_page: usize,
    /// Exclude variant items from listings and facets
    pub hide_variants: bool,
    pub cache_ttl_secs: u64,
    /// Bypass the response cache entirely (developer mode)
    pub live_mode: bool,
}

/// Link field whose facet aggregates over an association table
/// instead of the single value stored on the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepresentativeLink {
    /// Field on the catalog item holding the primary value
    pub field: String,
    /// Association table keyed by `parent` = item name
    pub table: String,
    /// Column of the association table holding the linked record
    pub link_field: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub enable_field_filters: bool,
    pub enable_attribute_filters: bool,
    /// Catalog item fields offered as facets
    pub fields: Vec<String>,
    /// Variant attributes offered as facets, in display order
    pub attributes: Vec<String>,
    /// Sentinel stored in Check fields for "yes"
    pub check_yes: String,
    /// Sentinel stored in Select fields for "no"
    pub select_no: String,
    pub representative_links: Vec<RepresentativeLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Whether the full-text engine may be used at all
    pub enabled: bool,
    pub min_query_len: usize,
    pub product_limit: usize,
    pub category_limit: usize,
    pub list_limit: usize,
    pub item_index: String,
    pub name_dictionary: String,
    pub category_dictionary: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            redirect_on_action: false,
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            products_per_page: 20,
            hide_variants: false,
            cache_ttl_secs: 300,
            live_mode: false,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            enable_field_filters: true,
            enable_attribute_filters: true,
            fields: vec!["primary_supplier".to_string(), "brand".to_string()],
            attributes: Vec::new(),
            check_yes: "Evet".to_string(),
            select_no: "Hayır".to_string(),
            representative_links: vec![RepresentativeLink {
                field: "primary_supplier".to_string(),
                table: "item_supplier".to_string(),
                link_field: "supplier".to_string(),
            }],
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_query_len: 3,
            product_limit: 8,
            category_limit: 5,
            list_limit: 12,
            item_index: "website_item_index".to_string(),
            name_dictionary: "website_item_name_autocomplete".to_string(),
            category_dictionary: "website_item_category_autocomplete".to_string(),
        }
    }
}

impl FilterConfig {
    /// Look up the association used by a representative link field
    pub fn representative_link(&self, field: &str) -> Option<&RepresentativeLink> {
        self.representative_links.iter().find(|link| link.field == field)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("STOREFRONT_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("storefront")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// `STOREFRONT_LIVE_MODE=1` forces cache bypass regardless of the file
    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("STOREFRONT_LIVE_MODE") {
            if matches!(value.trim(), "1" | "true" | "yes") {
                self.listing.live_mode = true;
            }
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.site.url.starts_with("http") {
            return Err(anyhow!("site.url must be an absolute http(s) URL, got '{}'", self.site.url));
        }
        if self.listing.products_per_page == 0 {
            return Err(anyhow!("listing.products_per_page must be greater than zero"));
        }
        if self.listing.cache_ttl_secs == 0 {
            return Err(anyhow!("listing.cache_ttl_secs must be greater than zero"));
        }
        if self.search.min_query_len == 0 {
            return Err(anyhow!("search.min_query_len must be greater than zero"));
        }
        if self.filters.check_yes == self.filters.select_no {
            return Err(anyhow!("filters.check_yes and filters.select_no must differ"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "site.url" => Ok(self.site.url.clone()),
            "site.redirect_on_action" => Ok(self.site.redirect_on_action.to_string()),

            "listing.products_per_page" => Ok(self.listing.products_per_page.to_string()),
            "listing.hide_variants" => Ok(self.listing.hide_variants.to_string()),
            "listing.cache_ttl_secs" => Ok(self.listing.cache_ttl_secs.to_string()),
            "listing.live_mode" => Ok(self.listing.live_mode.to_string()),

            "filters.enable_field_filters" => Ok(self.filters.enable_field_filters.to_string()),
            "filters.enable_attribute_filters" => {
                Ok(self.filters.enable_attribute_filters.to_string())
            }
            "filters.fields" => Ok(self.filters.fields.join(", ")),
            "filters.attributes" => Ok(self.filters.attributes.join(", ")),

            "search.enabled" => Ok(self.search.enabled.to_string()),
            "search.min_query_len" => Ok(self.search.min_query_len.to_string()),
            "search.product_limit" => Ok(self.search.product_limit.to_string()),
            "search.category_limit" => Ok(self.search.category_limit.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `storefront config show` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "site.url" => {
                if !value.starts_with("http") {
                    return Err(anyhow!("site.url must be an absolute http(s) URL"));
                }
                self.site.url = value.to_string();
            }
            "site.redirect_on_action" => self.site.redirect_on_action = parse_bool(key, value)?,

            "listing.products_per_page" => {
                let per_page: usize = value
                    .parse()
                    .with_context(|| format!("Invalid products_per_page value: {}", value))?;
                if per_page == 0 {
                    return Err(anyhow!("products_per_page must be greater than zero"));
                }
                self.listing.products_per_page = per_page;
            }
            "listing.hide_variants" => self.listing.hide_variants = parse_bool(key, value)?,
            "listing.cache_ttl_secs" => {
                let ttl: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid cache_ttl_secs value: {}", value))?;
                if ttl == 0 {
                    return Err(anyhow!("cache_ttl_secs must be greater than zero"));
                }
                self.listing.cache_ttl_secs = ttl;
            }
            "listing.live_mode" => self.listing.live_mode = parse_bool(key, value)?,

            "filters.enable_field_filters" => {
                self.filters.enable_field_filters = parse_bool(key, value)?
            }
            "filters.enable_attribute_filters" => {
                self.filters.enable_attribute_filters = parse_bool(key, value)?
            }
            "filters.fields" => self.filters.fields = parse_list(value),
            "filters.attributes" => self.filters.attributes = parse_list(value),

            "search.enabled" => self.search.enabled = parse_bool(key, value)?,
            "search.min_query_len" => {
                self.search.min_query_len = value
                    .parse()
                    .with_context(|| format!("Invalid min_query_len value: {}", value))?;
            }
            "search.product_limit" => {
                self.search.product_limit = value
                    .parse()
                    .with_context(|| format!("Invalid product_limit value: {}", value))?;
            }
            "search.category_limit" => {
                self.search.category_limit = value
                    .parse()
                    .with_context(|| format!("Invalid category_limit value: {}", value))?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `storefront config show` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "site.url",
            "site.redirect_on_action",
            "listing.products_per_page",
            "listing.hide_variants",
            "listing.cache_ttl_secs",
            "listing.live_mode",
            "filters.enable_field_filters",
            "filters.enable_attribute_filters",
            "filters.fields",
            "filters.attributes",
            "search.enabled",
            "search.min_query_len",
            "search.product_limit",
            "search.category_limit",
        ];

        keys.into_iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("Invalid boolean for {}: {}", key, value)),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
