//! Link-validity filtering
//!
//! A linked record (supplier, brand, ...) is offered as a facet value only if
//! it is enabled, not disabled and shown on the website, for whichever of
//! those attributes its schema defines.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::Result;

use super::port::{CatalogPort, Condition, EntityMeta, ListQuery, pluck};

/// Which validity attributes an entity type defines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkCapabilities {
    pub has_enabled: bool,
    pub has_disabled: bool,
    pub has_show_in_website: bool,
}

impl LinkCapabilities {
    pub fn from_meta(meta: &EntityMeta) -> Self {
        Self {
            has_enabled: meta.has_field("enabled"),
            has_disabled: meta.has_field("disabled"),
            has_show_in_website: meta.has_field("show_in_website"),
        }
    }

    /// Filters a record must pass to count as valid
    pub fn conditions(&self) -> Vec<Condition> {
        let mut conditions = Vec::new();
        if self.has_enabled {
            conditions.push(Condition::eq("enabled", 1));
        }
        if self.has_disabled {
            conditions.push(Condition::eq("disabled", 0));
        }
        if self.has_show_in_website {
            conditions.push(Condition::eq("show_in_website", 1));
        }
        conditions
    }
}

/// Resolves valid linked records, caching each entity type's capabilities
pub struct LinkValidity {
    catalog: Arc<dyn CatalogPort>,
    capabilities: RwLock<HashMap<String, Option<LinkCapabilities>>>,
}

impl LinkValidity {
    pub fn new(catalog: Arc<dyn CatalogPort>) -> Self {
        Self {
            catalog,
            capabilities: RwLock::new(HashMap::new()),
        }
    }

    /// Capabilities of an entity type; `None` when its schema is missing or
    /// unreadable. Only successful lookups are cached.
    pub async fn capabilities(&self, entity: &str) -> Option<LinkCapabilities> {
        if let Some(cached) = self.capabilities.read().await.get(entity) {
            return *cached;
        }

        let resolved = match self.catalog.get_meta(entity).await {
            Ok(meta) => meta.as_ref().map(LinkCapabilities::from_meta),
            Err(err) => {
                tracing::warn!(entity = %entity, error = %err, "Linked schema unreadable, treating as no valid records");
                return None;
            }
        };

        self.capabilities
            .write()
            .await
            .insert(entity.to_string(), resolved);
        resolved
    }

    /// Names of valid records of `entity`; empty when the entity is unknown
    pub async fn valid_records(&self, entity: Option<&str>) -> Result<BTreeSet<String>> {
        let Some(entity) = entity else {
            return Ok(BTreeSet::new());
        };
        let Some(capabilities) = self.capabilities(entity).await else {
            return Ok(BTreeSet::new());
        };

        let query = ListQuery::new()
            .filters(capabilities.conditions())
            .fields(&["name"]);
        let records = self.catalog.list(entity, &query).await?;

        Ok(pluck(&records, "name").into_iter().collect())
    }
}
