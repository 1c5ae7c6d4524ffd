//! Product query engine
//!
//! The [`QueryEngine`] contract and its catalog-backed implementation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{FilterConfig, ListingConfig};
use crate::domain::catalog::{
    CatalogItem, CatalogPort, Condition, EntityMeta, FieldType, ItemScope, ListQuery, OrderBy,
    entities, pluck,
};
use crate::domain::coerce;
use crate::error::{Error, Result};

use super::entity::{ListingSettings, QueryArgs};

/// How many matches to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLength {
    Limit(usize),
    /// Every match
    All,
}

/// One product query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineRequest {
    pub attribute_filters: BTreeMap<String, Vec<String>>,
    pub field_filters: BTreeMap<String, Vec<String>>,
    pub search: Option<String>,
    pub start: usize,
    pub item_group: Option<String>,
    /// Overrides the default `ranking desc`
    pub order_by: Option<OrderBy>,
    /// Overrides the configured page length
    pub page_length: Option<PageLength>,
}

impl EngineRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request carrying the filters, search term, start and group of `args`
    pub fn from_args(args: &QueryArgs) -> Self {
        Self {
            attribute_filters: args.attribute_filters.clone(),
            field_filters: args.field_filters.clone(),
            search: args.search.clone(),
            start: args.start,
            item_group: args.item_group.clone(),
            order_by: None,
            page_length: None,
        }
    }

    pub fn with_order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn with_page_length(mut self, length: PageLength) -> Self {
        self.page_length = Some(length);
        self
    }

    pub fn with_start(mut self, start: usize) -> Self {
        self.start = start;
        self
    }
}

/// Query outcome
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResult {
    pub items: Vec<CatalogItem>,
    /// Total matches across all pages
    pub items_count: u64,
    /// `[min, max]` of positive discounts among all matches
    pub discounts: Option<(f64, f64)>,
    pub settings: ListingSettings,
}

/// Filtered, paginated catalog query
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Run the query; failures surface as [`Error::QueryFailed`]
    async fn query(&self, request: &EngineRequest) -> Result<EngineResult>;
}

/// [`QueryEngine`] over the catalog port
pub struct CatalogQueryEngine {
    catalog: Arc<dyn CatalogPort>,
    listing: ListingConfig,
    filters: FilterConfig,
}

impl CatalogQueryEngine {
    pub fn new(catalog: Arc<dyn CatalogPort>, listing: ListingConfig, filters: FilterConfig) -> Self {
        Self {
            catalog,
            listing,
            filters,
        }
    }

    async fn run(&self, request: &EngineRequest) -> Result<EngineResult> {
        let mut scope = ItemScope::resolve(
            self.catalog.as_ref(),
            request.item_group.as_deref(),
            self.listing.hide_variants,
        )
        .await?;

        if !request.field_filters.is_empty() {
            let meta = self.catalog.get_meta(entities::CATALOG_ITEM).await?;
            scope
                .filters
                .extend(self.field_conditions(meta.as_ref(), &request.field_filters));
        }

        if let Some(names) = self.attribute_matches(&request.attribute_filters).await? {
            scope.filters.push(Condition::is_in("name", names));
        }

        if let Some(term) = request.search.as_deref() {
            let names = self.search_matches(term).await?;
            scope.filters.push(Condition::is_in("name", names));
        }

        let items_count = self
            .catalog
            .count(entities::CATALOG_ITEM, &scope.filters, &scope.or_filters)
            .await?;

        let discounts = self.discount_range(&scope).await?;

        let mut query = scope
            .list_query()
            .order_by(request.order_by.clone().unwrap_or_else(|| OrderBy::desc("ranking")))
            .start(request.start);
        match request
            .page_length
            .unwrap_or(PageLength::Limit(self.listing.products_per_page))
        {
            PageLength::Limit(n) => query = query.limit(n),
            PageLength::All => {}
        }

        let items = self
            .catalog
            .list(entities::CATALOG_ITEM, &query)
            .await?
            .into_iter()
            .map(|record| record.parse::<CatalogItem>())
            .collect::<Result<Vec<_>>>()?;

        Ok(EngineResult {
            items,
            items_count,
            discounts,
            settings: ListingSettings::from_config(&self.listing, &self.filters),
        })
    }

    /// Conditions for the requested field filters; fields missing from the
    /// schema are ignored.
    fn field_conditions(
        &self,
        meta: Option<&EntityMeta>,
        field_filters: &BTreeMap<String, Vec<String>>,
    ) -> Vec<Condition> {
        let Some(meta) = meta else {
            return Vec::new();
        };

        field_filters
            .iter()
            .filter_map(|(field, values)| {
                let Some(spec) = meta.field(field) else {
                    tracing::debug!(field = %field, "Ignoring filter on unknown field");
                    return None;
                };

                if let Some(link) = self.filters.representative_link(field) {
                    return Some(
                        Condition::is_in(link.link_field.as_str(), values.iter().cloned())
                            .in_table(link.table.as_str()),
                    );
                }

                if spec.field_type == FieldType::Check {
                    let yes = &self.filters.check_yes;
                    let values = values.iter().map(|v| match v.trim() {
                        "1" | "true" => yes.clone(),
                        _ => v.clone(),
                    });
                    return Some(Condition::is_in(field.as_str(), values));
                }

                Some(Condition::is_in(field.as_str(), values.iter().cloned()))
            })
            .collect()
    }

    /// Items carrying every filtered attribute with an accepted value;
    /// `None` when no attribute filter applies.
    async fn attribute_matches(
        &self,
        attribute_filters: &BTreeMap<String, Vec<String>>,
    ) -> Result<Option<Vec<String>>> {
        let mut matched: Option<BTreeSet<String>> = None;

        for (attribute, values) in attribute_filters {
            let query = ListQuery::new()
                .filter(Condition::eq("attribute", attribute.as_str()))
                .filter(Condition::is_in("attribute_value", values.iter().cloned()))
                .fields(&["parent"])
                .distinct();
            let rows = self
                .catalog
                .list(entities::ITEM_VARIANT_ATTRIBUTE, &query)
                .await?;
            let parents: BTreeSet<String> = pluck(&rows, "parent").into_iter().collect();

            matched = Some(match matched {
                Some(acc) => acc.intersection(&parents).cloned().collect(),
                None => parents,
            });
        }

        Ok(matched.map(|set| set.into_iter().collect()))
    }

    async fn search_matches(&self, term: &str) -> Result<Vec<String>> {
        let pattern = format!("%{}%", term.trim());
        let query = ListQuery::new()
            .or_filters(
                ["item_name", "web_item_name", "brand", "item_code"]
                    .into_iter()
                    .map(|field| Condition::like(field, pattern.as_str())),
            )
            .fields(&["name"]);
        let rows = self.catalog.list(entities::CATALOG_ITEM, &query).await?;
        Ok(pluck(&rows, "name"))
    }

    async fn discount_range(&self, scope: &ItemScope) -> Result<Option<(f64, f64)>> {
        let query = scope.list_query().fields(&["discount_percent"]);
        let rows = self.catalog.list(entities::CATALOG_ITEM, &query).await?;

        Ok(rows
            .iter()
            .map(|r| coerce::to_f64(r.value("discount_percent")))
            .filter(|d| *d > 0.0)
            .fold(None, |range, d| match range {
                None => Some((d, d)),
                Some((lo, hi)) => Some((f64::min(lo, d), f64::max(hi, d))),
            }))
    }
}

#[async_trait]
impl QueryEngine for CatalogQueryEngine {
    async fn query(&self, request: &EngineRequest) -> Result<EngineResult> {
        self.run(request).await.map_err(Error::into_query_failure)
    }
}
