//! Facet builder
//!
//! Computes the filters worth showing for a listing: field facets whose
//! values are carried by at least one qualifying item, attribute facets and
//! discount bands.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::config::{FilterConfig, RepresentativeLink};
use crate::domain::catalog::{
    CatalogPort, Condition, FieldType, ItemGroup, ItemScope, LinkValidity, ListQuery, entities,
    pluck,
};
use crate::error::{Error, Result};

use super::discount::discount_bands;
use super::entity::{
    AttributeFacet, DiscountBand, Facet, FacetContext, FacetSettings, FilterFieldSpec,
};

/// Builds facets over the catalog
pub struct FacetBuilder {
    catalog: Arc<dyn CatalogPort>,
    validity: LinkValidity,
    filters: FilterConfig,
    hide_variants: bool,
}

impl FacetBuilder {
    pub fn new(catalog: Arc<dyn CatalogPort>, filters: FilterConfig, hide_variants: bool) -> Self {
        Self {
            validity: LinkValidity::new(catalog.clone()),
            catalog,
            filters,
            hide_variants,
        }
    }

    /// Settings in effect: the item group's overrides when a group is active,
    /// otherwise the global configuration with its enable switches.
    pub async fn settings(&self, context: &FacetContext) -> Result<FacetSettings> {
        let Some(group) = context.item_group.as_deref() else {
            return Ok(FacetSettings {
                fields: self.filters.fields.clone(),
                attributes: self.filters.attributes.clone(),
                field_filters_enabled: self.filters.enable_field_filters,
                attribute_filters_enabled: self.filters.enable_attribute_filters,
            });
        };

        let query = ListQuery::new()
            .filter(Condition::eq("name", group))
            .limit(1);
        let record = self
            .catalog
            .list(entities::ITEM_GROUP, &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ItemGroupNotFound(group.to_string()))?;
        let group: ItemGroup = record.parse()?;

        Ok(FacetSettings {
            fields: group.filter_fields,
            attributes: group.filter_attributes,
            field_filters_enabled: true,
            attribute_filters_enabled: true,
        })
    }

    /// Field facets for the context, in configured field order
    pub async fn field_filters(&self, context: &FacetContext) -> Result<Vec<Facet>> {
        let settings = self.settings(context).await?;
        if !settings.field_filters_enabled || settings.fields.is_empty() {
            return Ok(Vec::new());
        }

        let Some(meta) = self.catalog.get_meta(entities::CATALOG_ITEM).await? else {
            tracing::warn!("Catalog item schema missing, no field facets");
            return Ok(Vec::new());
        };

        let specs: Vec<FilterFieldSpec> = settings
            .fields
            .iter()
            .filter_map(|name| meta.field(name))
            .map(FilterFieldSpec::from_meta)
            .collect();

        let scope = ItemScope::resolve(
            self.catalog.as_ref(),
            context.item_group.as_deref(),
            self.hide_variants,
        )
        .await?;

        let mut facets = Vec::with_capacity(specs.len());
        for spec in specs {
            let values = match spec.field_type {
                FieldType::Link => self.link_values(&scope, &spec).await?,
                FieldType::Check => {
                    if self.has_checked_items(&scope, &spec).await? {
                        facets.push(Facet {
                            field: spec,
                            values: Vec::new(),
                        });
                    }
                    continue;
                }
                FieldType::Select => self.select_values(&scope, &spec).await?,
                FieldType::TableMultiselect => self
                    .validity
                    .valid_records(spec.link_target.as_deref())
                    .await?
                    .into_iter()
                    .collect(),
                FieldType::Other => {
                    tracing::debug!(field = %spec.fieldname, "Unsupported facet field type, skipping");
                    continue;
                }
            };

            if !values.is_empty() {
                facets.push(Facet {
                    field: spec,
                    values,
                });
            }
        }

        Ok(facets)
    }

    /// Link values carried by qualifying items, limited to valid linked
    /// records and sorted.
    async fn link_values(&self, scope: &ItemScope, spec: &FilterFieldSpec) -> Result<Vec<String>> {
        let valid = self
            .validity
            .valid_records(spec.link_target.as_deref())
            .await?;
        if valid.is_empty() {
            return Ok(Vec::new());
        }

        let carried: BTreeSet<String> = match self.filters.representative_link(&spec.fieldname) {
            Some(link) => self.associated_values(scope, link).await?,
            None => self.distinct_values(scope, &spec.fieldname).await?,
        }
        .into_iter()
        .collect();

        Ok(carried.intersection(&valid).cloned().collect())
    }

    /// Every record associated with qualifying items through the link's
    /// association table, not only the primary value.
    async fn associated_values(
        &self,
        scope: &ItemScope,
        link: &RepresentativeLink,
    ) -> Result<Vec<String>> {
        let items = self
            .catalog
            .list(entities::CATALOG_ITEM, &scope.list_query().fields(&["name"]))
            .await?;
        let names = pluck(&items, "name");
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let query = ListQuery::new()
            .filter(Condition::is_in("parent", names))
            .fields(&[link.link_field.as_str()])
            .distinct();
        let rows = self.catalog.list(&link.table, &query).await?;
        Ok(pluck(&rows, &link.link_field))
    }

    async fn distinct_values(&self, scope: &ItemScope, field: &str) -> Result<Vec<String>> {
        let query = scope.list_query().fields(&[field]).distinct();
        let rows = self.catalog.list(entities::CATALOG_ITEM, &query).await?;
        Ok(pluck(&rows, field))
    }

    async fn has_checked_items(&self, scope: &ItemScope, spec: &FilterFieldSpec) -> Result<bool> {
        let scope = scope
            .clone()
            .with_filter(Condition::eq(spec.fieldname.as_str(), self.filters.check_yes.as_str()));
        let count = self
            .catalog
            .count(entities::CATALOG_ITEM, &scope.filters, &scope.or_filters)
            .await?;
        Ok(count > 0)
    }

    /// Distinct Select values in first-seen order, minus the "no" sentinel
    async fn select_values(&self, scope: &ItemScope, spec: &FilterFieldSpec) -> Result<Vec<String>> {
        let mut values = self.distinct_values(scope, &spec.fieldname).await?;
        values.retain(|v| *v != self.filters.select_no);
        Ok(values)
    }

    /// Attribute facets in configured attribute order
    pub async fn attribute_filters(&self, context: &FacetContext) -> Result<Vec<AttributeFacet>> {
        let settings = self.settings(context).await?;
        if !settings.attribute_filters_enabled || settings.attributes.is_empty() {
            return Ok(Vec::new());
        }

        let query = ListQuery::new()
            .filter(Condition::is_in("attribute", settings.attributes.iter().cloned()))
            .filter(Condition::is_set("attribute_value"))
            .fields(&["attribute", "attribute_value"])
            .distinct();
        let rows = self
            .catalog
            .list(entities::ITEM_VARIANT_ATTRIBUTE, &query)
            .await?;

        let mut observed: HashMap<String, Vec<String>> = HashMap::new();
        for row in &rows {
            if let (Some(attribute), Some(value)) = (row.text("attribute"), row.text("attribute_value")) {
                observed.entry(attribute).or_default().push(value);
            }
        }

        Ok(settings
            .attributes
            .into_iter()
            .filter_map(|name| {
                observed
                    .remove(&name)
                    .map(|values| AttributeFacet { name, values })
            })
            .collect())
    }

    /// Discount bands for the observed discount range
    pub fn discount_filters(&self, min: f64, max: f64) -> Result<Vec<DiscountBand>> {
        discount_bands(min, max)
    }
}
