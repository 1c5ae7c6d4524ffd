//! Qualifying-item scope and item-group tree helpers
//!
//! Facets and product queries must agree on which items qualify, so both
//! derive their base filters from [`ItemScope::resolve`].

use std::collections::{HashMap, HashSet, VecDeque};

use crate::domain::coerce;
use crate::error::Result;

use super::entity::SubCategory;
use super::port::{CatalogPort, Condition, ListQuery, Record, entities};

/// Base filters selecting the items that participate in a listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemScope {
    /// AND-ed conditions
    pub filters: Vec<Condition>,
    /// Group membership alternatives; empty when no group is active
    pub or_filters: Vec<Condition>,
}

impl ItemScope {
    /// Published items, optionally restricted to an item group (and its
    /// visible descendants when the group includes them), optionally
    /// excluding variants.
    pub async fn resolve(
        catalog: &dyn CatalogPort,
        item_group: Option<&str>,
        hide_variants: bool,
    ) -> Result<Self> {
        let mut scope = Self {
            filters: vec![Condition::eq("published", 1)],
            or_filters: Vec::new(),
        };

        if hide_variants {
            scope.filters.push(Condition::is_not_set("variant_of"));
        }

        if let Some(group) = item_group {
            let include_descendants = catalog
                .get_value(entities::ITEM_GROUP, group, "include_descendants")
                .await?
                .is_some_and(|v| coerce::is_truthy(&v));

            let own_group = if include_descendants {
                let groups = child_groups_for_website(catalog, group, true).await?;
                Condition::is_in("item_group", groups)
            } else {
                Condition::eq("item_group", group)
            };

            scope.or_filters = vec![
                own_group,
                Condition::eq("item_group", group).in_table(entities::ITEM_GROUP_LINK),
            ];
        }

        Ok(scope)
    }

    /// Add an AND-ed condition
    pub fn with_filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    /// A list query pre-populated with this scope
    pub fn list_query(&self) -> ListQuery {
        ListQuery::new()
            .filters(self.filters.iter().cloned())
            .or_filters(self.or_filters.iter().cloned())
    }
}

/// Names of the storefront-visible descendants of `group`, optionally
/// including the group itself.
pub async fn child_groups_for_website(
    catalog: &dyn CatalogPort,
    group: &str,
    include_self: bool,
) -> Result<Vec<String>> {
    let records = catalog
        .list(
            entities::ITEM_GROUP,
            &ListQuery::new().fields(&["name", "parent_item_group", "show_in_website"]),
        )
        .await?;

    let mut children: HashMap<String, Vec<&Record>> = HashMap::new();
    for record in &records {
        if let Some(parent) = record.text("parent_item_group") {
            children.entry(parent).or_default().push(record);
        }
    }

    let mut out = Vec::new();
    if include_self {
        out.push(group.to_string());
    }

    let mut seen: HashSet<String> = HashSet::from([group.to_string()]);
    let mut queue = VecDeque::from([group.to_string()]);
    while let Some(current) = queue.pop_front() {
        let Some(kids) = children.get(&current) else {
            continue;
        };
        for kid in kids {
            let Some(name) = kid.name() else { continue };
            if !seen.insert(name.clone()) {
                continue;
            }
            if coerce::is_truthy(kid.value("show_in_website")) {
                out.push(name.clone());
            }
            queue.push_back(name);
        }
    }

    Ok(out)
}

/// Visible direct children of `group`
pub async fn immediate_child_groups(
    catalog: &dyn CatalogPort,
    group: &str,
) -> Result<Vec<SubCategory>> {
    let query = ListQuery::new()
        .filter(Condition::eq("parent_item_group", group))
        .filter(Condition::eq("show_in_website", 1))
        .fields(&["name", "route"]);

    catalog
        .list(entities::ITEM_GROUP, &query)
        .await?
        .into_iter()
        .map(Record::parse)
        .collect()
}
