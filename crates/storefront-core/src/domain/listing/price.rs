//! Price filtering and sorting
//!
//! A price of 0 or below means "unknown": such items are kept when no bound
//! is given and dropped as soon as either bound is.

use super::entity::{PriceBounds, SortBy};
use crate::domain::catalog::CatalogItem;

/// Filter by price bounds and apply a price sort in one pass.
///
/// Without bounds and without a price sort the items pass through untouched.
/// Price sorts are stable; other sorts keep the incoming order.
pub fn apply_price_filter_and_sort(
    items: Vec<CatalogItem>,
    bounds: PriceBounds,
    sort_by: SortBy,
) -> Vec<CatalogItem> {
    if !bounds.is_set() && !sort_by.is_price() {
        return items;
    }

    let mut kept: Vec<CatalogItem> = items
        .into_iter()
        .filter(|item| within(item.price(), bounds))
        .collect();

    match sort_by {
        SortBy::PriceAsc => kept.sort_by(|a, b| a.price().total_cmp(&b.price())),
        SortBy::PriceDesc => kept.sort_by(|a, b| b.price().total_cmp(&a.price())),
        _ => {}
    }

    kept
}

fn within(price: f64, bounds: PriceBounds) -> bool {
    if !bounds.is_set() {
        return true;
    }
    if price <= 0.0 {
        return false;
    }
    !bounds.min.is_some_and(|min| price < min) && !bounds.max.is_some_and(|max| price > max)
}
