//! Storefront Core Integration Tests
//!
//! Runs the guest-facing operations end-to-end against the fixture catalog
//! snapshot in `tests/fixtures/catalog.json`.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use storefront_core::{
    Storefront,
    api::FilterDataResponse,
    config::Config,
    domain::catalog::{CatalogPort, Record, entities},
    domain::listing::ProductListing,
    infrastructure::catalog::InMemoryCatalog,
};

const SNAPSHOT: &str = include_str!("fixtures/catalog.json");

fn catalog() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::from_json(SNAPSHOT).unwrap())
}

fn storefront_with(config: Config) -> (Storefront, Arc<InMemoryCatalog>) {
    let catalog = catalog();
    let storefront = Storefront::new(config, catalog.clone() as Arc<dyn CatalogPort>);
    (storefront, catalog)
}

fn storefront() -> (Storefront, Arc<InMemoryCatalog>) {
    storefront_with(Config::default())
}

async fn listing(storefront: &Storefront, args: Value) -> ProductListing {
    storefront
        .get_product_filter_data(Some(&args))
        .await
        .listing()
        .cloned()
        .unwrap_or_else(|| panic!("expected a listing for {}", args))
}

fn names(listing: &ProductListing) -> Vec<&str> {
    listing.items.iter().map(|item| item.name.as_str()).collect()
}

fn form(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

#[tokio::test]
async fn test_default_listing_orders_by_ranking() {
    let (storefront, _) = storefront();

    let listing = listing(&storefront, json!({})).await;
    assert_eq!(
        names(&listing),
        vec!["WI-SAFFRON", "WI-CUMIN", "WI-PEPPER", "WI-SENCHA", "WI-CUMIN-XL"]
    );
    assert_eq!(listing.items_count, 5);
    assert!(listing.sub_categories.is_empty());
    assert_eq!(listing.settings.products_per_page, 20);

    // relative image paths become absolute
    let cumin = &listing.items[1];
    assert_eq!(cumin.thumbnail.as_deref(), Some("http://localhost:8000/files/cumin.jpg"));
    let saffron = &listing.items[0];
    assert_eq!(saffron.thumbnail.as_deref(), Some("https://cdn.example.com/saffron.jpg"));
}

#[tokio::test]
async fn test_listing_without_arguments() {
    let (storefront, _) = storefront();

    let response = storefront.get_product_filter_data(None).await;
    assert_eq!(response.listing().map(|l| l.items_count), Some(5));
}

#[tokio::test]
async fn test_field_filters_and_discount_bands() {
    let (storefront, _) = storefront();

    let listing = listing(&storefront, json!({"field_filters": {"brand": ["Zest"]}})).await;
    assert_eq!(names(&listing), vec!["WI-CUMIN", "WI-PEPPER"]);
    assert_eq!(listing.items_count, 2);

    let bands = listing.filters.discount_filters.unwrap();
    let thresholds: Vec<i64> = bands.iter().map(|b| b.threshold).collect();
    assert_eq!(thresholds, vec![30, 40, 50, 60]);
    assert_eq!(bands[0].label, "<=30% off");
}

#[tokio::test]
async fn test_query_args_as_json_string() {
    let (storefront, _) = storefront();

    let args = json!(r#"{"search": "pepper"}"#);
    let listing = listing(&storefront, args).await;
    assert_eq!(names(&listing), vec!["WI-PEPPER"]);
    assert_eq!(listing.items_count, 1);
}

#[tokio::test]
async fn test_representative_link_filter_matches_any_supplier() {
    let (storefront, _) = storefront();

    let args = json!({"field_filters": {"primary_supplier": ["Spice Traders"]}});
    let listing = listing(&storefront, args).await;
    assert_eq!(names(&listing), vec!["WI-CUMIN"]);
}

#[tokio::test]
async fn test_attribute_filters() {
    let (storefront, _) = storefront();

    let args = json!({"attribute_filters": {"Size": ["50g", "1kg"]}});
    let listing = listing(&storefront, args).await;
    assert_eq!(names(&listing), vec!["WI-PEPPER", "WI-CUMIN-XL"]);
}

#[tokio::test]
async fn test_price_filter_sorts_then_paginates() {
    let (storefront, _) = storefront();

    let args = json!({"price_min": 100, "sort_by": "price_asc", "items_per_page": 2});
    let first_page = listing(&storefront, args).await;
    assert_eq!(names(&first_page), vec!["WI-CUMIN", "WI-SAFFRON"]);
    // count reflects the price-filtered total, not the page
    assert_eq!(first_page.items_count, 3);

    let args = json!({"price_min": 100, "sort_by": "price_asc", "items_per_page": 2, "start": 2});
    let second_page = listing(&storefront, args).await;
    assert_eq!(names(&second_page), vec!["WI-CUMIN-XL"]);
    assert_eq!(second_page.items_count, 3);
}

#[tokio::test]
async fn test_price_sort_without_bounds_keeps_unknown_prices() {
    let (storefront, _) = storefront();

    let listing = listing(&storefront, json!({"sort_by": "price_desc"})).await;
    assert_eq!(
        names(&listing),
        vec!["WI-CUMIN-XL", "WI-SAFFRON", "WI-CUMIN", "WI-PEPPER", "WI-SENCHA"]
    );
}

#[tokio::test]
async fn test_item_group_listing_includes_linked_items() {
    let (storefront, _) = storefront();

    let spices = listing(&storefront, json!({"item_group": "Spices"})).await;
    assert_eq!(spices.items_count, 5);
    assert!(names(&spices).contains(&"WI-SENCHA"));
    assert_eq!(spices.sub_categories.len(), 1);
    assert_eq!(spices.sub_categories[0].name, "Seeds");
    assert_eq!(spices.sub_categories[0].route.as_deref(), Some("spices/seeds"));

    let tea = listing(&storefront, json!({"item_group": "Tea"})).await;
    assert_eq!(names(&tea), vec!["WI-SENCHA"]);
    assert!(tea.filters.discount_filters.is_none());
}

#[tokio::test]
async fn test_hide_variants() {
    let mut config = Config::default();
    config.listing.hide_variants = true;
    let (storefront, _) = storefront_with(config);

    let listing = listing(&storefront, json!({})).await;
    assert_eq!(listing.items_count, 4);
    assert!(!names(&listing).contains(&"WI-CUMIN-XL"));
    assert!(listing.settings.hide_variants);
}

#[tokio::test]
async fn test_offline_catalog_returns_generic_failure() {
    let (storefront, catalog) = storefront();
    catalog.set_available(false);

    let response = storefront.get_product_filter_data(Some(&json!({}))).await;
    assert_eq!(response, FilterDataResponse::failure());
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({"exc": "Unable to load products. Please try again."})
    );
}

#[tokio::test]
async fn test_malformed_query_args_return_generic_failure() {
    let (storefront, _) = storefront();

    let response = storefront.get_product_filter_data(Some(&json!("{not json"))).await;
    assert!(response.listing().is_none());

    let response = storefront.get_product_filter_data(Some(&json!(42))).await;
    assert!(response.listing().is_none());
}

#[tokio::test]
async fn test_cached_listing_until_invalidated() {
    let (storefront, catalog) = storefront();
    let args = json!({"field_filters": {"brand": ["Goldleaf"]}});

    let first = listing(&storefront, args.clone()).await;
    assert_eq!(first.items_count, 1);

    catalog.insert(
        entities::CATALOG_ITEM,
        Record::new()
            .with("name", "WI-SAFFRON-5")
            .with("web_item_name", "Saffron 5g")
            .with("brand", "Goldleaf")
            .with("published", 1)
            .with("ranking", 2),
    );

    let cached = listing(&storefront, args.clone()).await;
    assert_eq!(cached, first);

    storefront.invalidate_product_filter_data(Some(&args)).await.unwrap();
    let fresh = listing(&storefront, args).await;
    assert_eq!(names(&fresh), vec!["WI-SAFFRON", "WI-SAFFRON-5"]);
    assert_eq!(fresh.items_count, 2);
}

#[tokio::test]
async fn test_live_mode_skips_cache() {
    let mut config = Config::default();
    config.listing.live_mode = true;
    let (storefront, catalog) = storefront_with(config);

    assert_eq!(listing(&storefront, json!({})).await.items_count, 5);
    catalog.insert(
        entities::CATALOG_ITEM,
        Record::new().with("name", "WI-NEW").with("published", 1),
    );
    assert_eq!(listing(&storefront, json!({})).await.items_count, 6);
}

#[tokio::test]
async fn test_listing_page_context_for_group() {
    let (storefront, _) = storefront();

    let context = storefront
        .listing_page_context(&form(json!({"item_group": "Spices", "price_min": "10"})))
        .await
        .unwrap();

    let fields: Vec<&str> = context
        .field_filters
        .iter()
        .map(|f| f.field.fieldname.as_str())
        .collect();
    assert_eq!(fields, vec!["brand", "origin"]);
    assert_eq!(context.field_filters[0].values, vec!["Bulkco", "Goldleaf", "Zest"]);
    assert_eq!(context.field_filters[1].values, vec!["Turkey", "Iran"]);

    assert_eq!(context.attribute_filters.len(), 1);
    assert_eq!(context.attribute_filters[0].name, "Size");
    assert_eq!(context.attribute_filters[0].values, vec!["100g", "1kg", "50g"]);

    assert_eq!(context.page_length, 20);
    assert_eq!(context.price_min.as_deref(), Some("10"));
    assert!(context.price_max.is_none());
}

#[tokio::test]
async fn test_listing_page_context_global_settings() {
    let (storefront, _) = storefront();

    let context = storefront
        .listing_page_context(&form(json!({"items_per_page": "12"})))
        .await
        .unwrap();

    assert_eq!(context.field_filters.len(), 2);
    assert_eq!(context.field_filters[0].field.label, "Supplier");
    assert_eq!(
        context.field_filters[0].values,
        vec!["Acme", "Bazaar", "Leaf Co", "Spice Traders"]
    );
    assert_eq!(context.field_filters[1].values, vec!["Bulkco", "Goldleaf", "Zest"]);
    assert!(context.attribute_filters.is_empty());
    assert_eq!(context.page_length, 12);
}

#[tokio::test]
async fn test_listing_page_context_unknown_group() {
    let (storefront, _) = storefront();

    let err = storefront
        .listing_page_context(&form(json!({"item_group": "Nope"})))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "E102");
}

#[tokio::test]
async fn test_search_falls_back_to_catalog_scan() {
    let (storefront, _) = storefront();

    let response = storefront.search("cumin").await;
    let products: Vec<&str> = response
        .product_results
        .iter()
        .filter_map(|hit| hit.name.as_deref())
        .collect();
    assert_eq!(products, vec!["WI-CUMIN", "WI-SENCHA", "WI-CUMIN-XL"]);
    assert!(response.category_results.is_empty());

    let response = storefront.search("spice").await;
    assert_eq!(response.category_results.len(), 1);
    assert_eq!(response.category_results[0].name, "Spices");
}

#[tokio::test]
async fn test_product_search_coerces_limits() {
    let (storefront, _) = storefront();

    let response = storefront
        .product_search("cumin", Some(&json!("2")), Some(&json!("false")))
        .await;
    assert!(!response.from_redisearch);
    assert_eq!(response.results.len(), 2);

    let short = storefront.product_search("cu", None, None).await;
    assert!(short.results.is_empty());

    let categories = storefront.get_category_suggestions("see", Some(&json!(3))).await;
    assert_eq!(categories.results.len(), 1);
    assert_eq!(categories.results[0].route.as_deref(), Some("spices/seeds"));
}

#[tokio::test]
async fn test_product_list_pages() {
    let (storefront, _) = storefront();

    let page = storefront
        .get_product_list(None, Some(&json!(1)), Some(&json!(2)))
        .await
        .unwrap();
    let names: Vec<&str> = page.iter().filter_map(|hit| hit.name.as_deref()).collect();
    assert_eq!(names, vec!["WI-CUMIN", "WI-PEPPER"]);

    let matching = storefront
        .get_product_list(Some("green"), None, None)
        .await
        .unwrap();
    assert_eq!(matching.len(), 1);
}

#[tokio::test]
async fn test_guest_redirect_on_action() {
    let (storefront, _) = storefront();
    assert!(!storefront.guest_redirect_on_action());

    let mut config = Config::default();
    config.site.redirect_on_action = true;
    let (storefront, _) = storefront_with(config);
    assert!(storefront.guest_redirect_on_action());
}
