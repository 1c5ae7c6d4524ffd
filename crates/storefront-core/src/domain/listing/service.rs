//! Listing orchestration
//!
//! Runs the product query, applies the price pass, attaches discount bands
//! and sub-categories, and caches the whole response under a key derived
//! from the raw request arguments.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::config::{ListingConfig, SiteConfig};
use crate::domain::catalog::{CatalogPort, immediate_child_groups};
use crate::domain::facets::FacetBuilder;
use crate::domain::search::normalize_images;
use crate::error::{Error, Result};

use super::cache::ResponseCache;
use super::cache_key::cache_key;
use super::engine::{EngineRequest, PageLength, QueryEngine};
use super::entity::{ListingFilters, ProductListing, QueryArgs};
use super::price::apply_price_filter_and_sort;

/// Product listing orchestrator
pub struct ListingService {
    catalog: Arc<dyn CatalogPort>,
    engine: Arc<dyn QueryEngine>,
    cache: Arc<dyn ResponseCache>,
    facets: Arc<FacetBuilder>,
    listing: ListingConfig,
    site: SiteConfig,
}

impl ListingService {
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        engine: Arc<dyn QueryEngine>,
        cache: Arc<dyn ResponseCache>,
        facets: Arc<FacetBuilder>,
        listing: ListingConfig,
        site: SiteConfig,
    ) -> Self {
        Self {
            catalog,
            engine,
            cache,
            facets,
            listing,
            site,
        }
    }

    /// Listing for a raw argument map, served from the cache when possible
    pub async fn get_product_filter_data(&self, raw: &Map<String, Value>) -> Result<ProductListing> {
        if self.listing.live_mode {
            return self.compute(raw).await;
        }

        let key = cache_key(raw);
        if let Some(listing) = self.cached(&key).await {
            tracing::debug!(category = "response_cache", key = %key, "Cache hit");
            return Ok(listing);
        }

        let listing = self.compute(raw).await?;
        self.store(&key, &listing).await;
        Ok(listing)
    }

    /// Drop the cached response for these arguments
    pub async fn invalidate(&self, raw: &Map<String, Value>) -> Result<()> {
        let key = cache_key(raw);
        self.cache.delete(&key).await?;
        tracing::debug!(category = "response_cache", key = %key, "Invalidated cached listing");
        Ok(())
    }

    /// Cached response; lookup failures and undecodable entries count as misses
    async fn cached(&self, key: &str) -> Option<ProductListing> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(category = "response_cache", key = %key, error = %err, "Cache lookup failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(listing) => Some(listing),
            Err(err) => {
                tracing::warn!(category = "response_cache", key = %key, error = %err, "Discarding undecodable cache entry");
                None
            }
        }
    }

    async fn store(&self, key: &str, listing: &ProductListing) {
        let encoded = match serde_json::to_string(listing) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!(category = "response_cache", key = %key, error = %err, "Could not encode listing");
                return;
            }
        };

        let ttl = Duration::from_secs(self.listing.cache_ttl_secs);
        if let Err(err) = self.cache.set(key, encoded, ttl).await {
            tracing::warn!(category = "response_cache", key = %key, error = %err, "Cache write failed");
        }
    }

    async fn compute(&self, raw: &Map<String, Value>) -> Result<ProductListing> {
        let args = QueryArgs::from_map(raw);

        let sub_categories = match args.item_group.as_deref() {
            Some(group) => immediate_child_groups(self.catalog.as_ref(), group)
                .await
                .map_err(Error::into_query_failure)?,
            None => Vec::new(),
        };

        let price_pass = args.needs_price_pass();
        let mut request = EngineRequest::from_args(&args);
        if let Some(order) = args.sort_by.engine_order() {
            request = request.with_order_by(order);
        }
        if price_pass {
            // filter and sort the full match set, paginate afterwards
            request = request.with_start(0).with_page_length(PageLength::All);
        } else if let Some(per_page) = args.items_per_page {
            request = request.with_page_length(PageLength::Limit(per_page));
        }

        let result = self.engine.query(&request).await.map_err(|err| {
            tracing::error!(category = "product_query", error = %err, "Product query failed");
            err.into_query_failure()
        })?;

        let (mut items, items_count) = if price_pass {
            let filtered = apply_price_filter_and_sort(result.items, args.price, args.sort_by);
            let total = filtered.len() as u64;
            let page_length = args
                .items_per_page
                .unwrap_or(result.settings.products_per_page);
            let page = filtered
                .into_iter()
                .skip(args.start)
                .take(page_length)
                .collect();
            (page, total)
        } else {
            (result.items, result.items_count)
        };

        normalize_images(&mut items, &self.site.url);

        let discount_filters = result.discounts.and_then(|(min, max)| {
            self.facets
                .discount_filters(min, max)
                .inspect_err(|err| {
                    tracing::warn!(category = "discount_filters", min, max, error = %err, "Skipping discount bands");
                })
                .ok()
        });

        Ok(ProductListing {
            items,
            filters: ListingFilters { discount_filters },
            settings: result.settings,
            sub_categories,
            items_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;
    use crate::domain::catalog::{CatalogItem, Record, entities};
    use crate::domain::listing::{EngineResult, ListingSettings};
    use crate::domain::search::service::tests::LogBuffer;
    use crate::infrastructure::cache::MemoryCache;
    use crate::infrastructure::cache::memory::tests::ManualClock;
    use crate::infrastructure::catalog::InMemoryCatalog;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct MockEngine {
        items: Vec<CatalogItem>,
        discounts: Option<(f64, f64)>,
        fail: bool,
        requests: Mutex<Vec<EngineRequest>>,
    }

    impl MockEngine {
        fn new(prices: &[(&str, f64)]) -> Self {
            let items = prices
                .iter()
                .map(|(name, price)| {
                    Record::new()
                        .with("name", *name)
                        .with("price_list_rate", *price)
                        .with("thumbnail", format!("/files/{}.jpg", name))
                        .parse()
                        .unwrap()
                })
                .collect();
            Self {
                items,
                discounts: None,
                fail: false,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> EngineRequest {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl QueryEngine for MockEngine {
        async fn query(&self, request: &EngineRequest) -> Result<EngineResult> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(Error::CatalogUnavailable("connection reset".to_string()));
            }

            let page: Vec<CatalogItem> = match request.page_length {
                Some(PageLength::All) => self.items.iter().skip(request.start).cloned().collect(),
                Some(PageLength::Limit(n)) => self.items.iter().skip(request.start).take(n).cloned().collect(),
                None => self.items.iter().skip(request.start).take(20).cloned().collect(),
            };
            Ok(EngineResult {
                items: page,
                items_count: self.items.len() as u64,
                discounts: self.discounts,
                settings: ListingSettings::from_config(&ListingConfig::default(), &FilterConfig::default()),
            })
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl ResponseCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Cache("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<()> {
            Err(Error::Cache("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(Error::Cache("connection refused".to_string()))
        }
    }

    fn catalog() -> Arc<InMemoryCatalog> {
        Arc::new(InMemoryCatalog::new().with_records(
            entities::ITEM_GROUP,
            vec![
                Record::new().with("name", "Spices").with("show_in_website", 1),
                Record::new().with("name", "Seeds").with("parent_item_group", "Spices").with("show_in_website", 1).with("route", "spices/seeds"),
                Record::new().with("name", "Blends").with("parent_item_group", "Spices").with("show_in_website", 0),
            ],
        ))
    }

    fn service_with(
        engine: Arc<MockEngine>,
        cache: Arc<dyn ResponseCache>,
        listing: ListingConfig,
    ) -> ListingService {
        let catalog = catalog();
        let facets = Arc::new(FacetBuilder::new(catalog.clone(), FilterConfig::default(), false));
        ListingService::new(
            catalog,
            engine,
            cache,
            facets,
            listing,
            SiteConfig {
                url: "https://shop.example.com/".to_string(),
                redirect_on_action: false,
            },
        )
    }

    fn service(engine: Arc<MockEngine>) -> ListingService {
        service_with(engine, Arc::new(MemoryCache::new()), ListingConfig::default())
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn names(listing: &ProductListing) -> Vec<&str> {
        listing.items.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_cache_hit_skips_engine() {
        let engine = Arc::new(MockEngine::new(&[("a", 10.0)]));
        let service = service(engine.clone());
        let raw = args(json!({"search": "tea", "start": 0}));

        let first = service.get_product_filter_data(&raw).await.unwrap();
        let reordered = args(json!({"start": 0, "search": "tea"}));
        let second = service.get_product_filter_data(&reordered).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_live_mode_always_recomputes() {
        let engine = Arc::new(MockEngine::new(&[("a", 10.0)]));
        let cache = Arc::new(MemoryCache::new());
        let service = service_with(
            engine.clone(),
            cache.clone(),
            ListingConfig {
                live_mode: true,
                ..ListingConfig::default()
            },
        );
        let raw = args(json!({}));

        service.get_product_filter_data(&raw).await.unwrap();
        service.get_product_filter_data(&raw).await.unwrap();

        assert_eq!(engine.calls(), 2);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_cache_failures_degrade_to_miss() {
        let engine = Arc::new(MockEngine::new(&[("a", 10.0)]));
        let service = service_with(engine.clone(), Arc::new(BrokenCache), ListingConfig::default());

        let listing = service.get_product_filter_data(&args(json!({}))).await.unwrap();
        assert_eq!(names(&listing), vec!["a"]);
        assert!(service.invalidate(&args(json!({}))).await.is_err());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_recomputed() {
        let engine = Arc::new(MockEngine::new(&[("a", 10.0)]));
        let cache = Arc::new(MemoryCache::new());
        let raw = args(json!({"search": "x"}));
        cache
            .set(&cache_key(&raw), "not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let service = service_with(engine.clone(), cache.clone(), ListingConfig::default());
        service.get_product_filter_data(&raw).await.unwrap();

        assert_eq!(engine.calls(), 1);
        let stored = cache.get(&cache_key(&raw)).await.unwrap().unwrap();
        assert!(stored.starts_with('{'));
    }

    #[tokio::test]
    async fn test_expired_entries_not_served() {
        let engine = Arc::new(MockEngine::new(&[("a", 10.0)]));
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(MemoryCache::with_clock(clock.clone()));
        let service = service_with(engine.clone(), cache, ListingConfig::default());
        let raw = args(json!({}));

        service.get_product_filter_data(&raw).await.unwrap();
        clock.advance(Duration::from_secs(299));
        service.get_product_filter_data(&raw).await.unwrap();
        assert_eq!(engine.calls(), 1);

        clock.advance(Duration::from_secs(2));
        service.get_product_filter_data(&raw).await.unwrap();
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let engine = Arc::new(MockEngine::new(&[("a", 10.0)]));
        let service = service(engine.clone());
        let raw = args(json!({"item_group": "Spices"}));

        service.get_product_filter_data(&raw).await.unwrap();
        service.invalidate(&raw).await.unwrap();
        service.get_product_filter_data(&raw).await.unwrap();

        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn test_engine_failure_is_query_failure() {
        let mut mock = MockEngine::new(&[]);
        mock.fail = true;
        let service = service(Arc::new(mock));

        let err = service.get_product_filter_data(&args(json!({}))).await.unwrap_err();
        assert_eq!(err.code(), "E200");
    }

    #[tokio::test]
    async fn test_price_pass_counts_after_filtering() {
        let engine = Arc::new(MockEngine::new(&[
            ("free", 0.0),
            ("cheap", 50.0),
            ("mid", 150.0),
            ("high", 300.0),
            ("top", 120.0),
        ]));
        let service = service(engine.clone());

        let listing = service
            .get_product_filter_data(&args(json!({
                "price_min": "100",
                "sort_by": "price_asc",
                "items_per_page": 2,
                "start": 1
            })))
            .await
            .unwrap();

        assert_eq!(names(&listing), vec!["mid", "high"]);
        assert_eq!(listing.items_count, 3);

        let request = engine.last_request();
        assert_eq!(request.page_length, Some(PageLength::All));
        assert_eq!(request.start, 0);
        assert_eq!(request.order_by, None);
    }

    #[tokio::test]
    async fn test_plain_listing_uses_engine_total_and_order() {
        let engine = Arc::new(MockEngine::new(&[("a", 0.0), ("b", 5.0), ("c", 7.0)]));
        let service = service(engine.clone());

        let listing = service
            .get_product_filter_data(&args(json!({
                "items_per_page": "2",
                "sort_by": "name_desc",
                "start": 5,
                "from_filters": true
            })))
            .await
            .unwrap();

        assert_eq!(names(&listing), vec!["a", "b"]);
        assert_eq!(listing.items_count, 3);

        let request = engine.last_request();
        assert_eq!(request.start, 0);
        assert_eq!(request.page_length, Some(PageLength::Limit(2)));
        assert_eq!(request.order_by.map(|o| o.to_string()).as_deref(), Some("web_item_name desc"));
    }

    #[tokio::test]
    async fn test_response_parts() {
        let mut mock = MockEngine::new(&[("a", 10.0)]);
        mock.discounts = Some((25.89, 60.5));
        let service = service(Arc::new(mock));

        let listing = service
            .get_product_filter_data(&args(json!({"item_group": "Spices"})))
            .await
            .unwrap();

        let thresholds: Vec<i64> = listing
            .filters
            .discount_filters
            .as_ref()
            .unwrap()
            .iter()
            .map(|b| b.threshold)
            .collect();
        assert_eq!(thresholds, vec![30, 40, 50, 60]);
        assert_eq!(listing.sub_categories.len(), 1);
        assert_eq!(listing.sub_categories[0].name, "Seeds");
        assert_eq!(
            listing.items[0].thumbnail.as_deref(),
            Some("https://shop.example.com/files/a.jpg")
        );
    }

    #[tokio::test]
    async fn test_invalid_discount_range_omits_bands() {
        let mut mock = MockEngine::new(&[("a", 10.0)]);
        mock.discounts = Some((20.0, 100.0));
        let service = service(Arc::new(mock));

        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let listing = service.get_product_filter_data(&args(json!({}))).await.unwrap();
        assert!(listing.filters.discount_filters.is_none());
        let logs = buffer.contents();
        assert!(logs.contains("discount_filters"));
        assert!(logs.contains("Skipping discount bands"));

        let encoded = serde_json::to_value(&listing).unwrap();
        assert_eq!(encoded["filters"], json!({}));
    }
}
