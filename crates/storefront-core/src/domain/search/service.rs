//! Search service
//!
//! Product and category search over the full-text engine, with a catalog
//! scan as the fallback whenever the engine is absent, disabled or fails.
//! Search never returns an error to the caller.

use std::cmp::Reverse;
use std::sync::Arc;

use crate::config::{SearchConfig, SiteConfig};
use crate::domain::catalog::{CatalogPort, Condition, ListQuery, OrderBy, Record, entities};
use crate::error::{Error, Result};

use super::engine::FullTextEngine;
use super::entity::{
    CategorySuggestion, CategorySuggestions, ProductHit, ProductSearchResponse, SearchResponse,
    SuggestRequest, Suggestion,
};
use super::normalize::normalize_images;

const PRODUCT_FIELDS: &[&str] = &[
    "name",
    "web_item_name",
    "item_name",
    "item_code",
    "brand",
    "route",
    "item_group",
    "website_image",
    "thumbnail",
    "description",
    "web_long_description",
    "ranking",
];

/// Outcome of trying the full-text engine
#[derive(Debug)]
pub enum Attempt<T> {
    Served(T),
    /// Engine absent or disabled
    Unavailable,
    Failed(Error),
}

impl<T> Attempt<T> {
    /// The served value, or `None` when the fallback should run. Failures are
    /// logged under `category`.
    pub fn or_fallback(self, category: &'static str) -> Option<T> {
        match self {
            Self::Served(value) => Some(value),
            Self::Unavailable => None,
            Self::Failed(err) => {
                tracing::error!(category, error = %err, "Full-text search failed, falling back to catalog scan");
                None
            }
        }
    }
}

/// Keep only alphanumerics and whitespace
pub fn sanitize(query: &str) -> String {
    query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// The term OR-ed with every suggestion: `term|('s1')|('s2')`
pub fn search_expression(term: &str, suggestions: &[Suggestion]) -> String {
    suggestions.iter().fold(term.to_string(), |mut expr, s| {
        expr.push_str(&format!("|('{}')", sanitize(&s.text)));
        expr
    })
}

pub struct SearchService {
    catalog: Arc<dyn CatalogPort>,
    engine: Option<Arc<dyn FullTextEngine>>,
    config: SearchConfig,
    site: SiteConfig,
}

impl SearchService {
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        engine: Option<Arc<dyn FullTextEngine>>,
        config: SearchConfig,
        site: SiteConfig,
    ) -> Self {
        Self {
            catalog,
            engine,
            config,
            site,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn too_short(&self, query: &str) -> bool {
        query.trim().chars().count() < self.config.min_query_len
    }

    async fn active_engine(&self) -> Option<&Arc<dyn FullTextEngine>> {
        let engine = self.engine.as_ref().filter(|_| self.config.enabled)?;
        engine.is_enabled().await.then_some(engine)
    }

    /// Products and categories for a query, looked up concurrently
    pub async fn search(&self, query: &str) -> SearchResponse {
        let (products, categories) = tokio::join!(
            self.product_search(query, self.config.product_limit, true),
            self.category_suggestions(query, self.config.category_limit),
        );

        SearchResponse {
            product_results: products.results,
            category_results: categories.results,
        }
    }

    pub async fn product_search(&self, query: &str, limit: usize, fuzzy: bool) -> ProductSearchResponse {
        if self.too_short(query) {
            return ProductSearchResponse::empty();
        }

        match self
            .full_text_products(query, limit, fuzzy)
            .await
            .or_fallback("product_search")
        {
            Some(results) => ProductSearchResponse {
                from_redisearch: true,
                results,
            },
            None => {
                let results = self
                    .scan_products(Some(query), 0, limit)
                    .await
                    .unwrap_or_else(|err| {
                        tracing::error!(category = "product_search", error = %err, "Catalog scan failed");
                        Vec::new()
                    });
                ProductSearchResponse {
                    from_redisearch: false,
                    results,
                }
            }
        }
    }

    async fn full_text_products(&self, query: &str, limit: usize, fuzzy: bool) -> Attempt<Vec<ProductHit>> {
        let Some(engine) = self.active_engine().await else {
            return Attempt::Unavailable;
        };

        let cleaned = sanitize(query);
        let request = SuggestRequest {
            dictionary: self.config.name_dictionary.clone(),
            prefix: cleaned.clone(),
            limit,
            fuzzy: fuzzy && query.chars().count() > 3,
            with_payloads: false,
        };

        let suggestions = match engine.suggest(&request).await {
            Ok(suggestions) => suggestions,
            Err(err) => return Attempt::Failed(err),
        };

        let expression = search_expression(&cleaned, &suggestions);
        tracing::debug!(category = "product_search", expression = %expression, "Querying full-text index");

        let documents = match engine.search(&self.config.item_index, &expression).await {
            Ok(documents) => documents,
            Err(err) => return Attempt::Failed(err),
        };

        let mut hits = match documents
            .into_iter()
            .map(Record::parse::<ProductHit>)
            .collect::<Result<Vec<_>>>()
        {
            Ok(hits) => hits,
            Err(err) => return Attempt::Failed(err),
        };

        hits.sort_by_key(|hit| Reverse(hit.ranking));
        normalize_images(&mut hits, &self.site.url);
        Attempt::Served(hits)
    }

    pub async fn category_suggestions(&self, query: &str, limit: usize) -> CategorySuggestions {
        if self.too_short(query) {
            return CategorySuggestions::default();
        }

        let results = match self
            .full_text_categories(query, limit)
            .await
            .or_fallback("category_search")
        {
            Some(results) => results,
            None => self.scan_categories(query, limit).await.unwrap_or_else(|err| {
                tracing::error!(category = "category_search", error = %err, "Category scan failed");
                Vec::new()
            }),
        };

        CategorySuggestions { results }
    }

    async fn full_text_categories(&self, query: &str, limit: usize) -> Attempt<Vec<CategorySuggestion>> {
        let Some(engine) = self.active_engine().await else {
            return Attempt::Unavailable;
        };

        let request = SuggestRequest {
            dictionary: self.config.category_dictionary.clone(),
            prefix: query.to_string(),
            limit,
            fuzzy: false,
            with_payloads: true,
        };

        match engine.suggest(&request).await {
            Ok(suggestions) => Attempt::Served(
                suggestions
                    .into_iter()
                    .filter_map(|s| decode_category(&s))
                    .collect(),
            ),
            Err(err) => Attempt::Failed(err),
        }
    }

    async fn scan_categories(&self, query: &str, limit: usize) -> Result<Vec<CategorySuggestion>> {
        let query = ListQuery::new()
            .filter(Condition::like("name", format!("%{}%", query.trim())))
            .filter(Condition::eq("show_in_website", 1))
            .fields(&["name", "route"])
            .limit(limit);

        self.catalog
            .list(entities::ITEM_GROUP, &query)
            .await?
            .into_iter()
            .map(Record::parse)
            .collect()
    }

    /// Paginated catalog scan of published products, optionally matching
    /// `search` against names, brand and description.
    pub async fn product_list(&self, search: Option<&str>, start: usize, limit: usize) -> Result<Vec<ProductHit>> {
        self.scan_products(search, start, limit).await
    }

    async fn scan_products(&self, search: Option<&str>, start: usize, limit: usize) -> Result<Vec<ProductHit>> {
        let mut query = ListQuery::new()
            .filter(Condition::eq("published", 1))
            .fields(PRODUCT_FIELDS)
            .order_by(OrderBy::desc("ranking"))
            .order_by(OrderBy::desc("modified"))
            .start(start)
            .limit(limit);

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term);
            query = query.or_filters(
                ["item_name", "web_item_name", "brand", "web_long_description"]
                    .into_iter()
                    .map(|field| Condition::like(field, pattern.as_str())),
            );
        }

        let mut hits = self
            .catalog
            .list(entities::CATALOG_ITEM, &query)
            .await?
            .into_iter()
            .map(Record::parse::<ProductHit>)
            .collect::<Result<Vec<_>>>()?;

        normalize_images(&mut hits, &self.site.url);
        Ok(hits)
    }
}

fn decode_category(suggestion: &Suggestion) -> Option<CategorySuggestion> {
    let payload = suggestion.payload.as_deref()?;
    match serde_json::from_str(payload) {
        Ok(category) => Some(category),
        Err(err) => {
            tracing::debug!(category = "category_search", suggestion = %suggestion.text, error = %err, "Skipping undecodable payload");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infrastructure::catalog::InMemoryCatalog;
    use async_trait::async_trait;
    use serde_json::json;
    use std::io;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct MockEngine {
        disabled: AtomicBool,
        fail_suggest: bool,
        fail_search: bool,
        names: Vec<Suggestion>,
        categories: Vec<Suggestion>,
        documents: Vec<Record>,
        suggest_calls: Mutex<Vec<SuggestRequest>>,
        expressions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl FullTextEngine for MockEngine {
        async fn is_enabled(&self) -> bool {
            !self.disabled.load(Ordering::SeqCst)
        }

        async fn suggest(&self, request: &SuggestRequest) -> Result<Vec<Suggestion>> {
            self.suggest_calls.lock().unwrap().push(request.clone());
            if self.fail_suggest {
                return Err(Error::SearchEngine("index missing".to_string()));
            }
            Ok(if request.with_payloads {
                self.categories.clone()
            } else {
                self.names.clone()
            })
        }

        async fn search(&self, _index: &str, expression: &str) -> Result<Vec<Record>> {
            self.expressions.lock().unwrap().push(expression.to_string());
            if self.fail_search {
                return Err(Error::SearchEngine("syntax error".to_string()));
            }
            Ok(self.documents.clone())
        }
    }

    fn catalog() -> Arc<InMemoryCatalog> {
        Arc::new(
            InMemoryCatalog::new()
                .with_records(
                    entities::CATALOG_ITEM,
                    vec![
                        Record::new().with("name", "cumin").with("web_item_name", "Cumin Seeds").with("published", 1).with("ranking", 2).with("modified", "2024-01-02").with("website_image", "/files/cumin.jpg"),
                        Record::new().with("name", "cumin-old").with("web_item_name", "Cumin Classic").with("published", 1).with("ranking", 2).with("modified", "2023-05-01"),
                        Record::new().with("name", "tea").with("web_item_name", "Green Tea").with("published", 1).with("ranking", 9).with("web_long_description", "pairs well with cumin"),
                        Record::new().with("name", "hidden").with("web_item_name", "Cumin Draft").with("published", 0),
                    ],
                )
                .with_records(
                    entities::ITEM_GROUP,
                    vec![
                        Record::new().with("name", "Spices").with("route", "spices").with("show_in_website", 1),
                        Record::new().with("name", "Spice Blends").with("show_in_website", 0),
                    ],
                ),
        )
    }

    fn service(engine: Option<Arc<MockEngine>>) -> SearchService {
        SearchService::new(
            catalog(),
            engine.map(|e| e as Arc<dyn FullTextEngine>),
            SearchConfig::default(),
            SiteConfig::default(),
        )
    }

    fn names(hits: &[ProductHit]) -> Vec<&str> {
        hits.iter().filter_map(|h| h.name.as_deref()).collect()
    }

    /// Captured log output
    #[derive(Clone, Default)]
    pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_sanitize_and_expression() {
        assert_eq!(sanitize("cum*in (seeds)!"), "cumin seeds");
        assert_eq!(
            search_expression("cumin", &[Suggestion::new("Cumin Seeds"), Suggestion::new("Cumin-Classic")]),
            "cumin|('Cumin Seeds')|('CuminClassic')"
        );
    }

    #[tokio::test]
    async fn test_short_queries_return_nothing() {
        let engine = Arc::new(MockEngine::default());
        let service = service(Some(engine.clone()));

        let products = service.product_search("cu", 8, true).await;
        assert!(!products.from_redisearch);
        assert!(products.results.is_empty());
        assert!(service.category_suggestions("", 5).await.results.is_empty());
        assert!(engine.suggest_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_text_path() {
        let engine = Arc::new(MockEngine {
            names: vec![Suggestion::new("Cumin Seeds")],
            documents: vec![
                Record::new().with("name", "low").with("ranking", "1").with("thumbnail", "/files/low.jpg"),
                Record::new().with("name", "high").with("ranking", 7),
                Record::new().with("name", "mid").with("ranking", 3.0),
            ],
            ..MockEngine::default()
        });
        let service = service(Some(engine.clone()));

        let response = service.product_search("cumin", 8, true).await;
        assert!(response.from_redisearch);
        assert_eq!(names(&response.results), vec!["high", "mid", "low"]);
        assert_eq!(response.results[2].thumbnail.as_deref(), Some("http://localhost:8000/files/low.jpg"));

        let request = engine.suggest_calls.lock().unwrap()[0].clone();
        assert_eq!(request.dictionary, "website_item_name_autocomplete");
        assert_eq!(request.limit, 8);
        assert!(request.fuzzy);
        assert_eq!(engine.expressions.lock().unwrap()[0], "cumin|('Cumin Seeds')");
    }

    #[tokio::test]
    async fn test_fuzzy_only_for_longer_queries() {
        let engine = Arc::new(MockEngine::default());
        let service = service(Some(engine.clone()));

        service.product_search("tea", 8, true).await;
        service.product_search("cumin", 8, false).await;

        let calls = engine.suggest_calls.lock().unwrap();
        assert!(!calls[0].fuzzy);
        assert!(!calls[1].fuzzy);
    }

    #[tokio::test]
    async fn test_engine_failure_falls_back_to_scan_and_logs() {
        let engine = Arc::new(MockEngine {
            fail_search: true,
            ..MockEngine::default()
        });
        let service = service(Some(engine));

        let buffer = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let response = service.product_search("cumin", 8, true).await;

        assert!(!response.from_redisearch);
        assert_eq!(names(&response.results), vec!["tea", "cumin", "cumin-old"]);
        let logs = buffer.contents();
        assert!(logs.contains("product_search"));
        assert!(logs.contains("syntax error"));
    }

    #[tokio::test]
    async fn test_disabled_engine_uses_scan() {
        let engine = Arc::new(MockEngine::default());
        engine.disabled.store(true, Ordering::SeqCst);
        let scanning = service(Some(engine.clone()));

        let response = scanning.product_search("cumin", 2, true).await;
        assert!(!response.from_redisearch);
        assert_eq!(names(&response.results), vec!["tea", "cumin"]);
        assert_eq!(
            response.results[1].thumbnail.as_deref(),
            Some("http://localhost:8000/files/cumin.jpg")
        );
        assert!(engine.suggest_calls.lock().unwrap().is_empty());

        let no_engine = service(None).product_search("green", 8, true).await;
        assert_eq!(names(&no_engine.results), vec!["tea"]);
        assert_eq!(no_engine.results[0].website_description.as_deref(), Some("pairs well with cumin"));
    }

    #[tokio::test]
    async fn test_scan_failure_yields_empty() {
        let catalog = catalog();
        catalog.set_available(false);
        let service = SearchService::new(catalog, None, SearchConfig::default(), SiteConfig::default());

        let response = service.product_search("cumin", 8, true).await;
        assert!(response.results.is_empty());
        assert!(service.category_suggestions("spi", 5).await.results.is_empty());
        assert!(service.product_list(None, 0, 12).await.is_err());
    }

    #[tokio::test]
    async fn test_category_suggestions_decode_payloads() {
        let engine = Arc::new(MockEngine {
            categories: vec![
                Suggestion::new("Spices").with_payload(json!({"name": "Spices", "route": "spices"}).to_string()),
                Suggestion::new("Broken").with_payload("{not json"),
                Suggestion::new("Bare"),
            ],
            ..MockEngine::default()
        });
        let service = service(Some(engine.clone()));

        let suggestions = service.category_suggestions("spi", 5).await;
        assert_eq!(
            suggestions.results,
            vec![CategorySuggestion {
                name: "Spices".to_string(),
                route: Some("spices".to_string()),
            }]
        );

        let request = engine.suggest_calls.lock().unwrap()[0].clone();
        assert_eq!(request.dictionary, "website_item_category_autocomplete");
        assert!(request.with_payloads);
    }

    #[tokio::test]
    async fn test_category_engine_failure_falls_back_to_scan() {
        let engine = Arc::new(MockEngine {
            fail_suggest: true,
            ..MockEngine::default()
        });
        let service = service(Some(engine));

        let suggestions = service.category_suggestions("spice", 5).await;
        assert_eq!(suggestions.results.len(), 1);
        assert_eq!(suggestions.results[0].name, "Spices");
    }

    #[tokio::test]
    async fn test_search_combines_both_lookups() {
        let response = service(None).search("spic").await;
        assert!(response.product_results.is_empty());
        assert_eq!(response.category_results.len(), 1);

        let response = service(None).search("cumin").await;
        assert_eq!(response.product_results.len(), 3);
        assert!(response.category_results.is_empty());
    }

    #[tokio::test]
    async fn test_product_list_paginates() {
        let service = service(None);
        let page = service.product_list(None, 1, 2).await.unwrap();
        assert_eq!(names(&page), vec!["cumin", "cumin-old"]);

        let all = service.product_list(Some("  "), 0, 12).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
