//! Storefront API Module
//!
//! The guest-accessible operations behind the storefront pages. Arguments
//! arrive loosely typed (form values, query strings, JSON bodies) and are
//! coerced here; domain services only see parsed values.

pub mod products;
pub mod search;

use std::sync::Arc;

use crate::config::Config;
use crate::domain::catalog::CatalogPort;
use crate::domain::facets::FacetBuilder;
use crate::domain::listing::{CatalogQueryEngine, ListingService, QueryEngine, ResponseCache};
use crate::domain::search::{FullTextEngine, SearchService};
use crate::infrastructure::cache::MemoryCache;

pub use products::{FilterDataResponse, ListingPageContext};

/// Facade wiring the catalog, cache and engines into the storefront services
pub struct Storefront {
    config: Config,
    catalog: Arc<dyn CatalogPort>,
    cache: Arc<dyn ResponseCache>,
    engine: Arc<dyn QueryEngine>,
    full_text: Option<Arc<dyn FullTextEngine>>,
    facets: Arc<FacetBuilder>,
    listing: ListingService,
    search: SearchService,
}

impl Storefront {
    /// Storefront over `catalog` with an in-memory response cache, the
    /// catalog-backed query engine and no full-text engine.
    pub fn new(config: Config, catalog: Arc<dyn CatalogPort>) -> Self {
        let cache: Arc<dyn ResponseCache> = Arc::new(MemoryCache::new());
        let engine: Arc<dyn QueryEngine> = Arc::new(CatalogQueryEngine::new(
            catalog.clone(),
            config.listing.clone(),
            config.filters.clone(),
        ));
        Self::assemble(config, catalog, cache, engine, None)
    }

    pub fn with_cache(self, cache: Arc<dyn ResponseCache>) -> Self {
        Self::assemble(self.config, self.catalog, cache, self.engine, self.full_text)
    }

    pub fn with_query_engine(self, engine: Arc<dyn QueryEngine>) -> Self {
        Self::assemble(self.config, self.catalog, self.cache, engine, self.full_text)
    }

    pub fn with_full_text(self, full_text: Arc<dyn FullTextEngine>) -> Self {
        Self::assemble(self.config, self.catalog, self.cache, self.engine, Some(full_text))
    }

    fn assemble(
        config: Config,
        catalog: Arc<dyn CatalogPort>,
        cache: Arc<dyn ResponseCache>,
        engine: Arc<dyn QueryEngine>,
        full_text: Option<Arc<dyn FullTextEngine>>,
    ) -> Self {
        let facets = Arc::new(FacetBuilder::new(
            catalog.clone(),
            config.filters.clone(),
            config.listing.hide_variants,
        ));
        let listing = ListingService::new(
            catalog.clone(),
            engine.clone(),
            cache.clone(),
            facets.clone(),
            config.listing.clone(),
            config.site.clone(),
        );
        let search = SearchService::new(
            catalog.clone(),
            full_text.clone(),
            config.search.clone(),
            config.site.clone(),
        );

        Self {
            config,
            catalog,
            cache,
            engine,
            full_text,
            facets,
            listing,
            search,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn facets(&self) -> &FacetBuilder {
        &self.facets
    }
}
