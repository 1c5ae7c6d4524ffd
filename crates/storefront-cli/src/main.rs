//! Storefront CLI - query a catalog snapshot from the terminal

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Map, Value};
use storefront_core::api::{FilterDataResponse, ListingPageContext};
use storefront_core::config::Config;
use storefront_core::domain::catalog::CatalogPort;
use storefront_core::domain::search::{CategorySuggestions, ProductHit, ProductSearchResponse};
use storefront_core::infrastructure::catalog::InMemoryCatalog;
use storefront_core::Storefront;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about = "Product discovery over a storefront catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $STOREFRONT_CONFIG_DIR/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog snapshot (JSON)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Filtered, sorted, paginated product listing
    Products {
        /// Query arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },

    /// Products and categories for a query
    Search { query: String },

    /// Product suggestions for a query
    Suggest {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
        /// Disable fuzzy matching
        #[arg(long)]
        exact: bool,
    },

    /// Category suggestions for a query
    Categories {
        query: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Paginated product list
    List {
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        start: Option<usize>,
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Facets offered on the listing page
    Facets {
        #[arg(long)]
        item_group: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show all configuration values
    Show,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("storefront=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { action } => cmd_config(action, cli.config.as_deref()),
        command => {
            let storefront = open_storefront(cli.config.as_deref(), cli.catalog.as_deref())?;
            run(&storefront, command, cli.format).await
        }
    }
}

async fn run(storefront: &Storefront, command: Commands, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::Products { args } => cmd_products(storefront, args.as_deref(), format).await,
        Commands::Search { query } => cmd_search(storefront, &query, format).await,
        Commands::Suggest { query, limit, exact } => {
            cmd_suggest(storefront, &query, limit, exact, format).await
        }
        Commands::Categories { query, limit } => {
            cmd_categories(storefront, &query, limit, format).await
        }
        Commands::List {
            search,
            start,
            limit,
        } => cmd_list(storefront, search.as_deref(), start, limit, format).await,
        Commands::Facets { item_group } => cmd_facets(storefront, item_group, format).await,
        // handled before a catalog is opened
        Commands::Config { .. } => Ok(()),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn open_storefront(config: Option<&Path>, catalog: Option<&Path>) -> anyhow::Result<Storefront> {
    let path = catalog.ok_or_else(|| anyhow!("--catalog <snapshot.json> is required"))?;
    let config = load_config(config)?;
    let catalog = InMemoryCatalog::load(path)
        .with_context(|| format!("Failed to load catalog snapshot: {}", path.display()))?;
    tracing::debug!(snapshot = %path.display(), "Catalog snapshot loaded");

    Ok(Storefront::new(config, Arc::new(catalog) as Arc<dyn CatalogPort>))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_products(storefront: &Storefront, args: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    let args: Option<Value> = args
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--args must be a JSON object")?;

    let response = storefront.get_product_filter_data(args.as_ref()).await;
    if let OutputFormat::Json = format {
        print_json(&response)?;
    }

    let listing = match response {
        FilterDataResponse::Listing(listing) => listing,
        FilterDataResponse::Failure { exc } => return Err(anyhow!(exc)),
    };

    if let OutputFormat::Text = format {
        println!("{} products", listing.items_count);
        for item in &listing.items {
            println!("  {:<16} {:<28} {:>10.2}", item.name, item.display_name(), item.price());
        }
        if let Some(bands) = &listing.filters.discount_filters {
            let labels: Vec<&str> = bands.iter().map(|b| b.label.as_str()).collect();
            println!("Discounts: {}", labels.join(", "));
        }
        if !listing.sub_categories.is_empty() {
            let names: Vec<&str> = listing.sub_categories.iter().map(|c| c.name.as_str()).collect();
            println!("Sub-categories: {}", names.join(", "));
        }
    }
    Ok(())
}

fn print_hits(hits: &[ProductHit]) {
    if hits.is_empty() {
        println!("  (none)");
    }
    for hit in hits {
        let name = hit.name.as_deref().unwrap_or("-");
        let title = hit
            .web_item_name
            .as_deref()
            .or(hit.item_name.as_deref())
            .unwrap_or(name);
        println!("  {:<16} {}", name, title);
    }
}

fn print_categories(categories: &CategorySuggestions) {
    if categories.results.is_empty() {
        println!("  (none)");
    }
    for category in &categories.results {
        match &category.route {
            Some(route) => println!("  {} (/{})", category.name, route),
            None => println!("  {}", category.name),
        }
    }
}

async fn cmd_search(storefront: &Storefront, query: &str, format: OutputFormat) -> anyhow::Result<()> {
    let response = storefront.search(query).await;
    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Text => {
            println!("Products:");
            print_hits(&response.product_results);
            println!("Categories:");
            print_categories(&CategorySuggestions {
                results: response.category_results,
            });
        }
    }
    Ok(())
}

async fn cmd_suggest(
    storefront: &Storefront,
    query: &str,
    limit: Option<usize>,
    exact: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let limit = limit.map(Value::from);
    let fuzzy = Value::Bool(!exact);
    let response: ProductSearchResponse = storefront
        .product_search(query, limit.as_ref(), Some(&fuzzy))
        .await;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Text => {
            let source = if response.from_redisearch { "full-text index" } else { "catalog scan" };
            println!("Suggestions ({}):", source);
            print_hits(&response.results);
        }
    }
    Ok(())
}

async fn cmd_categories(
    storefront: &Storefront,
    query: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let limit = limit.map(Value::from);
    let categories = storefront.get_category_suggestions(query, limit.as_ref()).await;
    match format {
        OutputFormat::Json => print_json(&categories)?,
        OutputFormat::Text => print_categories(&categories),
    }
    Ok(())
}

async fn cmd_list(
    storefront: &Storefront,
    search: Option<&str>,
    start: Option<usize>,
    limit: Option<usize>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let start = start.map(Value::from);
    let limit = limit.map(Value::from);
    let hits = storefront
        .get_product_list(search, start.as_ref(), limit.as_ref())
        .await?;

    match format {
        OutputFormat::Json => print_json(&hits)?,
        OutputFormat::Text => print_hits(&hits),
    }
    Ok(())
}

async fn cmd_facets(storefront: &Storefront, item_group: Option<String>, format: OutputFormat) -> anyhow::Result<()> {
    let mut form = Map::new();
    if let Some(group) = item_group {
        form.insert("item_group".to_string(), Value::String(group));
    }
    let context: ListingPageContext = storefront.listing_page_context(&form).await?;

    match format {
        OutputFormat::Json => print_json(&context)?,
        OutputFormat::Text => {
            if context.field_filters.is_empty() && context.attribute_filters.is_empty() {
                println!("No facets.");
            }
            for facet in &context.field_filters {
                if facet.values.is_empty() {
                    println!("{}", facet.field.label);
                } else {
                    println!("{}: {}", facet.field.label, facet.values.join(", "));
                }
            }
            for facet in &context.attribute_filters {
                println!("{}: {}", facet.name, facet.values.join(", "));
            }
            println!("Page length: {}", context.page_length);
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, path: Option<&Path>) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(path)?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Get { key } => {
            let config = load_config(path)?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = match path {
                Some(path) if path.exists() => Config::load_from(path)?,
                Some(_) => Config::default(),
                None => Config::load()?,
            };
            config.set(&key, &value)?;
            match path {
                Some(path) => config.save_to(path)?,
                None => config.save()?,
            }
            println!("Set {} = {}", key, value);
        }
        ConfigAction::Path => {
            let path = match path {
                Some(path) => path.to_path_buf(),
                None => Config::config_path()?,
            };
            println!("{}", path.display());
        }
    }
    Ok(())
}
