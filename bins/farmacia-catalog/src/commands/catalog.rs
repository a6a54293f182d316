//! Catalog commands backed by the PrestaShop webservice

use crate::OutputFormat;
use crate::config::Settings;
use anyhow::{Result, anyhow};
use farmacia_api_client::models::{CategoryNode, Product};
use farmacia_api_client::{CategoryQuery, ProductQuery, Sort};
use farmacia_fetch::{
    CategoryListQuery, CategoryTreeQuery, FetchOutcome, ProductBySlugQuery, ProductListQuery, ProductSearchQuery,
    Resource, SearchParams,
};
use farmacia_telemetry::Timer;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Product listing flags
pub struct ListOptions {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl ListOptions {
    fn to_query(&self) -> Result<ProductQuery> {
        let mut query = ProductQuery::new().with_page(self.page).with_limit(self.limit);
        if let Some(ref category) = self.category {
            query = query.with_category(category.clone());
        }
        if let Some(ref sort) = self.sort {
            query = query.with_sort(sort.parse::<Sort>()?);
        }
        Ok(query)
    }
}

/// List products, optionally filtered by category or name
pub async fn run_products(settings: &Settings, options: ListOptions, format: OutputFormat) -> Result<()> {
    let _timer = Timer::start("catalog.products");
    let query = options.to_query()?;
    let client = settings.client()?;
    let cache = settings.cache();

    let outcome = match options.search {
        Some(term) => {
            let params = SearchParams { term, query };
            Resource::new(ProductSearchQuery, client, cache).load(params).await
        }
        None => Resource::new(ProductListQuery, client, cache).load(query).await,
    };

    let products = settle(outcome)?.unwrap_or_default();

    if format == OutputFormat::Json {
        return print_json(&products);
    }

    print_header(&format!("Products (page {})", options.page));
    if products.is_empty() {
        println!("  {}", "No products found".dimmed());
    }
    for product in &products {
        print_product_line(product);
    }
    println!();
    Ok(())
}

/// Show one product
pub async fn run_product(settings: &Settings, slug: &str, format: OutputFormat) -> Result<()> {
    let resource = Resource::new(ProductBySlugQuery, settings.client()?, settings.cache());
    let product = settle(resource.load(slug.to_string()).await)?
        .ok_or_else(|| anyhow!("No product matches '{slug}'"))?;

    if format == OutputFormat::Json {
        return print_json(&product);
    }

    print_header(&product.name);
    println!("  {:<14} {}", "Id:".dimmed(), product.id);
    println!("  {:<14} {}", "URL:".dimmed(), product.href);
    println!("  {:<14} {}", "Brand:".dimmed(), product.brand);
    println!("  {:<14} {}", "Price:".dimmed(), price_label(&product));
    println!("  {:<14} {}", "Stock:".dimmed(), stock_label(&product));
    if product.requires_prescription {
        println!("  {:<14} {}", "Prescription:".dimmed(), "required".yellow());
    }
    if !product.tags.is_empty() {
        println!("  {:<14} {}", "Tags:".dimmed(), product.tags.join(", "));
    }
    println!("  {:<14} {}", "Image:".dimmed(), product.image);
    if !product.short_description.is_empty() {
        println!();
        println!("  {}", product.short_description);
    }
    println!();
    Ok(())
}

/// List categories, flat or as a tree
pub async fn run_categories(settings: &Settings, tree: bool, format: OutputFormat) -> Result<()> {
    let _timer = Timer::start("catalog.categories");
    let client = settings.client()?;
    let cache = settings.cache();

    if tree {
        let roots = settle(Resource::new(CategoryTreeQuery, client, cache).load(()).await)?.unwrap_or_default();
        if format == OutputFormat::Json {
            return print_json(&roots);
        }
        print_header("Category tree");
        for node in &roots {
            print_node(node, 0);
        }
        println!();
        return Ok(());
    }

    let query = CategoryQuery::new().active_only();
    let categories = settle(Resource::new(CategoryListQuery, client, cache).load(query).await)?.unwrap_or_default();
    if format == OutputFormat::Json {
        return print_json(&categories);
    }

    print_header("Categories");
    for category in &categories {
        println!(
            "  {:>5}  {:<40} {}",
            category.id.cyan(),
            category.name,
            format!("{} products", category.product_count).dimmed()
        );
    }
    println!();
    Ok(())
}

/// Map a load outcome to data, `None` when there is nothing to show
fn settle<T>(outcome: FetchOutcome<T>) -> Result<Option<T>> {
    match outcome {
        FetchOutcome::Ok(data) => Ok(Some(data)),
        FetchOutcome::Empty | FetchOutcome::Stale => Ok(None),
        FetchOutcome::Error(e) => {
            tracing::debug!(error = ?e, "Catalog request failed");
            Err(anyhow!("{}: {e}", e.user_message()))
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_header(title: &str) {
    let rule = "━".repeat(60);
    println!();
    println!("{}", rule.blue());
    println!("  {}", title.blue().bold());
    println!("{}", rule.blue());
    println!();
}

fn print_product_line(product: &Product) {
    let flag = if product.requires_prescription { " Rx" } else { "" };
    println!(
        "  {:>5}  {:<40} {:>10}  {}{}",
        product.id.cyan(),
        product.name,
        price_label(product),
        stock_label(product),
        flag.yellow()
    );
}

fn print_node(node: &CategoryNode, depth: usize) {
    println!(
        "  {}{} {}",
        "  ".repeat(depth),
        node.category.name,
        format!("({})", node.category.id).dimmed()
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn price_label(product: &Product) -> String {
    match product.original_price {
        Some(original) => format!("{:.2} € (was {original:.2} €)", product.price),
        None => format!("{:.2} €", product.price),
    }
}

fn stock_label(product: &Product) -> String {
    if product.in_stock {
        format!("{} in stock", product.stock_quantity).green().to_string()
    } else {
        "out of stock".red().to_string()
    }
}
