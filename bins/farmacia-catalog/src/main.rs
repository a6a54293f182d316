//! Farmacia catalog CLI
//!
//! Inspect the PrestaShop catalog through the storefront data layer and work
//! with storefront slugs and URLs offline.

use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::process::ExitCode;

mod commands;
mod config;

use commands::{catalog, slug};

/// Catalog inspection CLI for the Farmacia storefront
#[derive(Parser)]
#[command(name = "farmacia-catalog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Path to a farmacia.toml configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true, env = "FARMACIA_API_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn a display name into a URL-safe slug
    Slug {
        /// Name to sanitize
        text: String,
    },

    /// Build the canonical storefront URL of an entity
    Url {
        /// Entity kind (producto, categoria)
        kind: String,

        /// Numeric id
        id: String,

        /// Display name used for the slug
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Extract the entity id from a storefront URL or slug
    ExtractId {
        /// URL, path or slug
        url: String,
    },

    /// List products
    Products {
        /// Only products in this category
        #[arg(short = 'k', long)]
        category: Option<String>,

        /// Name search term
        #[arg(short, long)]
        search: Option<String>,

        /// Sort key, e.g. price_asc, name_desc, newest
        #[arg(long)]
        sort: Option<String>,

        /// 1-based page
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Show one product by slug, id or storefront URL
    Product {
        /// Slug, id or URL
        slug: String,
    },

    /// List categories
    Categories {
        /// Show the category tree instead of a flat list
        #[arg(short, long)]
        tree: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match config::Settings::load(cli.config.as_deref(), cli.base_url.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            report_error(&e, cli.format);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = farmacia_telemetry::init_with_config(settings.telemetry(cli.verbose)) {
        eprintln!("{} {}", "Warning:".yellow().bold(), e);
    }

    let result = match cli.command {
        Commands::Slug { text } => slug::run_slug(&text, cli.format),
        Commands::Url { kind, id, name } => slug::run_url(&kind, &id, name.as_deref(), cli.format),
        Commands::ExtractId { url } => slug::run_extract(&url, cli.format),

        Commands::Products {
            category,
            search,
            sort,
            page,
            limit,
        } => {
            let options = catalog::ListOptions {
                category,
                search,
                sort,
                page,
                limit,
            };
            catalog::run_products(&settings, options, cli.format).await
        }

        Commands::Product { slug } => catalog::run_product(&settings, &slug, cli.format).await,

        Commands::Categories { tree } => catalog::run_categories(&settings, tree, cli.format).await,
    };

    tracing::debug!(metrics = %farmacia_telemetry::metrics().export_json(), "Run metrics");

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, cli.format);
            ExitCode::FAILURE
        }
    }
}

/// Print a failure to stderr, as a JSON object when `--format json` is set
fn report_error(e: &anyhow::Error, format: OutputFormat) {
    if format == OutputFormat::Text {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        return;
    }

    let error = match e.downcast_ref::<farmacia_core::Error>() {
        Some(err) => serde_json::json!(err.to_report()),
        None => serde_json::json!({ "message": format!("{e:#}") }),
    };
    let body = serde_json::json!({
        "error": error,
        "session_id": farmacia_telemetry::session_id(),
    });
    eprintln!("{body}");
}
