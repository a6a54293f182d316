//! PrestaShop webservice client for the Farmacia storefront
//!
//! This crate talks to the PrestaShop webservice through the storefront's
//! proxy (`/api/prestashop/<resource>`) and maps its raw JSON into the
//! normalized models the rest of the application uses.
//!
//! # Features
//!
//! - **Environment-based configuration**: Load URLs and keys from environment variables
//! - **Retry with exponential backoff**: Automatic retry for transient failures, never for 401
//! - **Query builder**: PrestaShop's `filter[...]`, `sort`, `limit` DSL
//! - **Lenient transformers**: Partial or oddly typed records never fail to map
//! - **Request correlation**: Track requests with unique IDs for debugging
//!
//! # Example
//!
//! ```rust,no_run
//! use farmacia_api_client::{PrestashopClient, ProductQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrestashopClient::new()?;
//!
//!     let products = client
//!         .products()
//!         .list(&ProductQuery::new().with_category("3").with_limit(12))
//!         .await?;
//!     println!("Got {} products", products.len());
//!
//!     let product = client.products().get_by_slug("ibuprofeno-400mg-123").await?;
//!     println!("{} -> {}", product.name, product.href);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod query;
pub mod transform;

pub use client::PrestashopClient;
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ApiResult};
pub use query::{ApiQuery, CategoryQuery, ProductQuery, Sort, SortDirection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::PrestashopClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::{AuthApi, CartApi, CategoriesApi, OrdersApi, PasswordVerifier, ProductsApi};
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::models::{Cart, CartItem, Category, CategoryNode, Customer, Order, Product};
    pub use crate::query::{ApiQuery, CategoryQuery, ProductQuery, Sort};
    pub use crate::transform::TransformContext;
}
