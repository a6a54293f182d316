//! Cached data-fetching resources for the Farmacia storefront
//!
//! A [`Resource`] runs a [`Query`] against the PrestaShop client and keeps
//! the result in a shared [`TtlCache`](farmacia_core::cache::TtlCache):
//!
//! - A load with a fresh cache entry never touches the network
//! - A miss calls the API and writes the result through to the cache
//! - [`Resource::refresh`] bypasses the cache and overwrites the entry
//! - Overlapping loads are ordered by generation; late results are dropped
//! - Empty results and failures are reported as such. Placeholder data is
//!   only shown when the consumer opts in with [`Resource::with_placeholder`]
//!
//! # Example
//!
//! ```rust,no_run
//! use farmacia_api_client::{PrestashopClient, ProductQuery};
//! use farmacia_core::cache::{CacheConfig, TtlCache};
//! use farmacia_fetch::{FetchOutcome, ProductListQuery, Resource};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PrestashopClient::new()?;
//! let cache = Arc::new(TtlCache::new(CacheConfig::default()));
//!
//! let products = Resource::new(ProductListQuery, client, cache);
//! match products.load(ProductQuery::new().with_category("3")).await {
//!     FetchOutcome::Ok(list) => println!("{} products", list.len()),
//!     FetchOutcome::Empty => println!("No products in this category"),
//!     FetchOutcome::Error(e) => eprintln!("{}", e.user_message()),
//!     FetchOutcome::Stale => {}
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod query;
pub mod resource;

pub use query::{
    CategoryListQuery, CategoryTreeQuery, ProductBySlugQuery, ProductListQuery, ProductSearchQuery, Query,
    SearchParams,
};
pub use resource::{FetchOutcome, Resource, ResourceState, View};
