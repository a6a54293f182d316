//! Queries a [`Resource`](crate::Resource) can run
//!
//! A query names a cache namespace, knows how to fetch its data through the
//! API client and decides what counts as an empty result.

use farmacia_api_client::models::{Category, CategoryNode, Product};
use farmacia_api_client::{ApiResult, CategoryQuery, PrestashopClient, ProductQuery};
use farmacia_core::cache::cache_key;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

/// A cacheable read against the storefront API
pub trait Query: Send + Sync {
    /// Input that selects the data; serialized into the cache key
    type Params: Serialize + Clone + fmt::Debug + Send + Sync;
    /// Data produced on success
    type Output: Serialize + DeserializeOwned + Clone + Send + Sync;

    /// Cache namespace, e.g. `"products"`
    fn name(&self) -> &'static str;

    /// Fetch fresh data
    fn fetch(
        &self,
        client: &PrestashopClient,
        params: &Self::Params,
    ) -> impl Future<Output = ApiResult<Self::Output>> + Send;

    /// Whether a successful result carries no data
    fn is_empty(&self, output: &Self::Output) -> bool;

    /// Cache key for a set of params
    fn cache_key(&self, params: &Self::Params) -> String {
        cache_key(self.name(), params)
    }
}

/// Product listing
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductListQuery;

impl Query for ProductListQuery {
    type Params = ProductQuery;
    type Output = Vec<Product>;

    fn name(&self) -> &'static str {
        "products"
    }

    async fn fetch(&self, client: &PrestashopClient, params: &ProductQuery) -> ApiResult<Vec<Product>> {
        client.products().list(params).await
    }

    fn is_empty(&self, output: &Vec<Product>) -> bool {
        output.is_empty()
    }
}

/// Single product by slug, id or storefront path
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductBySlugQuery;

impl Query for ProductBySlugQuery {
    type Params = String;
    type Output = Product;

    fn name(&self) -> &'static str {
        "product"
    }

    #[allow(clippy::ptr_arg)]
    async fn fetch(&self, client: &PrestashopClient, slug: &String) -> ApiResult<Product> {
        client.products().get_by_slug(slug).await
    }

    fn is_empty(&self, _output: &Product) -> bool {
        false
    }
}

/// Search parameters: a name term plus listing options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Name fragment to match
    pub term: String,
    /// Category, sort and paging
    #[serde(flatten)]
    pub query: ProductQuery,
}

impl SearchParams {
    /// Search with default listing options
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            query: ProductQuery::default(),
        }
    }
}

/// Product name search
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductSearchQuery;

impl Query for ProductSearchQuery {
    type Params = SearchParams;
    type Output = Vec<Product>;

    fn name(&self) -> &'static str {
        "products:search"
    }

    async fn fetch(&self, client: &PrestashopClient, params: &SearchParams) -> ApiResult<Vec<Product>> {
        client.products().search(&params.term, &params.query).await
    }

    fn is_empty(&self, output: &Vec<Product>) -> bool {
        output.is_empty()
    }
}

/// Flat category listing
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryListQuery;

impl Query for CategoryListQuery {
    type Params = CategoryQuery;
    type Output = Vec<Category>;

    fn name(&self) -> &'static str {
        "categories"
    }

    async fn fetch(&self, client: &PrestashopClient, params: &CategoryQuery) -> ApiResult<Vec<Category>> {
        client.categories().list(params).await
    }

    fn is_empty(&self, output: &Vec<Category>) -> bool {
        output.is_empty()
    }
}

/// Category tree
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryTreeQuery;

impl Query for CategoryTreeQuery {
    type Params = ();
    type Output = Vec<CategoryNode>;

    fn name(&self) -> &'static str {
        "categories:tree"
    }

    async fn fetch(&self, client: &PrestashopClient, _params: &()) -> ApiResult<Vec<CategoryNode>> {
        client.categories().tree().await
    }

    fn is_empty(&self, output: &Vec<CategoryNode>) -> bool {
        output.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_differ_by_params() {
        let query = ProductListQuery;
        let a = query.cache_key(&ProductQuery::new().with_category("3"));
        let b = query.cache_key(&ProductQuery::new().with_category("4"));

        assert!(a.starts_with("products:"));
        assert_ne!(a, b);
        assert_eq!(a, query.cache_key(&ProductQuery::new().with_category("3")));
    }

    #[test]
    fn test_namespaces_are_distinct() {
        let list = ProductListQuery.cache_key(&ProductQuery::new());
        let search = ProductSearchQuery.cache_key(&SearchParams::new(""));
        assert_ne!(list, search);
        assert!(CategoryTreeQuery.cache_key(&()).starts_with("categories:tree:"));
    }
}
