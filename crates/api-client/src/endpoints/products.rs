//! Products API endpoints
//!
//! Maps to the webservice `products` resource:
//! - List products with filters, sorting and pagination
//! - Get a single product by id
//! - Resolve a storefront slug or URL to a product
//! - Products of a category, name search

use crate::client::PrestashopClient;
use crate::error::{ApiError, ApiResult};
use crate::models::Product;
use crate::query::{ApiQuery, ProductQuery};
use crate::transform;
use farmacia_core::slug;
use tracing::debug;

/// Webservice resource name
const RESOURCE: &str = "products";

/// Products API interface
#[derive(Clone)]
pub struct ProductsApi {
    client: PrestashopClient,
}

impl ProductsApi {
    /// Create a new products API interface
    pub(crate) fn new(client: PrestashopClient) -> Self {
        Self { client }
    }

    /// List products with filters and pagination
    ///
    /// GET /products?display=full&filter[...]&sort=[...]&limit=...
    pub async fn list(&self, query: &ProductQuery) -> ApiResult<Vec<Product>> {
        self.fetch(&query.to_api_query()).await
    }

    /// Get a single product by id
    ///
    /// GET /products?display=full&filter[id]=[<id>]
    pub async fn get(&self, id: &str) -> ApiResult<Product> {
        let query = ApiQuery::full().filter("id", id);
        self.fetch(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found("product", id))
    }

    /// Resolve a slug (`ibuprofeno-400mg-123`), a bare id or a storefront
    /// path to a product.
    ///
    /// The id embedded in the slug is authoritative. Only when there is none
    /// is the slug matched against `link_rewrite`.
    pub async fn get_by_slug(&self, slug_or_url: &str) -> ApiResult<Product> {
        if let Some(id) = lookup_id(slug_or_url) {
            return self.get(id).await;
        }

        let slug = last_segment(slug_or_url);
        debug!(slug, "No id in slug, searching by link_rewrite");
        let query = ApiQuery::full().filter("link_rewrite", slug).limit(0, 1);
        self.fetch(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found("product", slug_or_url))
    }

    /// Products whose default category is `category_id`
    pub async fn by_category(&self, category_id: &str, query: &ProductQuery) -> ApiResult<Vec<Product>> {
        self.list(&query.clone().with_category(category_id)).await
    }

    /// Products whose name contains `term`. A blank term matches nothing.
    pub async fn search(&self, term: &str, query: &ProductQuery) -> ApiResult<Vec<Product>> {
        if term.trim().is_empty() {
            return Ok(Vec::new());
        }
        self.list(&query.clone().with_search(term)).await
    }

    async fn fetch(&self, query: &ApiQuery) -> ApiResult<Vec<Product>> {
        let response = self.client.get_json(RESOURCE, query).await?;
        Ok(transform::products_from_response(
            &response,
            &self.client.transform_context(),
        ))
    }
}

/// Id carried by a slug, URL or bare numeric string
pub(crate) fn lookup_id(slug_or_url: &str) -> Option<&str> {
    slug::try_extract_id(slug_or_url.trim()).or_else(|| {
        let last = last_segment(slug_or_url);
        slug::is_numeric_id(last).then_some(last)
    })
}

/// Final path segment, without query or fragment
pub(crate) fn last_segment(slug_or_url: &str) -> &str {
    let path = slug_or_url.trim().split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_id() {
        assert_eq!(lookup_id("ibuprofeno-400mg-123"), Some("123"));
        assert_eq!(lookup_id("/producto/ibuprofeno-400mg-123"), Some("123"));
        assert_eq!(lookup_id("/product/77"), Some("77"));
        assert_eq!(lookup_id("42"), Some("42"));
        assert_eq!(lookup_id("crema-solar"), None);
        assert_eq!(lookup_id(""), None);
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("/producto/crema-solar/"), "crema-solar");
        assert_eq!(last_segment("crema-solar?ref=home"), "crema-solar");
    }
}
