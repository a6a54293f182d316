//! Categories API endpoints

use super::products::{last_segment, lookup_id};
use crate::client::PrestashopClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{Category, CategoryNode};
use crate::query::{ApiQuery, CategoryQuery};
use crate::transform;
use tracing::debug;

/// Webservice resource name
const RESOURCE: &str = "categories";

/// Categories API interface
#[derive(Clone)]
pub struct CategoriesApi {
    client: PrestashopClient,
}

impl CategoriesApi {
    /// Create a new categories API interface
    pub(crate) fn new(client: PrestashopClient) -> Self {
        Self { client }
    }

    /// List categories
    ///
    /// GET /categories?display=full&filter[...]
    pub async fn list(&self, query: &CategoryQuery) -> ApiResult<Vec<Category>> {
        self.fetch(&query.to_api_query()).await
    }

    /// Get a single category by id
    pub async fn get(&self, id: &str) -> ApiResult<Category> {
        let query = ApiQuery::full().filter("id", id);
        self.fetch(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found("category", id))
    }

    /// Resolve a slug, bare id or storefront path to a category
    pub async fn get_by_slug(&self, slug_or_url: &str) -> ApiResult<Category> {
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
            .ok_or_else(|| ApiError::not_found("category", slug_or_url))
    }

    /// Active categories assembled into trees.
    ///
    /// PrestaShop's technical root and home categories are left out, so the
    /// top-level shop categories become the roots.
    pub async fn tree(&self) -> ApiResult<Vec<CategoryNode>> {
        let categories = self.list(&CategoryQuery::new().active_only()).await?;
        let visible = categories
            .into_iter()
            .filter(|c| !c.parent_id.is_empty() && !c.is_root_category)
            .collect();
        Ok(transform::build_category_tree(visible))
    }

    async fn fetch(&self, query: &ApiQuery) -> ApiResult<Vec<Category>> {
        let response = self.client.get_json(RESOURCE, query).await?;
        Ok(transform::categories_from_response(
            &response,
            &self.client.transform_context(),
        ))
    }
}
