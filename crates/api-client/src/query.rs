//! PrestaShop webservice query builder
//!
//! The webservice takes its filter, sort and paging DSL as plain query
//! parameters:
//!
//! | Parameter | Example |
//! |-----------|---------|
//! | `display` | `full` |
//! | `filter[field]` | `[42]`, `%[ibupro]%` |
//! | `sort` | `[price_ASC]` |
//! | `limit` | `20,10` (offset, count) |
//!
//! `output_format=JSON` is appended by the client on every request.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page size used when a page is requested without an explicit limit
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Ordered list of query parameters for one webservice call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiQuery {
    pairs: Vec<(String, String)>,
}

impl ApiQuery {
    /// Empty query
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query requesting every field of each record (`display=full`)
    #[must_use]
    pub fn full() -> Self {
        Self::new().param("display", "full")
    }

    /// Restrict the returned fields, e.g. `display=[id,name]`
    #[must_use]
    pub fn display(self, fields: &[&str]) -> Self {
        let list = fields.join(",");
        self.param("display", format!("[{list}]"))
    }

    /// Exact match filter: `filter[field]=[value]`
    #[must_use]
    pub fn filter(self, field: &str, value: impl fmt::Display) -> Self {
        self.param(format!("filter[{field}]"), format!("[{value}]"))
    }

    /// Substring filter: `filter[field]=%[term]%`
    #[must_use]
    pub fn filter_like(self, field: &str, term: &str) -> Self {
        self.param(format!("filter[{field}]"), format!("%[{term}]%"))
    }

    /// Sort order: `sort=[field_DIRECTION]`
    #[must_use]
    pub fn sort(self, sort: &Sort) -> Self {
        self.param("sort", sort.to_param())
    }

    /// Offset/count window: `limit=offset,count`
    #[must_use]
    pub fn limit(self, offset: u32, count: u32) -> Self {
        if offset == 0 {
            self.param("limit", count.to_string())
        } else {
            self.param("limit", format!("{offset},{count}"))
        }
    }

    /// 1-based page of `per_page` records
    #[must_use]
    pub fn page(self, page: u32, per_page: u32) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.limit(offset, per_page)
    }

    /// Append an arbitrary parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Parameters in insertion order
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Value of the first parameter named `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render as a percent-encoded query string
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl SortDirection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort key for list queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Field name as the webservice knows it
    pub field: String,
    /// Direction
    pub direction: SortDirection,
}

impl Sort {
    /// Ascending sort on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Render as the `sort` parameter value
    #[must_use]
    pub fn to_param(&self) -> String {
        format!("[{}_{}]", self.field, self.direction.as_str())
    }
}

impl FromStr for Sort {
    type Err = ApiError;

    /// Accepts `field`, `field_asc`, `field_desc` and the shorthands
    /// `newest` and `oldest`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" => return Err(ApiError::config("sort key cannot be empty")),
            "newest" => return Ok(Self::desc("date_add")),
            "oldest" => return Ok(Self::asc("date_add")),
            _ => {}
        }

        match s.rsplit_once('_') {
            Some((field, dir)) if dir.eq_ignore_ascii_case("asc") && !field.is_empty() => {
                Ok(Self::asc(field))
            }
            Some((field, dir)) if dir.eq_ignore_ascii_case("desc") && !field.is_empty() => {
                Ok(Self::desc(field))
            }
            _ => Ok(Self::asc(s)),
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.field, self.direction.as_str().to_lowercase())
    }
}

/// Product listing parameters
///
/// Serialized into the cache key by the fetch layer, so two equal queries
/// share a cache entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Restrict to a default category
    pub category_id: Option<String>,
    /// Name substring
    pub search: Option<String>,
    /// Sort order
    pub sort: Option<Sort>,
    /// 1-based page
    pub page: Option<u32>,
    /// Page size or maximum number of records
    pub limit: Option<u32>,
    /// Only products flagged active
    #[serde(default)]
    pub active_only: bool,
}

impl ProductQuery {
    /// Create new params with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by category
    #[must_use]
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Filter by name substring
    #[must_use]
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Set sort order
    #[must_use]
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set page
    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set page size
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Only active products
    #[must_use]
    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Translate into webservice parameters
    #[must_use]
    pub fn to_api_query(&self) -> ApiQuery {
        let mut query = ApiQuery::full();

        if let Some(ref category_id) = self.category_id {
            query = query.filter("id_category_default", category_id);
        }
        if let Some(ref term) = self.search {
            let term = term.trim();
            if !term.is_empty() {
                query = query.filter_like("name", term);
            }
        }
        if self.active_only {
            query = query.filter("active", 1);
        }
        if let Some(ref sort) = self.sort {
            query = query.sort(sort);
        }

        apply_window(query, self.page, self.limit)
    }
}

/// Category listing parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQuery {
    /// Restrict to children of a category
    pub parent_id: Option<String>,
    /// Only categories flagged active
    #[serde(default)]
    pub active_only: bool,
    /// Sort order
    pub sort: Option<Sort>,
    /// Maximum number of records
    pub limit: Option<u32>,
}

impl CategoryQuery {
    /// Create new params with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by parent category
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Only active categories
    #[must_use]
    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Set sort order
    #[must_use]
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set maximum number of records
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Translate into webservice parameters
    #[must_use]
    pub fn to_api_query(&self) -> ApiQuery {
        let mut query = ApiQuery::full();

        if let Some(ref parent_id) = self.parent_id {
            query = query.filter("id_parent", parent_id);
        }
        if self.active_only {
            query = query.filter("active", 1);
        }
        if let Some(ref sort) = self.sort {
            query = query.sort(sort);
        }

        apply_window(query, None, self.limit)
    }
}

fn apply_window(query: ApiQuery, page: Option<u32>, limit: Option<u32>) -> ApiQuery {
    match (page, limit) {
        (Some(page), limit) => query.page(page.max(1), limit.unwrap_or(DEFAULT_PAGE_SIZE)),
        (None, Some(limit)) => query.limit(0, limit),
        (None, None) => query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_and_sort_syntax() {
        let query = ApiQuery::full()
            .filter("id_category_default", 3)
            .filter_like("name", "ibupro")
            .sort(&Sort::desc("price"));

        assert_eq!(query.get("display"), Some("full"));
        assert_eq!(query.get("filter[id_category_default]"), Some("[3]"));
        assert_eq!(query.get("filter[name]"), Some("%[ibupro]%"));
        assert_eq!(query.get("sort"), Some("[price_DESC]"));
    }

    #[test]
    fn test_page_window() {
        assert_eq!(ApiQuery::new().page(1, 20).get("limit"), Some("20"));
        assert_eq!(ApiQuery::new().page(3, 10).get("limit"), Some("20,10"));
        assert_eq!(ApiQuery::new().page(0, 10).get("limit"), Some("10"));
    }

    #[test]
    fn test_query_string_is_encoded() {
        let query = ApiQuery::new().filter("name", "crema solar");
        assert_eq!(
            query.to_query_string(),
            "filter%5Bname%5D=%5Bcrema%20solar%5D"
        );
    }

    #[test]
    fn test_sort_from_str() {
        assert_eq!("price_asc".parse::<Sort>().unwrap(), Sort::asc("price"));
        assert_eq!("date_add_DESC".parse::<Sort>().unwrap(), Sort::desc("date_add"));
        assert_eq!("newest".parse::<Sort>().unwrap(), Sort::desc("date_add"));
        assert_eq!("name".parse::<Sort>().unwrap(), Sort::asc("name"));
        assert!("".parse::<Sort>().is_err());
    }

    #[test]
    fn test_product_query() {
        let query = ProductQuery::new()
            .with_category("7")
            .with_search("  vitamina ")
            .with_sort(Sort::asc("price"))
            .with_page(2)
            .to_api_query();

        assert_eq!(query.get("filter[id_category_default]"), Some("[7]"));
        assert_eq!(query.get("filter[name]"), Some("%[vitamina]%"));
        assert_eq!(query.get("sort"), Some("[price_ASC]"));
        assert_eq!(query.get("limit"), Some("20,20"));
        assert_eq!(query.get("filter[active]"), None);
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = ProductQuery::new().with_search("   ").to_api_query();
        assert_eq!(query.get("filter[name]"), None);
    }

    #[test]
    fn test_category_query() {
        let query = CategoryQuery::new()
            .with_parent("2")
            .active_only()
            .with_limit(50)
            .to_api_query();

        assert_eq!(query.get("filter[id_parent]"), Some("[2]"));
        assert_eq!(query.get("filter[active]"), Some("[1]"));
        assert_eq!(query.get("limit"), Some("50"));
    }
}
