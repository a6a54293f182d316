//! Slug codec for SEO-friendly entity URLs
//!
//! Storefront URLs take the form `/<kind>/<slug>-<id>`. The slug part is
//! cosmetic: the numeric suffix is the authoritative identifier and the slug is
//! never validated against the entity it points to.
//!
//! # Example
//!
//! ```rust
//! use farmacia_core::slug::{build_url, extract_id, sanitize, EntityKind};
//!
//! assert_eq!(sanitize("Hello !@# World--123"), "hello-world-123");
//! assert_eq!(
//!     build_url(EntityKind::Category, "456", Some("Medicamentos")),
//!     "/categoria/medicamentos-456"
//! );
//! assert_eq!(extract_id("/categoria/medicamentos-456"), "456");
//! assert_eq!(extract_id("/no-id-here"), "/no-id-here");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Runs of characters that may not appear in a slug
static INVALID_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_-]+").unwrap());

/// Runs of two or more hyphens
static HYPHEN_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// Trailing `-<digits>` of a path segment
static TRAILING_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(\d+)$").unwrap());

/// Kind of entity addressed by a storefront URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A product page (`/producto/...`)
    Product,
    /// A category listing (`/categoria/...`)
    Category,
}

impl EntityKind {
    /// Path segment used by canonical, slugged URLs
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Product => "producto",
            Self::Category => "categoria",
        }
    }

    /// Path segment used by the older, id-only URLs
    #[must_use]
    pub fn legacy_segment(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Category => "categories",
        }
    }

    fn from_segment(segment: &str) -> Option<(Self, bool)> {
        match segment {
            "producto" => Some((Self::Product, false)),
            "categoria" => Some((Self::Category, false)),
            "product" => Some((Self::Product, true)),
            "categories" => Some((Self::Category, true)),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for EntityKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "producto" | "product" | "products" => Ok(Self::Product),
            "categoria" | "category" | "categories" => Ok(Self::Category),
            other => Err(crate::Error::validation(format!(
                "Unknown entity kind: {other}"
            ))
            .with_suggestion("Use 'producto' or 'categoria'")),
        }
    }
}

/// An entity reference parsed out of a storefront URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// What the URL points at
    pub kind: EntityKind,
    /// Authoritative numeric identifier
    pub id: String,
    /// Slug portion, if the URL carried one
    pub slug: Option<String>,
    /// Whether the URL used the legacy id-only form
    pub legacy: bool,
}

/// Turn a display name into a URL-safe slug.
///
/// Lowercases and trims, replaces each run of characters outside
/// `[a-z0-9-_]` with a single hyphen, collapses repeated hyphens and strips
/// hyphens from both ends. Underscores are kept as they are.
#[must_use]
pub fn sanitize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let replaced = INVALID_RUN.replace_all(lowered.trim(), "-");
    let collapsed = HYPHEN_RUN.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}

/// Sanitize and percent-encode a slug for embedding in a URL.
#[must_use]
pub fn encode(input: &str) -> String {
    urlencoding::encode(&sanitize(input)).into_owned()
}

/// Build the canonical URL for an entity.
///
/// With a slug source the result is `/<kind>/<slug>-<id>`; without one (or
/// when the source sanitizes to nothing) it is `/<kind>/<id>`.
#[must_use]
pub fn build_url(kind: EntityKind, id: &str, slug_source: Option<&str>) -> String {
    match slug_source.map(encode).filter(|s| !s.is_empty()) {
        Some(slug) => format!("/{}/{slug}-{id}", kind.path_segment()),
        None => format!("/{}/{id}", kind.path_segment()),
    }
}

/// Build the legacy id-only URL (`/product/<id>`, `/categories/<id>`).
#[must_use]
pub fn legacy_url(kind: EntityKind, id: &str) -> String {
    format!("/{}/{id}", kind.legacy_segment())
}

/// Extract the numeric id from the final segment of a URL or slug.
///
/// Returns `None` when the segment has no `-<digits>` suffix.
#[must_use]
pub fn try_extract_id(url: &str) -> Option<&str> {
    let segment = last_segment(url);
    TRAILING_ID
        .captures(segment)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Extract the numeric id from a URL, returning the input unchanged when no
/// id suffix is present.
///
/// Callers detect failure by comparing the result with the input.
#[must_use]
pub fn extract_id(url: &str) -> String {
    try_extract_id(url).unwrap_or(url).to_string()
}

/// Parse a canonical or legacy storefront path into an [`EntityRef`].
#[must_use]
pub fn parse_entity_url(url: &str) -> Option<EntityRef> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let mut segments = path.trim_matches('/').split('/');
    let (kind, legacy) = EntityKind::from_segment(segments.next()?)?;
    let tail = segments.next()?;
    if segments.next().is_some() || tail.is_empty() {
        return None;
    }

    if is_numeric_id(tail) {
        return Some(EntityRef {
            kind,
            id: tail.to_string(),
            slug: None,
            legacy,
        });
    }

    if legacy {
        return None;
    }

    let id = try_extract_id(tail)?;
    let slug = &tail[..tail.len() - id.len() - 1];
    Some(EntityRef {
        kind,
        id: id.to_string(),
        slug: Some(slug.to_string()).filter(|s| !s.is_empty()),
        legacy,
    })
}

/// Whether a string is a bare numeric identifier
#[must_use]
pub fn is_numeric_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

fn last_segment(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}
