//! Core utilities for the Farmacia storefront
//!
//! This crate provides the building blocks shared by the API client and the
//! data-fetching layer:
//!
//! - **Slug codec**: URL-safe slugs and canonical `/producto/<slug>-<id>` URLs
//! - **Retry**: async exponential backoff with an injectable retry predicate
//! - **Cache**: process-wide, time-boxed key/value store with lazy expiry
//! - **Clock**: time source abstraction so expiry can be tested deterministically
//! - **Configuration**: TOML-based configuration with defaults
//! - **Error handling**: errors with codes, context, and recovery suggestions
//!
//! # Example
//!
//! ```rust
//! use farmacia_core::slug::{self, EntityKind};
//!
//! let url = slug::build_url(EntityKind::Product, "123", Some("Ibuprofeno 400mg"));
//! assert_eq!(url, "/producto/ibuprofeno-400mg-123");
//! assert_eq!(slug::extract_id(&url), "123");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod retry;
pub mod slug;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{cache_key, CacheConfig, CacheStats, TtlCache};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::{retry, with_retry, RetryConfig, RetryResult, Retryable};
    pub use crate::slug::{build_url, extract_id, sanitize, EntityKind, EntityRef};
}
