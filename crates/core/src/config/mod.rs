//! Configuration loading and schema definitions
//!
//! Settings shared by the API client, the cache, and the CLI.

#![allow(missing_docs)]

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
