//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one webservice resource.
//!
//! ## Mapping to webservice resources
//!
//! | Module | Resource | Description |
//! |--------|----------|-------------|
//! | `products` | `products` | Catalog listing, lookup by id or slug, search |
//! | `categories` | `categories` | Category listing, lookup, tree |
//! | `auth` | `customers` | Login, registration, customer lookup |
//! | `cart` | `carts` | Cart creation and line edits |
//! | `orders` | `orders` | Order history and checkout |

pub mod auth;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;

pub use auth::{AuthApi, PasswordVerifier};
pub use cart::CartApi;
pub use categories::CategoriesApi;
pub use orders::OrdersApi;
pub use products::ProductsApi;
