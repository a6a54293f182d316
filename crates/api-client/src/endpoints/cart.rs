//! Cart endpoints
//!
//! Line edits are read-modify-write: the cart is fetched, its rows changed
//! locally and the whole record written back with PUT.

use crate::client::PrestashopClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{Cart, CartItem};
use crate::query::ApiQuery;
use crate::transform;
use tracing::debug;

/// Webservice resource name
const RESOURCE: &str = "carts";

/// Currency used for new carts
const DEFAULT_CURRENCY_ID: &str = "1";

/// Cart API interface
#[derive(Clone)]
pub struct CartApi {
    client: PrestashopClient,
}

impl CartApi {
    /// Create a new cart API interface
    pub(crate) fn new(client: PrestashopClient) -> Self {
        Self { client }
    }

    /// Get a cart by id
    pub async fn get(&self, id: &str) -> ApiResult<Cart> {
        let query = ApiQuery::full().filter("id", id);
        let response = self.client.get_json(RESOURCE, &query).await?;

        let ctx = self.client.transform_context();
        transform::first_record(&response, "carts", "cart")
            .map(|raw| transform::transform_cart(raw, &ctx))
            .ok_or_else(|| ApiError::not_found("cart", id))
    }

    /// Create an empty cart for a customer
    ///
    /// POST /carts
    pub async fn create(&self, customer_id: &str) -> ApiResult<Cart> {
        let ctx = self.client.transform_context();
        let cart = Cart {
            id: String::new(),
            customer_id: customer_id.to_string(),
            currency_id: DEFAULT_CURRENCY_ID.to_string(),
            lang_id: ctx.language_id.clone(),
            items: Vec::new(),
        };

        let response = self
            .client
            .post_json(RESOURCE, &transform::cart_to_raw(&cart))
            .await?;

        transform::first_record(&response, "carts", "cart")
            .map(|raw| transform::transform_cart(raw, &ctx))
            .ok_or_else(|| ApiError::UnexpectedResponse("cart creation returned no record".into()))
    }

    /// Add units of a product, merging with an existing line
    pub async fn add_item(&self, cart_id: &str, item: &CartItem) -> ApiResult<Cart> {
        if item.quantity == 0 {
            return Err(ApiError::validation("quantity must be at least 1"));
        }

        let mut cart = self.get(cart_id).await?;
        cart.add(&item.product_id, &item.product_attribute_id, item.quantity);
        self.save(&cart).await
    }

    /// Set the quantity of an existing line; zero removes it
    pub async fn update_quantity(&self, cart_id: &str, item: &CartItem) -> ApiResult<Cart> {
        let mut cart = self.get(cart_id).await?;
        if !cart.set_quantity(&item.product_id, &item.product_attribute_id, item.quantity) {
            return Err(ApiError::not_found("cart item", item.product_id.clone()));
        }
        self.save(&cart).await
    }

    /// Remove a line
    pub async fn remove_item(
        &self,
        cart_id: &str,
        product_id: &str,
        product_attribute_id: &str,
    ) -> ApiResult<Cart> {
        let mut cart = self.get(cart_id).await?;
        if !cart.remove(product_id, product_attribute_id) {
            return Err(ApiError::not_found("cart item", product_id));
        }
        self.save(&cart).await
    }

    /// Write the whole cart back
    ///
    /// PUT /carts/<id>
    async fn save(&self, cart: &Cart) -> ApiResult<Cart> {
        debug!(cart_id = %cart.id, lines = cart.items.len(), "Saving cart");
        let endpoint = format!("{RESOURCE}/{}", cart.id);
        let response = self
            .client
            .put_json(&endpoint, &transform::cart_to_raw(cart))
            .await?;

        // Some proxies answer an update with an empty body
        let ctx = self.client.transform_context();
        Ok(transform::first_record(&response, "carts", "cart")
            .map_or_else(|| cart.clone(), |raw| transform::transform_cart(raw, &ctx)))
    }
}
