//! Order endpoints

use crate::client::PrestashopClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{NewOrder, Order};
use crate::query::{ApiQuery, Sort};
use crate::transform;
use tracing::info;

/// Webservice resource name
const RESOURCE: &str = "orders";

/// Orders API interface
#[derive(Clone)]
pub struct OrdersApi {
    client: PrestashopClient,
}

impl OrdersApi {
    /// Create a new orders API interface
    pub(crate) fn new(client: PrestashopClient) -> Self {
        Self { client }
    }

    /// Orders of a customer, newest first
    ///
    /// GET /orders?display=full&filter[id_customer]=[<id>]&sort=[date_add_DESC]
    pub async fn list_for_customer(&self, customer_id: &str) -> ApiResult<Vec<Order>> {
        let query = ApiQuery::full()
            .filter("id_customer", customer_id)
            .sort(&Sort::desc("date_add"));
        let response = self.client.get_json(RESOURCE, &query).await?;

        let ctx = self.client.transform_context();
        Ok(transform::records(&response, "orders", "order")
            .into_iter()
            .map(|raw| transform::transform_order(raw, &ctx))
            .collect())
    }

    /// Get an order by id
    pub async fn get(&self, id: &str) -> ApiResult<Order> {
        let query = ApiQuery::full().filter("id", id);
        let response = self.client.get_json(RESOURCE, &query).await?;

        let ctx = self.client.transform_context();
        transform::first_record(&response, "orders", "order")
            .map(|raw| transform::transform_order(raw, &ctx))
            .ok_or_else(|| ApiError::not_found("order", id))
    }

    /// Place an order for a cart
    ///
    /// POST /orders
    pub async fn create(&self, order: &NewOrder) -> ApiResult<Order> {
        if order.cart_id.is_empty() || order.customer_id.is_empty() {
            return Err(ApiError::validation("an order needs a cart and a customer"));
        }

        let response = self
            .client
            .post_json(RESOURCE, &transform::order_to_raw(order))
            .await?;

        let ctx = self.client.transform_context();
        let created = transform::first_record(&response, "orders", "order")
            .map(|raw| transform::transform_order(raw, &ctx))
            .ok_or_else(|| ApiError::UnexpectedResponse("order creation returned no record".into()))?;

        info!(order_id = %created.id, reference = %created.reference, "Order placed");
        Ok(created)
    }
}
