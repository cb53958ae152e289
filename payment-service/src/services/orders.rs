//! HTTP client for order-service.
//!
//! The checkout path needs the order's amount and parties; those live in
//! order-service, so this client fetches them with the caller's identity
//! forwarded. Order-service's own party check then applies unchanged.

use rust_decimal::Decimal;
use serde::Deserialize;
use service_core::error::AppError;
use service_core::middleware::ActorContext;
use std::time::Duration;
use uuid::Uuid;

/// The slice of an order the checkout path needs.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderSummary {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub tailor_id: Uuid,
    pub status: String,
    pub total_price: Decimal,
}

#[derive(Clone)]
pub struct OrdersClient {
    client: reqwest::Client,
    base_url: String,
}

impl OrdersClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch an order on behalf of the given actor. A 404 from order-service
    /// is surfaced as `NotFound`, a 403 as `Forbidden`; anything else is a
    /// gateway error.
    pub async fn get_order(
        &self,
        actor: &ActorContext,
        order_id: Uuid,
    ) -> Result<OrderSummary, AppError> {
        let url = format!("{}/orders/{}", self.base_url, order_id);

        let response = self
            .client
            .get(&url)
            .header("X-User-ID", actor.user_id.to_string())
            .header("X-User-Role", actor.role.as_str())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(order_id = %order_id, error = %e, "Order lookup failed");
                AppError::GatewayError("order-service unreachable".to_string())
            })?;

        match response.status() {
            status if status.is_success() => {
                response.json::<OrderSummary>().await.map_err(|e| {
                    tracing::error!(order_id = %order_id, error = %e, "Malformed order response");
                    AppError::GatewayError("malformed order response".to_string())
                })
            }
            reqwest::StatusCode::NOT_FOUND => {
                Err(AppError::NotFound(anyhow::anyhow!("Order not found")))
            }
            reqwest::StatusCode::FORBIDDEN => Err(AppError::Forbidden(anyhow::anyhow!(
                "not a party to this order"
            ))),
            status => {
                tracing::error!(order_id = %order_id, status = %status, "Order lookup rejected");
                Err(AppError::GatewayError(format!(
                    "order-service returned {}",
                    status
                )))
            }
        }
    }
}
