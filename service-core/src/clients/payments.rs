//! HTTP client for payment-service.
//!
//! Order-service treats payment confirmation as an opaque boolean owned by
//! payment-service; this client is the only way it asks the question.

use crate::error::AppError;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Paid/unpaid summary for an order, as reported by payment-service.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderPaymentStatus {
    pub order_id: Uuid,
    pub paid: bool,
}

#[derive(Clone)]
pub struct PaymentsClient {
    client: reqwest::Client,
    base_url: String,
}

impl PaymentsClient {
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

    /// Ask payment-service whether the order has a completed payment.
    ///
    /// Single attempt, no retry: a failure is surfaced to the caller as a
    /// gateway error and the operation that needed the answer is rejected.
    pub async fn order_payment_status(
        &self,
        order_id: Uuid,
    ) -> Result<OrderPaymentStatus, AppError> {
        let url = format!("{}/payments/orders/{}/status", self.base_url, order_id);

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(order_id = %order_id, error = %e, "Payment status request failed");
            AppError::GatewayError("payment-service unreachable".to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(order_id = %order_id, status = %status, "Payment status request rejected");
            return Err(AppError::GatewayError(format!(
                "payment-service returned {}",
                status
            )));
        }

        response.json::<OrderPaymentStatus>().await.map_err(|e| {
            tracing::error!(order_id = %order_id, error = %e, "Malformed payment status response");
            AppError::GatewayError("malformed payment status response".to_string())
        })
    }
}
