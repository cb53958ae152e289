//! Request/response DTOs for the payment HTTP surface.

use crate::models::Payment;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query of `GET /payments/process`.
#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
}

/// Response of `GET /payments/process`: where to send the customer.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub session_id: String,
    pub redirect_url: String,
    pub amount: Decimal,
}

/// Query of `GET /payments/success`.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub tailor_id: Uuid,
    pub amount: Decimal,
    pub payment_type: String,
    pub status: String,
    pub refunded_amount: Decimal,
    pub provider_session_id: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            payment_id: p.payment_id,
            order_id: p.order_id,
            customer_id: p.customer_id,
            tailor_id: p.tailor_id,
            amount: p.amount,
            payment_type: p.payment_type,
            status: p.status,
            refunded_amount: p.refunded_amount,
            provider_session_id: p.provider_session_id,
            created_utc: p.created_utc,
            updated_utc: p.updated_utc,
        }
    }
}

/// Paid/unpaid summary consumed by order-service.
#[derive(Debug, Serialize)]
pub struct OrderPaymentStatusResponse {
    pub order_id: Uuid,
    pub paid: bool,
}
