//! Request/response DTOs for the order HTTP surface.

use crate::domain::revenue;
use crate::models::{Order, OrderImage, OrderItem};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 120))]
    pub customer_name: String,
    pub tailor_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(length(min = 1, max = 60))]
    pub order_type: String,
    pub total_price: Decimal,
    pub commission_amount: Decimal,
    pub due_date: Option<NaiveDate>,
    /// Checkout orders start in `pending_payment`; custom-order requests
    /// negotiated offline start in `pending`.
    #[serde(default)]
    pub require_payment: bool,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub product_id: Option<Uuid>,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Form body of `POST /orders/{id}/update-status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusForm {
    #[serde(rename = "newStatus")]
    pub new_status: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub tailor_id: Uuid,
    pub description: String,
    pub order_type: String,
    pub status: String,
    pub total_price: Decimal,
    pub commission_amount: Decimal,
    pub net_revenue: Decimal,
    pub due_date: Option<NaiveDate>,
    pub version: i32,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let net = revenue::net_revenue(order.order_id, order.total_price, order.commission_amount);
        Self {
            order_id: order.order_id,
            customer_id: order.customer_id,
            customer_name: order.customer_name,
            tailor_id: order.tailor_id,
            description: order.description,
            order_type: order.order_type,
            status: order.status,
            total_price: order.total_price,
            commission_amount: order.commission_amount,
            net_revenue: net,
            due_date: order.due_date,
            version: order.version,
            created_utc: order.created_utc,
            updated_utc: order.updated_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub item_id: Uuid,
    pub product_id: Option<Uuid>,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            item_id: item.item_id,
            product_id: item.product_id,
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachImageRequest {
    #[validate(url)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct OrderImageResponse {
    pub image_id: Uuid,
    pub order_id: Uuid,
    pub url: String,
    pub uploaded_utc: DateTime<Utc>,
}

impl From<OrderImage> for OrderImageResponse {
    fn from(image: OrderImage) -> Self {
        Self {
            image_id: image.image_id,
            order_id: image.order_id,
            url: image.url,
            uploaded_utc: image.uploaded_utc,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RevenueWindowQuery {
    /// Restrict the aggregation to orders delivered in the last N days.
    pub window_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RevenueSummaryResponse {
    pub tailor_id: Uuid,
    pub window_days: Option<i64>,
    pub delivered_orders: usize,
    pub net_revenue: Decimal,
}
