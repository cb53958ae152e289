//! Order model and status enumeration.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::models::CreateOrderItem;

/// Lifecycle status of an order.
///
/// `Delivered` and `Cancelled` are terminal: no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    PendingPayment,
    Confirmed,
    Processing,
    Shipped,
    ReadyForPickup,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::ReadyForPickup => "ready_for_pickup",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored or requested status string.
    ///
    /// Unknown strings are rejected rather than defaulted: a requested status
    /// the table does not know must surface as a bad request, and a corrupt
    /// row must not silently masquerade as a real state.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "pending_payment" => Some(OrderStatus::PendingPayment),
            "confirmed" => Some(OrderStatus::Confirmed),
            "processing" => Some(OrderStatus::Processing),
            "shipped" => Some(OrderStatus::Shipped),
            "ready_for_pickup" => Some(OrderStatus::ReadyForPickup),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// All statuses, in lifecycle order. Used by the transition tests.
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Pending,
        OrderStatus::PendingPayment,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::ReadyForPickup,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of commerce: a custom tailoring job or a product purchase.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub tailor_id: Uuid,
    pub description: String,
    pub order_type: String,
    pub status: String,
    pub total_price: Decimal,
    pub commission_amount: Decimal,
    pub due_date: Option<NaiveDate>,
    pub version: i32,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Order {
    /// Current status, if the stored string is a known state.
    pub fn current_status(&self) -> Option<OrderStatus> {
        OrderStatus::parse(&self.status)
    }
}

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub customer_id: Uuid,
    pub customer_name: String,
    pub tailor_id: Uuid,
    pub description: String,
    pub order_type: String,
    pub total_price: Decimal,
    pub commission_amount: Decimal,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<CreateOrderItem>,
}
