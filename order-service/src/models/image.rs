//! Reference photos attached to an order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderImage {
    pub image_id: Uuid,
    pub order_id: Uuid,
    pub url: String,
    pub uploaded_utc: DateTime<Utc>,
}
