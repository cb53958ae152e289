//! Database service for order-service.

use crate::models::{CreateOrder, Order, OrderImage, OrderItem, OrderStatus};
use crate::services::export::IncomeStatementRow;
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "order_id, customer_id, customer_name, tailor_id, description, \
     order_type, status, total_price, commission_amount, due_date, version, \
     created_utc, updated_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "order-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Order Operations
    // =========================================================================

    /// Create an order with its line items in one transaction.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id, tailor_id = %input.tailor_id))]
    pub async fn create_order(
        &self,
        input: &CreateOrder,
        initial_status: OrderStatus,
    ) -> Result<Order, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_order"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let order_id = Uuid::new_v4();
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (order_id, customer_id, customer_name, tailor_id, description, order_type, status, total_price, commission_amount, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(order_id)
        .bind(input.customer_id)
        .bind(&input.customer_name)
        .bind(input.tailor_id)
        .bind(&input.description)
        .bind(&input.order_type)
        .bind(initial_status.as_str())
        .bind(input.total_price)
        .bind(input.commission_amount)
        .bind(input.due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create order: {}", e)))?;

        for item in &input.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (item_id, order_id, product_id, description, quantity, unit_price, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.line_total())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create order item: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit order: {}", e))
        })?;

        timer.observe_duration();
        info!(order_id = %order.order_id, status = %order.status, "Order created");

        Ok(order)
    }

    /// Get an order by ID.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_order"])
            .start_timer();

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch order: {}", e)))?;

        timer.observe_duration();
        Ok(order)
    }

    /// List a customer's orders, newest first.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn list_orders_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_orders_for_customer"])
            .start_timer();

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = $1 ORDER BY created_utc DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list orders: {}", e)))?;

        timer.observe_duration();
        Ok(orders)
    }

    /// List a tailor's orders, newest first.
    #[instrument(skip(self), fields(tailor_id = %tailor_id))]
    pub async fn list_orders_for_tailor(&self, tailor_id: Uuid) -> Result<Vec<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_orders_for_tailor"])
            .start_timer();

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tailor_id = $1 ORDER BY created_utc DESC"
        ))
        .bind(tailor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list orders: {}", e)))?;

        timer.observe_duration();
        Ok(orders)
    }

    /// Most recent orders across the marketplace (admin listing).
    #[instrument(skip(self))]
    pub async fn list_recent_orders(&self, limit: i64) -> Result<Vec<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_recent_orders"])
            .start_timer();

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_utc DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list orders: {}", e)))?;

        timer.observe_duration();
        Ok(orders)
    }

    /// Apply a validated status transition as one atomic, version-guarded write.
    ///
    /// Returns `None` when no row matched `(order_id, expected_version)`: the
    /// order either does not exist or was mutated since the caller read it.
    /// There is deliberately no separate check-then-write; the version guard
    /// is what prevents a stale read from silently overwriting a concurrent
    /// update.
    #[instrument(skip(self), fields(order_id = %order_id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        expected_version: i32,
    ) -> Result<Option<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_status"])
            .start_timer();

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = $1, version = version + 1, updated_utc = now()
            WHERE order_id = $2 AND version = $3
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(new_status.as_str())
        .bind(order_id)
        .bind(expected_version)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update status: {}", e)))?;

        timer.observe_duration();

        if let Some(ref order) = order {
            info!(order_id = %order.order_id, status = %order.status, version = order.version, "Order status updated");
        }

        Ok(order)
    }

    /// Get an order's line items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_order_items"])
            .start_timer();

        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT item_id, order_id, product_id, description, quantity, unit_price, line_total \
             FROM order_items WHERE order_id = $1 ORDER BY item_id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch order items: {}", e))
        })?;

        timer.observe_duration();
        Ok(items)
    }

    // =========================================================================
    // Order Image Operations
    // =========================================================================

    /// Attach a reference photo to an order.
    #[instrument(skip(self, url), fields(order_id = %order_id))]
    pub async fn attach_image(&self, order_id: Uuid, url: &str) -> Result<OrderImage, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["attach_image"])
            .start_timer();

        let image = sqlx::query_as::<_, OrderImage>(
            r#"
            INSERT INTO order_images (image_id, order_id, url)
            VALUES ($1, $2, $3)
            RETURNING image_id, order_id, url, uploaded_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to attach image: {}", e)))?;

        timer.observe_duration();
        Ok(image)
    }

    /// List an order's reference photos.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn list_images(&self, order_id: Uuid) -> Result<Vec<OrderImage>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_images"])
            .start_timer();

        let images = sqlx::query_as::<_, OrderImage>(
            "SELECT image_id, order_id, url, uploaded_utc \
             FROM order_images WHERE order_id = $1 ORDER BY uploaded_utc",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list images: {}", e)))?;

        timer.observe_duration();
        Ok(images)
    }

    // =========================================================================
    // Reporting Operations
    // =========================================================================

    /// A tailor's delivered orders, optionally restricted to those delivered
    /// since the given instant (the dashboard's 30-day window).
    #[instrument(skip(self), fields(tailor_id = %tailor_id))]
    pub async fn delivered_orders_for_tailor(
        &self,
        tailor_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Order>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delivered_orders_for_tailor"])
            .start_timer();

        let orders = match since {
            Some(since) => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     WHERE tailor_id = $1 AND status = 'delivered' AND updated_utc >= $2 \
                     ORDER BY updated_utc DESC"
                ))
                .bind(tailor_id)
                .bind(since)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Order>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     WHERE tailor_id = $1 AND status = 'delivered' \
                     ORDER BY updated_utc DESC"
                ))
                .bind(tailor_id)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch delivered orders: {}", e))
        })?;

        timer.observe_duration();
        Ok(orders)
    }

    /// Rows for the income-statement export: one per line item of every
    /// delivered order fulfilled by the tailor.
    #[instrument(skip(self), fields(tailor_id = %tailor_id))]
    pub async fn income_statement_rows(
        &self,
        tailor_id: Uuid,
    ) -> Result<Vec<IncomeStatementRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["income_statement_rows"])
            .start_timer();

        let rows = sqlx::query_as::<_, IncomeStatementRow>(
            r#"
            SELECT o.created_utc AS order_date, o.order_id, o.customer_name,
                   i.description AS product, i.quantity, i.unit_price, i.line_total
            FROM orders o
            JOIN order_items i ON i.order_id = o.order_id
            WHERE o.tailor_id = $1 AND o.status = 'delivered'
            ORDER BY o.created_utc, o.order_id, i.item_id
            "#,
        )
        .bind(tailor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to fetch income statement rows: {}",
                e
            ))
        })?;

        timer.observe_duration();
        Ok(rows)
    }
}
