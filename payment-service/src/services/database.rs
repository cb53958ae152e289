//! Database service for payment-service.

use crate::models::{CreatePayment, Payment, PaymentStatus};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "payment_id, order_id, customer_id, tailor_id, amount, \
     payment_type, status, refunded_amount, provider_session_id, created_utc, updated_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "payment-service"))]
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

    /// Insert a new pending payment.
    #[instrument(skip(self, input), fields(order_id = %input.order_id))]
    pub async fn create_payment(&self, input: &CreatePayment) -> Result<Payment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_payment"])
            .start_timer();

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (payment_id, order_id, customer_id, tailor_id, amount, payment_type, provider_session_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(input.order_id)
        .bind(input.customer_id)
        .bind(input.tailor_id)
        .bind(input.amount)
        .bind(&input.payment_type)
        .bind(&input.provider_session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create payment: {}", e)))?;

        timer.observe_duration();
        info!(payment_id = %payment.payment_id, order_id = %payment.order_id, "Payment created");

        Ok(payment)
    }

    /// Get a payment by ID.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn get_payment(&self, payment_id: Uuid) -> Result<Option<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_payment"])
            .start_timer();

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE payment_id = $1"
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch payment: {}", e)))?;

        timer.observe_duration();
        Ok(payment)
    }

    /// Get a payment by gateway session ID.
    #[instrument(skip(self, session_id))]
    pub async fn get_payment_by_session(
        &self,
        session_id: &str,
    ) -> Result<Option<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_payment_by_session"])
            .start_timer();

        let payment = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE provider_session_id = $1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch payment: {}", e)))?;

        timer.observe_duration();
        Ok(payment)
    }

    /// Settle a payment identified by its gateway session to a terminal
    /// status. Only pending rows are touched, so replayed webhook deliveries
    /// and the synchronous success path cannot fight each other; a replay
    /// returns the already-settled row unchanged.
    #[instrument(skip(self, session_id), fields(status = %status))]
    pub async fn settle_payment_by_session(
        &self,
        session_id: &str,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["settle_payment_by_session"])
            .start_timer();

        let settled = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = $1, updated_utc = now()
            WHERE provider_session_id = $2 AND status = 'pending'
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(status.as_str())
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to settle payment: {}", e)))?;

        let payment = match settled {
            Some(payment) => {
                info!(
                    payment_id = %payment.payment_id,
                    order_id = %payment.order_id,
                    status = %payment.status,
                    "Payment settled"
                );
                Some(payment)
            }
            // Already settled or unknown session; return whatever exists.
            None => self.get_payment_by_session(session_id).await?,
        };

        timer.observe_duration();
        Ok(payment)
    }

    /// List an order's payments, newest first.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn list_payments_for_order(&self, order_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_payments_for_order"])
            .start_timer();

        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 ORDER BY created_utc DESC"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list payments: {}", e)))?;

        timer.observe_duration();
        Ok(payments)
    }

    /// Whether the order has at least one completed payment.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn order_is_paid(&self, order_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["order_is_paid"])
            .start_timer();

        let paid: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM payments WHERE order_id = $1 AND status = 'completed')",
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to check paid status: {}", e))
        })?;

        timer.observe_duration();
        Ok(paid)
    }
}
