use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config::Config as CoreConfig;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct PaymentConfig {
    pub common: CoreConfig,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub order_service: OrderServiceConfig,
    #[serde(skip)]
    pub gateway: GatewayConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct OrderServiceConfig {
    pub url: String,
}

/// Checkout gateway credentials and redirect targets.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub api_base_url: String,
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub webhook_secret: Secret<String>,
    pub success_url: String,
    pub cancel_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            key_id: String::new(),
            key_secret: Secret::new(String::new()),
            webhook_secret: Secret::new(String::new()),
            success_url: String::new(),
            cancel_url: String::new(),
        }
    }
}

impl PaymentConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let port = env::var("PAYMENT_SERVICE_PORT")
            .unwrap_or_else(|_| "3003".to_string())
            .parse()?;

        let db_url = env::var("PAYMENT_DATABASE_URL").expect("PAYMENT_DATABASE_URL must be set");
        let max_connections = env::var("PAYMENT_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("PAYMENT_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let order_service_url =
            env::var("ORDER_SERVICE_URL").unwrap_or_else(|_| "http://localhost:3004".to_string());

        let gateway = GatewayConfig {
            api_base_url: env::var("CHECKOUT_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.checkout.example.com/v1".to_string()),
            key_id: env::var("CHECKOUT_KEY_ID").unwrap_or_default(),
            key_secret: Secret::new(env::var("CHECKOUT_KEY_SECRET").unwrap_or_default()),
            webhook_secret: Secret::new(env::var("CHECKOUT_WEBHOOK_SECRET").unwrap_or_default()),
            success_url: env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payments/success".to_string()),
            cancel_url: env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:3000/payments/cancelled".to_string()),
        };

        Ok(Self {
            common: CoreConfig { port },
            service_name: "payment-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: env::var("PAYMENT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("PAYMENT_OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url: db_url,
                max_connections,
                min_connections,
            },
            order_service: OrderServiceConfig {
                url: order_service_url,
            },
            gateway,
        })
    }
}
