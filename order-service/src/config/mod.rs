use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use service_core::config::Config as CoreConfig;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct OrderConfig {
    pub common: CoreConfig,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub payment_service: PaymentServiceConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PaymentServiceConfig {
    pub url: String,
}

impl OrderConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let port = env::var("ORDER_SERVICE_PORT")
            .unwrap_or_else(|_| "3004".to_string())
            .parse()?;

        let db_url = env::var("ORDER_DATABASE_URL").expect("ORDER_DATABASE_URL must be set");
        let max_connections = env::var("ORDER_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("ORDER_DATABASE_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let payment_service_url =
            env::var("PAYMENT_SERVICE_URL").unwrap_or_else(|_| "http://localhost:3003".to_string());

        Ok(Self {
            common: CoreConfig { port },
            service_name: "order-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: env::var("ORDER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("ORDER_OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url: db_url,
                max_connections,
                min_connections,
            },
            payment_service: PaymentServiceConfig {
                url: payment_service_url,
            },
        })
    }
}
