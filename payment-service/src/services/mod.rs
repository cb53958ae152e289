pub mod database;
pub mod gateway;
pub mod metrics;
pub mod orders;

pub use database::Database;
pub use gateway::CheckoutClient;
pub use metrics::{get_metrics, init_metrics};
pub use orders::OrdersClient;
