pub mod database;
pub mod export;
pub mod metrics;

pub use database::Database;
pub use export::{IncomeStatementRow, income_statement_csv};
pub use metrics::{get_metrics, init_metrics};
