pub mod payments;

pub use payments::{OrderPaymentStatus, PaymentsClient};
