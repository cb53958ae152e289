pub mod revenue;
pub mod transitions;

pub use revenue::{item_commission, item_net_income, net_revenue, platform_fee_rate};
pub use transitions::{OrderActor, TransitionError, allowed_targets, validate_transition};
