pub mod actor;
pub mod metrics;
pub mod security_headers;
pub mod tracing;

pub use actor::{ActorContext, ActorRole};
