//! Order lifecycle and revenue reporting service for the tailoring
//! marketplace. Orders move through a fixed status state machine gated by
//! role-based actor checks; revenue figures come from one shared calculator.

pub mod config;
pub mod domain;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
