//! Checkout and payment reconciliation service for the tailoring
//! marketplace. Owns the payments ledger; an order counts as paid once at
//! least one of its payments has completed.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::{AppState, Application};
