//! ApparelDesk Commerce
//!
//! Storefront and vendor back office for an apparel business.
//!
//! ## Features
//! - Product catalog with storefront filters
//! - Cart, coupons and server-priced checkout
//! - Sales orders, customer invoices and payments with early-payment discounts
//! - Purchase orders, vendor bills and a stock movement ledger
//! - Profit simulation with margin advice

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod services;
pub mod simulation;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;

/// The full application router over `state`.
pub fn app(state: AppState) -> axum::Router {
    api::router(state)
}
