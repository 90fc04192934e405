//! HTTP surface: `/health` plus the JSON API under `/api/v1`.

pub mod accounts;
pub mod extract;
pub mod storefront;
pub mod vendor;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub const SERVICE_NAME: &str = "appareldesk-commerce";

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(accounts::register))
        .route("/auth/vendor-register", post(accounts::register_vendor))
        .route("/auth/login", post(accounts::login))
        .route("/auth/me", get(accounts::me))
        .route("/addresses", get(accounts::list_addresses).post(accounts::create_address))
        .route("/addresses/:id", put(accounts::update_address).delete(accounts::delete_address))
        .route("/products", get(storefront::list_products))
        .route("/products/:id", get(storefront::get_product))
        .route("/pricing/payment-terms", get(storefront::list_payment_terms).post(vendor::create_payment_term))
        .route("/pricing/coupons/validate", post(storefront::validate_coupon))
        .route("/cart", get(storefront::get_cart).delete(storefront::clear_cart))
        .route(
            "/cart/items",
            post(storefront::add_to_cart).put(storefront::update_cart_item).delete(storefront::remove_cart_item),
        )
        .route("/checkout", post(storefront::checkout))
        .route("/orders", get(storefront::my_orders))
        .route("/orders/:id", get(storefront::my_order))
        .route("/invoices", get(storefront::my_invoices))
        .route("/payments", get(storefront::my_payments).post(storefront::pay_invoice))
        .route("/simulate-profit", post(vendor::simulate_profit))
        .nest("/vendor", vendor_routes());

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": SERVICE_NAME})) }))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(vendor::list_products).post(vendor::create_product))
        .route("/products/:id", put(vendor::update_product).delete(vendor::archive_product))
        .route("/products/:id/publish", post(vendor::publish_product))
        .route("/products/:id/unpublish", post(vendor::unpublish_product))
        .route("/orders", get(vendor::list_orders))
        .route("/orders/:id/status", put(vendor::update_order_status))
        .route("/invoices", get(vendor::list_invoices))
        .route("/payments", get(vendor::list_payments))
        .route("/offers", get(vendor::list_offers).post(vendor::create_offer))
        .route("/coupons", get(vendor::list_coupons))
        .route("/coupons/generate", post(vendor::generate_coupons))
        .route("/purchase-orders", get(vendor::list_purchase_orders).post(vendor::create_purchase_order))
        .route("/purchase-orders/:id", get(vendor::get_purchase_order))
        .route("/purchase-orders/:id/confirm", post(vendor::confirm_purchase_order))
        .route("/purchase-orders/:id/receive", post(vendor::receive_purchase_order))
        .route("/purchase-orders/:id/cancel", post(vendor::cancel_purchase_order))
        .route("/purchase-orders/:id/bill", post(vendor::create_bill))
        .route("/bills", get(vendor::list_bills))
        .route("/bills/:id/payments", post(vendor::pay_bill))
        .route("/stock-movements", get(vendor::list_movements))
        .route("/stock-adjustments", post(vendor::adjust_stock))
        .route("/contacts", get(vendor::list_contacts).post(vendor::create_contact))
        .route("/contacts/:id", put(vendor::update_contact))
        .route("/reports/summary", get(vendor::report_summary))
}
