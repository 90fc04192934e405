//! Customer-facing handlers: catalog, cart, checkout, own orders, invoices and payments.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{AuthUser, ValidatedJson};
use crate::domain::aggregates::{CartLineKey, CustomerInvoice, Payment, PaymentTerm, Product, SalesOrder};
use crate::error::AppResult;
use crate::services::{
    cart::{self, AddItem, CartQuote, UpdateItem},
    catalog::{self, ProductQuery},
    checkout::{self, CheckoutRequest, CheckoutResponse},
    orders,
    payments::{self, InvoicePayment, PayInvoice},
    pricing::{self, CouponValidation, ValidateCoupon},
    Page,
};
use crate::state::AppState;

pub async fn list_products(State(s): State<AppState>, Query(q): Query<ProductQuery>) -> AppResult<Json<Page<Product>>> {
    Ok(Json(catalog::storefront(&s, q).await?))
}

pub async fn get_product(State(s): State<AppState>, Path(id): Path<Uuid>) -> AppResult<Json<Product>> {
    Ok(Json(catalog::product(&s, id).await?))
}

pub async fn list_payment_terms(State(s): State<AppState>) -> AppResult<Json<Vec<PaymentTerm>>> {
    Ok(Json(pricing::active_terms(&s).await?))
}

pub async fn validate_coupon(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<ValidateCoupon>) -> AppResult<Json<CouponValidation>> {
    Ok(Json(pricing::validate_coupon(&s, r).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct CartParams { pub coupon: Option<String> }

pub async fn get_cart(State(s): State<AppState>, AuthUser(c): AuthUser, Query(p): Query<CartParams>) -> AppResult<Json<CartQuote>> {
    let cart = cart::load(&s, c.sub).await?;
    Ok(Json(cart::quote(&s, &cart, p.coupon.as_deref()).await?))
}

pub async fn add_to_cart(State(s): State<AppState>, AuthUser(c): AuthUser, ValidatedJson(r): ValidatedJson<AddItem>) -> AppResult<(StatusCode, Json<CartQuote>)> {
    Ok((StatusCode::CREATED, Json(cart::add_item(&s, c.sub, r).await?)))
}

pub async fn update_cart_item(State(s): State<AppState>, AuthUser(c): AuthUser, ValidatedJson(r): ValidatedJson<UpdateItem>) -> AppResult<Json<CartQuote>> {
    Ok(Json(cart::update_item(&s, c.sub, r).await?))
}

pub async fn remove_cart_item(State(s): State<AppState>, AuthUser(c): AuthUser, Query(key): Query<CartLineKey>) -> AppResult<Json<CartQuote>> {
    Ok(Json(cart::remove_item(&s, c.sub, key).await?))
}

pub async fn clear_cart(State(s): State<AppState>, AuthUser(c): AuthUser) -> AppResult<StatusCode> {
    cart::clear(&s, c.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn checkout(State(s): State<AppState>, AuthUser(c): AuthUser, ValidatedJson(r): ValidatedJson<CheckoutRequest>) -> AppResult<(StatusCode, Json<CheckoutResponse>)> {
    Ok((StatusCode::CREATED, Json(checkout::checkout(&s, &c, r).await?)))
}

pub async fn my_orders(State(s): State<AppState>, AuthUser(c): AuthUser) -> AppResult<Json<Vec<SalesOrder>>> {
    Ok(Json(orders::my_orders(&s, &c).await?))
}

pub async fn my_order(State(s): State<AppState>, AuthUser(c): AuthUser, Path(id): Path<Uuid>) -> AppResult<Json<SalesOrder>> {
    Ok(Json(orders::my_order(&s, &c, id).await?))
}

pub async fn my_invoices(State(s): State<AppState>, AuthUser(c): AuthUser) -> AppResult<Json<Vec<CustomerInvoice>>> {
    Ok(Json(orders::my_invoices(&s, &c).await?))
}

pub async fn my_payments(State(s): State<AppState>, AuthUser(c): AuthUser) -> AppResult<Json<Vec<Payment>>> {
    Ok(Json(payments::my_payments(&s, &c).await?))
}

pub async fn pay_invoice(State(s): State<AppState>, AuthUser(c): AuthUser, ValidatedJson(r): ValidatedJson<PayInvoice>) -> AppResult<(StatusCode, Json<InvoicePayment>)> {
    Ok((StatusCode::CREATED, Json(payments::pay_invoice(&s, &c, r).await?)))
}
