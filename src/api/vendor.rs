//! Vendor dashboard handlers. Every handler takes a [`VendorUser`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{ValidatedJson, VendorUser};
use crate::domain::aggregates::{
    Contact, ContactChanges, ContactType, Coupon, CustomerInvoice, DiscountOffer, Payment, PaymentTerm, Product,
    PurchaseOrder, SalesOrder, StockMovement, VendorBill,
};
use crate::error::AppResult;
use crate::services::{
    accounts::{self, CreateContact},
    catalog::{self, CreateProduct, UpdateProduct, Visibility},
    inventory::{self, StockAdjustment},
    orders::{self, OrderListQuery, StatusUpdate},
    payments::{self, BillPayment, PayBill},
    pricing::{self, CreateOffer, CreatePaymentTerm, GenerateCoupons},
    purchasing::{self, CreateBill, CreatePurchaseOrder},
    reports::{self, ReportQuery, Summary},
};
use crate::simulation::{self, SimulationRequest, SimulationResponse};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CustomerFilter { pub customer_id: Option<Uuid> }

#[derive(Debug, Default, Deserialize)]
pub struct VendorFilter { pub vendor_id: Option<Uuid> }

#[derive(Debug, Default, Deserialize)]
pub struct ContactFilter { pub contact_id: Option<Uuid>, pub contact_type: Option<ContactType> }

#[derive(Debug, Default, Deserialize)]
pub struct OfferFilter { pub offer_id: Option<Uuid> }

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter { pub product_id: Option<Uuid> }

// products

pub async fn list_products(State(s): State<AppState>, _v: VendorUser) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(catalog::vendor_products(&s).await?))
}

pub async fn create_product(State(s): State<AppState>, _v: VendorUser, ValidatedJson(r): ValidatedJson<CreateProduct>) -> AppResult<(StatusCode, Json<Product>)> {
    Ok((StatusCode::CREATED, Json(catalog::create_product(&s, r).await?)))
}

pub async fn update_product(State(s): State<AppState>, _v: VendorUser, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<UpdateProduct>) -> AppResult<Json<Product>> {
    Ok(Json(catalog::update_product(&s, id, r).await?))
}

pub async fn publish_product(State(s): State<AppState>, _v: VendorUser, Path(id): Path<Uuid>) -> AppResult<Json<Product>> {
    Ok(Json(catalog::set_visibility(&s, id, Visibility::Publish).await?))
}

pub async fn unpublish_product(State(s): State<AppState>, _v: VendorUser, Path(id): Path<Uuid>) -> AppResult<Json<Product>> {
    Ok(Json(catalog::set_visibility(&s, id, Visibility::Unpublish).await?))
}

pub async fn archive_product(State(s): State<AppState>, _v: VendorUser, Path(id): Path<Uuid>) -> AppResult<Json<Product>> {
    Ok(Json(catalog::set_visibility(&s, id, Visibility::Archive).await?))
}

// sales

pub async fn list_orders(State(s): State<AppState>, _v: VendorUser, Query(q): Query<OrderListQuery>) -> AppResult<Json<Vec<SalesOrder>>> {
    Ok(Json(orders::all_orders(&s, q).await?))
}

pub async fn update_order_status(State(s): State<AppState>, v: VendorUser, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<StatusUpdate>) -> AppResult<Json<SalesOrder>> {
    Ok(Json(orders::update_status(&s, id, r, v.user.id).await?))
}

pub async fn list_invoices(State(s): State<AppState>, _v: VendorUser, Query(f): Query<CustomerFilter>) -> AppResult<Json<Vec<CustomerInvoice>>> {
    Ok(Json(orders::all_invoices(&s, f.customer_id).await?))
}

pub async fn list_payments(State(s): State<AppState>, _v: VendorUser, Query(f): Query<ContactFilter>) -> AppResult<Json<Vec<Payment>>> {
    Ok(Json(payments::all_payments(&s, f.contact_id).await?))
}

// pricing

pub async fn create_payment_term(State(s): State<AppState>, _v: VendorUser, ValidatedJson(r): ValidatedJson<CreatePaymentTerm>) -> AppResult<(StatusCode, Json<PaymentTerm>)> {
    Ok((StatusCode::CREATED, Json(pricing::create_term(&s, r).await?)))
}

pub async fn list_offers(State(s): State<AppState>, _v: VendorUser) -> AppResult<Json<Vec<DiscountOffer>>> {
    Ok(Json(pricing::offers(&s).await?))
}

pub async fn create_offer(State(s): State<AppState>, v: VendorUser, ValidatedJson(r): ValidatedJson<CreateOffer>) -> AppResult<(StatusCode, Json<DiscountOffer>)> {
    Ok((StatusCode::CREATED, Json(pricing::create_offer(&s, r, v.user.id).await?)))
}

pub async fn list_coupons(State(s): State<AppState>, _v: VendorUser, Query(f): Query<OfferFilter>) -> AppResult<Json<Vec<Coupon>>> {
    Ok(Json(pricing::coupons(&s, f.offer_id).await?))
}

pub async fn generate_coupons(State(s): State<AppState>, _v: VendorUser, ValidatedJson(r): ValidatedJson<GenerateCoupons>) -> AppResult<(StatusCode, Json<Vec<Coupon>>)> {
    Ok((StatusCode::CREATED, Json(pricing::generate_coupons(&s, r).await?)))
}

// purchasing

pub async fn list_purchase_orders(State(s): State<AppState>, _v: VendorUser, Query(f): Query<VendorFilter>) -> AppResult<Json<Vec<PurchaseOrder>>> {
    Ok(Json(purchasing::list(&s, f.vendor_id).await?))
}

pub async fn create_purchase_order(State(s): State<AppState>, v: VendorUser, ValidatedJson(r): ValidatedJson<CreatePurchaseOrder>) -> AppResult<(StatusCode, Json<PurchaseOrder>)> {
    Ok((StatusCode::CREATED, Json(purchasing::create(&s, r, v.user.id).await?)))
}

pub async fn get_purchase_order(State(s): State<AppState>, _v: VendorUser, Path(id): Path<Uuid>) -> AppResult<Json<PurchaseOrder>> {
    Ok(Json(purchasing::get(&s, id).await?))
}

pub async fn confirm_purchase_order(State(s): State<AppState>, v: VendorUser, Path(id): Path<Uuid>) -> AppResult<Json<PurchaseOrder>> {
    Ok(Json(purchasing::confirm(&s, id, v.user.id).await?))
}

pub async fn receive_purchase_order(State(s): State<AppState>, v: VendorUser, Path(id): Path<Uuid>) -> AppResult<Json<PurchaseOrder>> {
    Ok(Json(purchasing::receive(&s, id, v.user.id).await?))
}

pub async fn cancel_purchase_order(State(s): State<AppState>, _v: VendorUser, Path(id): Path<Uuid>) -> AppResult<Json<PurchaseOrder>> {
    Ok(Json(purchasing::cancel(&s, id).await?))
}

pub async fn create_bill(State(s): State<AppState>, v: VendorUser, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<CreateBill>) -> AppResult<(StatusCode, Json<VendorBill>)> {
    Ok((StatusCode::CREATED, Json(purchasing::create_bill(&s, id, r, v.user.id).await?)))
}

pub async fn list_bills(State(s): State<AppState>, _v: VendorUser, Query(f): Query<VendorFilter>) -> AppResult<Json<Vec<VendorBill>>> {
    Ok(Json(purchasing::bills(&s, f.vendor_id).await?))
}

pub async fn pay_bill(State(s): State<AppState>, v: VendorUser, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<PayBill>) -> AppResult<(StatusCode, Json<BillPayment>)> {
    Ok((StatusCode::CREATED, Json(payments::pay_bill(&s, id, r, v.user.id).await?)))
}

// inventory

pub async fn list_movements(State(s): State<AppState>, _v: VendorUser, Query(f): Query<ProductFilter>) -> AppResult<Json<Vec<StockMovement>>> {
    Ok(Json(inventory::movements(&s, f.product_id).await?))
}

pub async fn adjust_stock(State(s): State<AppState>, v: VendorUser, ValidatedJson(r): ValidatedJson<StockAdjustment>) -> AppResult<(StatusCode, Json<StockMovement>)> {
    Ok((StatusCode::CREATED, Json(inventory::adjust(&s, r, v.user.id).await?)))
}

// contacts

pub async fn list_contacts(State(s): State<AppState>, _v: VendorUser, Query(f): Query<ContactFilter>) -> AppResult<Json<Vec<Contact>>> {
    Ok(Json(accounts::contacts(&s, f.contact_type).await?))
}

pub async fn create_contact(State(s): State<AppState>, _v: VendorUser, ValidatedJson(r): ValidatedJson<CreateContact>) -> AppResult<(StatusCode, Json<Contact>)> {
    Ok((StatusCode::CREATED, Json(accounts::create_contact(&s, r).await?)))
}

pub async fn update_contact(State(s): State<AppState>, _v: VendorUser, Path(id): Path<Uuid>, Json(r): Json<ContactChanges>) -> AppResult<Json<Contact>> {
    Ok(Json(accounts::update_contact(&s, id, r).await?))
}

// reports

pub async fn report_summary(State(s): State<AppState>, _v: VendorUser, Query(q): Query<ReportQuery>) -> AppResult<Json<Summary>> {
    Ok(Json(reports::summary(&s, q).await?))
}

pub async fn simulate_profit(State(s): State<AppState>, _v: VendorUser, ValidatedJson(r): ValidatedJson<SimulationRequest>) -> AppResult<Json<SimulationResponse>> {
    Ok(Json(simulation::simulate(&s, r).await?))
}
