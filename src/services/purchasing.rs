//! Purchase orders, goods receipt and vendor bills

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{positive, today};
use crate::domain::aggregates::{
    PurchaseError, PurchaseOrder, PurchaseOrderLine, StockChange, VendorBill,
};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::Percentage;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseLineInput {
    pub product_id: Uuid,
    #[validate(custom = "positive")]
    pub quantity: Decimal,
    /// Defaults to the product's purchase price.
    pub unit_price: Option<Decimal>,
    pub tax_percentage: Option<Percentage>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePurchaseOrder {
    pub vendor_id: Uuid,
    pub order_date: Option<NaiveDate>,
    pub expected_delivery_date: Option<NaiveDate>,
    #[validate]
    pub lines: Vec<PurchaseLineInput>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

pub async fn create(state: &AppState, req: CreatePurchaseOrder, by: Uuid) -> AppResult<PurchaseOrder> {
    let vendor = state.store.contact(req.vendor_id).await?.ok_or_else(|| AppError::not_found("Vendor"))?;
    if !vendor.contact_type.is_vendor() {
        return Err(PurchaseError::NotVendor.into());
    }

    let ids: Vec<Uuid> = req.lines.iter().map(|l| l.product_id).collect();
    let products = state.store.products_by_ids(&ids).await?;
    let mut lines = Vec::with_capacity(req.lines.len());
    for (i, input) in req.lines.into_iter().enumerate() {
        let product = products.iter()
            .find(|p| p.id == input.product_id)
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", input.product_id)))?;
        if input.unit_price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(AppError::Validation("unit_price must not be negative".into()));
        }
        lines.push(PurchaseOrderLine::price(i as i32 + 1, product, input.quantity, input.unit_price, input.tax_percentage));
    }

    let po_number = state.store.next_document_number("purchase_order").await?;
    let po = PurchaseOrder::draft(
        po_number, vendor.id, req.order_date.unwrap_or_else(today), req.expected_delivery_date, lines, req.notes, Some(by),
    )?;
    state.store.insert_purchase_order(&po).await?;
    info!(po = %po.po_number, vendor = %vendor.contact_name, total = %po.total_amount, "purchase order created");
    Ok(po)
}

async fn load(state: &AppState, id: Uuid) -> AppResult<PurchaseOrder> {
    state.store.purchase_order(id).await?.ok_or_else(|| AppError::not_found("Purchase order"))
}

pub async fn get(state: &AppState, id: Uuid) -> AppResult<PurchaseOrder> {
    load(state, id).await
}

pub async fn list(state: &AppState, vendor_id: Option<Uuid>) -> AppResult<Vec<PurchaseOrder>> {
    Ok(state.store.purchase_orders(vendor_id).await?)
}

pub async fn confirm(state: &AppState, id: Uuid, by: Uuid) -> AppResult<PurchaseOrder> {
    let mut po = load(state, id).await?;
    let expected = po.po_status;
    po.confirm(Some(by))?;
    state.store.update_purchase_order(&po, expected).await?;
    info!(po = %po.po_number, "purchase order confirmed");
    Ok(po)
}

pub async fn cancel(state: &AppState, id: Uuid) -> AppResult<PurchaseOrder> {
    let mut po = load(state, id).await?;
    let expected = po.po_status;
    po.cancel()?;
    state.store.update_purchase_order(&po, expected).await?;
    info!(po = %po.po_number, "purchase order cancelled");
    Ok(po)
}

/// Books the ordered quantities into stock and closes the order.
pub async fn receive(state: &AppState, id: Uuid, by: Uuid) -> AppResult<PurchaseOrder> {
    let mut po = load(state, id).await?;
    if let Err(e) = po.receive() {
        warn!(po = %po.po_number, status = po.po_status.as_str(), "receipt rejected");
        return Err(e.into());
    }
    let stock = po.lines.iter()
        .map(|l| StockChange::purchase(l.product_id, l.quantity, po.id, Some(by)))
        .collect();
    let movements = state.store.save_receipt(&po, stock).await?;
    info!(po = %po.po_number, lines = po.lines.len(), "purchase order received");
    state.publish_all(movements.iter().map(DomainEvent::from).collect::<Vec<_>>()).await;
    Ok(po)
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateBill {
    pub invoice_date: Option<NaiveDate>,
    /// Defaults to 30 days after the invoice date.
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 100))]
    pub vendor_reference: Option<String>,
}

pub async fn create_bill(state: &AppState, po_id: Uuid, req: CreateBill, by: Uuid) -> AppResult<VendorBill> {
    let po = load(state, po_id).await?;
    let invoice_date = req.invoice_date.unwrap_or_else(today);
    if req.due_date.is_some_and(|d| d < invoice_date) {
        return Err(AppError::Validation("due_date must not be before invoice_date".into()));
    }
    let bill_number = state.store.next_document_number("vendor_bill").await?;
    let bill = VendorBill::for_purchase_order(bill_number, &po, invoice_date, req.due_date, req.vendor_reference, Some(by))?;
    state.store.insert_bill(&bill).await?;
    info!(bill = %bill.bill_number, po = %po.po_number, total = %bill.total_amount, "vendor bill created");
    Ok(bill)
}

pub async fn bills(state: &AppState, vendor_id: Option<Uuid>) -> AppResult<Vec<VendorBill>> {
    Ok(state.store.bills(vendor_id).await?)
}
