//! Web-store checkout: prices the order on the server, reserves stock, redeems
//! the coupon and raises the invoice in one atomic write.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{cart, positive, pricing, today};
use crate::auth::TokenClaims;
use crate::domain::aggregates::{
    AccountError, CustomerInvoice, PlaceOrder, ProductError, SalesOrder, SalesOrderLine, ShippingAddress, StockChange,
};
use crate::domain::events::{CouponEvent, DomainEvent, OrderEvent};
use crate::domain::ports::CheckoutRecord;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    #[validate(custom = "positive")]
    pub quantity: Decimal,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub payment_term_id: Uuid,
    pub coupon_code: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    /// A saved address of the customer, used when no inline address is sent.
    pub address_id: Option<Uuid>,
    /// Explicit lines; the stored cart is used when absent.
    #[validate]
    pub items: Option<Vec<CheckoutItem>>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: SalesOrder,
    pub invoice: CustomerInvoice,
}

async fn shipping_address(state: &AppState, contact_id: Uuid, req: &CheckoutRequest) -> AppResult<ShippingAddress> {
    if let Some(address) = &req.shipping_address {
        if address.address_line1.trim().is_empty() || address.city.trim().is_empty() {
            return Err(AppError::Validation("Shipping address needs a street and a city".into()));
        }
        return Ok(address.clone());
    }
    let saved = match req.address_id {
        Some(id) => Some(
            state.store.address(id).await?
                .filter(|a| a.contact_id == contact_id)
                .ok_or_else(|| AppError::not_found("Address"))?,
        ),
        None => state.store.addresses(contact_id).await?.into_iter().find(|a| a.is_default_shipping),
    };
    let a = saved.ok_or_else(|| AppError::Validation("Shipping address is required".into()))?;
    Ok(ShippingAddress {
        address_line1: a.address_line1, address_line2: a.address_line2, city: a.city,
        state: a.state, pincode: a.pincode, country: a.country,
    })
}

struct Wanted {
    product_id: Uuid,
    quantity: Decimal,
    size: Option<String>,
    color: Option<String>,
}

pub async fn checkout(state: &AppState, claims: &TokenClaims, req: CheckoutRequest) -> AppResult<CheckoutResponse> {
    let customer_id = claims.contact.ok_or(AccountError::NoContact)?;
    let term = pricing::active_term(state, req.payment_term_id).await?;
    let order_date = today();
    let coupon = match req.coupon_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(pricing::applied_coupon(state, code, order_date).await?),
        None => None,
    };
    let address = shipping_address(state, customer_id, &req).await?;

    let from_cart = req.items.is_none();
    let wanted: Vec<Wanted> = match req.items {
        Some(items) => items.into_iter()
            .map(|i| Wanted { product_id: i.product_id, quantity: i.quantity, size: i.selected_size, color: i.selected_color })
            .collect(),
        None => cart::load(state, claims.sub).await?.items.into_iter()
            .map(|i| Wanted { product_id: i.product_id, quantity: Decimal::from(i.quantity), size: i.selected_size, color: i.selected_color })
            .collect(),
    };
    if wanted.is_empty() {
        return Err(AppError::BusinessRule("Cart is empty".into()));
    }

    let ids: Vec<Uuid> = wanted.iter().map(|w| w.product_id).collect();
    let products = state.store.products_by_ids(&ids).await?;
    let mut lines = Vec::with_capacity(wanted.len());
    let mut demand: HashMap<Uuid, Decimal> = HashMap::new();
    for (i, w) in wanted.into_iter().enumerate() {
        let product = products.iter()
            .find(|p| p.id == w.product_id && p.is_purchasable())
            .ok_or_else(|| AppError::NotFound(format!("Product {} is not available", w.product_id)))?;
        let line = SalesOrderLine::price(i as i32 + 1, product, w.quantity, w.size, w.color);
        *demand.entry(product.id).or_default() += line.quantity;
        lines.push(line);
    }
    for product in &products {
        let requested = demand.get(&product.id).copied().unwrap_or_default();
        if requested > product.current_stock {
            warn!(code = %product.code, available = %product.current_stock, %requested, "checkout short of stock");
            return Err(ProductError::InsufficientStock {
                code: product.code.to_string(), available: product.current_stock, requested,
            }.into());
        }
    }

    let so_number = state.store.next_document_number("sales_order").await?;
    let order = SalesOrder::place(PlaceOrder {
        so_number,
        customer_id,
        payment_term_id: term.id,
        order_date,
        lines,
        coupon: coupon.as_ref().map(|c| (c.coupon.id, c.percentage())),
        shipping_address: Some(address),
        notes: req.notes,
        placed_by: Some(claims.sub),
    }, &state.config.delivery)?;
    let invoice_number = state.store.next_document_number("customer_invoice").await?;
    let invoice = CustomerInvoice::for_order(invoice_number, &order, &term, order_date);
    let stock = order.lines.iter()
        .map(|l| StockChange::sale(l.product_id, l.quantity, order.id, Some(claims.sub)))
        .collect();

    let movements = state.store.save_checkout(CheckoutRecord {
        order: order.clone(),
        invoice: invoice.clone(),
        coupon_id: order.coupon_id,
        stock,
        clear_cart_of: from_cart.then_some(claims.sub),
    }).await?;
    info!(order = %order.so_number, invoice = %invoice.invoice_number, total = %order.totals.total_amount, "order placed");

    let mut events = vec![DomainEvent::Order(OrderEvent::Confirmed {
        order_id: order.id, so_number: order.so_number.clone(), customer_id, total: order.totals.total_amount, at: Utc::now(),
    })];
    if let Some(coupon_id) = order.coupon_id {
        events.push(DomainEvent::Coupon(CouponEvent::Redeemed { coupon_id, order_id: order.id }));
    }
    events.extend(movements.iter().map(DomainEvent::from));
    state.publish_all(events).await;

    Ok(CheckoutResponse { order, invoice })
}
