use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::TokenClaims;
use crate::domain::aggregates::{AccountError, CustomerInvoice, InvoiceStatus, OrderStatus, SalesOrder, StockChange};
use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::ports::{OrderFilter, OrderTransition};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub async fn my_orders(state: &AppState, claims: &TokenClaims) -> AppResult<Vec<SalesOrder>> {
    let customer_id = claims.contact.ok_or(AccountError::NoContact)?;
    Ok(state.store.orders(OrderFilter { customer_id: Some(customer_id), status: None }).await?)
}

/// One of the caller's own orders; someone else's order is reported as missing.
pub async fn my_order(state: &AppState, claims: &TokenClaims, id: Uuid) -> AppResult<SalesOrder> {
    state.store.order(id).await?
        .filter(|o| Some(o.customer_id) == claims.contact)
        .ok_or_else(|| AppError::not_found("Order"))
}

pub async fn my_invoices(state: &AppState, claims: &TokenClaims) -> AppResult<Vec<CustomerInvoice>> {
    let customer_id = claims.contact.ok_or(AccountError::NoContact)?;
    Ok(state.store.invoices(Some(customer_id)).await?)
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<Uuid>,
}

pub async fn all_orders(state: &AppState, q: OrderListQuery) -> AppResult<Vec<SalesOrder>> {
    Ok(state.store.orders(OrderFilter { customer_id: q.customer_id, status: q.status }).await?)
}

pub async fn all_invoices(state: &AppState, customer_id: Option<Uuid>) -> AppResult<Vec<CustomerInvoice>> {
    Ok(state.store.invoices(customer_id).await?)
}

#[derive(Debug, Deserialize, Validate)]
pub struct StatusUpdate {
    pub order_status: OrderStatus,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

/// Moves an order along its lifecycle. Cancelling returns held stock and voids the unpaid invoice.
pub async fn update_status(state: &AppState, id: Uuid, req: StatusUpdate, by: Uuid) -> AppResult<SalesOrder> {
    let mut order = state.store.order(id).await?.ok_or_else(|| AppError::not_found("Order"))?;
    let held_stock = order.holds_stock();
    let previous = order.transition(req.order_status, Some(by), req.note)?;

    let cancelled = order.order_status == OrderStatus::Cancelled;
    let mut stock = Vec::new();
    let mut invoice = None;
    if cancelled {
        if held_stock {
            stock = order.lines.iter()
                .map(|l| StockChange::sale_return(l.product_id, l.quantity, order.id, Some(by)))
                .collect();
        }
        if let Some(mut inv) = state.store.invoice_for_order(order.id).await? {
            if inv.invoice_status != InvoiceStatus::Cancelled {
                inv.cancel()?;
                invoice = Some(inv);
            }
        }
    }

    let movements = state.store.save_order_transition(OrderTransition {
        order: order.clone(), expected: previous, invoice, stock,
    }).await?;
    info!(order = %order.so_number, from = previous.as_str(), to = order.order_status.as_str(), "order status changed");

    let now = Utc::now();
    let mut events = vec![DomainEvent::Order(OrderEvent::StatusChanged {
        order_id: order.id, from: previous, to: order.order_status, at: now,
    })];
    if cancelled {
        events.push(DomainEvent::Order(OrderEvent::Cancelled { order_id: order.id, so_number: order.so_number.clone(), at: now }));
    }
    events.extend(movements.iter().map(DomainEvent::from));
    state.publish_all(events).await;
    Ok(order)
}
