//! Domain events
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{MovementDirection, MovementType, OrderStatus};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "aggregate", content = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Invoice(InvoiceEvent),
    Stock(StockEvent),
    Coupon(CouponEvent),
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Confirmed { order_id: Uuid, so_number: String, customer_id: Uuid, total: Decimal, at: DateTime<Utc> },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus, at: DateTime<Utc> },
    Cancelled { order_id: Uuid, so_number: String, at: DateTime<Utc> },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvoiceEvent {
    Paid { invoice_id: Uuid, invoice_number: String, payment_id: Uuid, at: DateTime<Utc> },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StockEvent {
    Moved { product_id: Uuid, movement_type: MovementType, direction: MovementDirection, quantity: Decimal, stock_after: Decimal },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponEvent {
    Redeemed { coupon_id: Uuid, order_id: Uuid },
}

impl DomainEvent {
    /// NATS subject, `appareldesk.<aggregate>.<event>`.
    pub fn subject(&self) -> String {
        let (aggregate, event) = match self {
            Self::Order(OrderEvent::Confirmed { .. }) => ("order", "confirmed"),
            Self::Order(OrderEvent::StatusChanged { .. }) => ("order", "status_changed"),
            Self::Order(OrderEvent::Cancelled { .. }) => ("order", "cancelled"),
            Self::Invoice(InvoiceEvent::Paid { .. }) => ("invoice", "paid"),
            Self::Stock(StockEvent::Moved { .. }) => ("stock", "moved"),
            Self::Coupon(CouponEvent::Redeemed { .. }) => ("coupon", "redeemed"),
        };
        format!("appareldesk.{aggregate}.{event}")
    }
}

impl From<&crate::domain::aggregates::StockMovement> for DomainEvent {
    fn from(m: &crate::domain::aggregates::StockMovement) -> Self {
        Self::Stock(StockEvent::Moved {
            product_id: m.product_id, movement_type: m.movement_type, direction: m.direction,
            quantity: m.quantity, stock_after: m.stock_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subjects() {
        let e = DomainEvent::Coupon(CouponEvent::Redeemed { coupon_id: Uuid::now_v7(), order_id: Uuid::now_v7() });
        assert_eq!(e.subject(), "appareldesk.coupon.redeemed");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["aggregate"], "coupon");
        assert_eq!(json["event"]["type"], "redeemed");
    }
}
