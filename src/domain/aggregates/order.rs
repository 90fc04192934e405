//! Sales Order Aggregate

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::contact::DEFAULT_COUNTRY;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::{round_money, round_quantity, Percentage};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus { #[default] Draft, Confirmed, Invoiced, Completed, Cancelled }

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::Invoiced => "invoiced",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "confirmed" => Some(Self::Confirmed),
            "invoiced" => Some(Self::Invoiced),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn can_become(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Draft, Confirmed) | (Confirmed, Invoiced) | (Invoiced, Completed)
                | (Draft, Cancelled) | (Confirmed, Cancelled) | (Invoiced, Cancelled)
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSource { #[default] Backend, Website }

impl OrderSource {
    pub fn as_str(&self) -> &'static str { match self { Self::Backend => "backend", Self::Website => "website" } }
    pub fn parse(s: &str) -> Option<Self> {
        match s { "backend" => Some(Self::Backend), "website" => Some(Self::Website), _ => None }
    }
}

/// Flat delivery charge waived above a subtotal threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    pub free_above: Decimal,
    pub fee: Decimal,
}

impl DeliveryPolicy {
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal > self.free_above { Decimal::ZERO } else { self.fee }
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self { Self { free_above: Decimal::from(200), fee: Decimal::from(20) } }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String { DEFAULT_COUNTRY.to_string() }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderLine {
    pub line_number: i32,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub tax_percentage: Percentage,
    pub line_subtotal: Decimal,
    pub line_tax_amount: Decimal,
    pub line_total: Decimal,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
}

impl SalesOrderLine {
    /// Prices `quantity` of `product` at its current catalog price and tax rate.
    pub fn price(line_number: i32, product: &Product, quantity: Decimal, size: Option<String>, color: Option<String>) -> Self {
        let quantity = round_quantity(quantity);
        let line_subtotal = round_money(quantity * product.sales_price);
        let line_tax_amount = product.sales_tax_percentage.of(line_subtotal);
        Self {
            line_number, product_id: product.id, product_name: product.name.clone(), product_code: product.code.to_string(),
            quantity, unit_price: product.sales_price, tax_percentage: product.sales_tax_percentage,
            line_subtotal, line_tax_amount, line_total: line_subtotal + line_tax_amount,
            selected_size: size, selected_color: color,
        }
    }
}

/// Document totals shared by cart quotes, orders and invoices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
}

impl OrderTotals {
    /// Tax is charged on the undiscounted line subtotals; the coupon comes off the subtotal.
    pub fn compute(lines: &[SalesOrderLine], discount: Percentage, delivery: &DeliveryPolicy) -> Self {
        let subtotal: Decimal = lines.iter().map(|l| l.line_subtotal).sum();
        let tax_amount: Decimal = lines.iter().map(|l| l.line_tax_amount).sum();
        let discount_amount = discount.of(subtotal);
        let delivery_fee = if lines.is_empty() { Decimal::ZERO } else { delivery.fee_for(subtotal) };
        let total_amount = (subtotal - discount_amount + tax_amount + delivery_fee).max(Decimal::ZERO);
        Self { subtotal, discount_amount, tax_amount, delivery_fee, total_amount }
    }

    /// Untaxed, post-discount amount an early-payment discount is based on.
    pub fn base_amount(&self) -> Decimal { self.subtotal - self.discount_amount }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub previous_status: OrderStatus,
    pub new_status: OrderStatus,
    pub changed_by: Option<Uuid>,
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SalesOrder {
    pub id: Uuid,
    pub so_number: String,
    pub customer_id: Uuid,
    pub payment_term_id: Uuid,
    pub order_date: NaiveDate,
    pub order_source: OrderSource,
    pub order_status: OrderStatus,
    pub lines: Vec<SalesOrderLine>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub coupon_id: Option<Uuid>,
    pub applied_discount_percentage: Percentage,
    pub notes: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub status_log: Vec<StatusChange>,
    pub created_by: Option<Uuid>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inputs for a confirmed web-store order.
#[derive(Clone, Debug)]
pub struct PlaceOrder {
    pub so_number: String,
    pub customer_id: Uuid,
    pub payment_term_id: Uuid,
    pub order_date: NaiveDate,
    pub lines: Vec<SalesOrderLine>,
    pub coupon: Option<(Uuid, Percentage)>,
    pub shipping_address: Option<ShippingAddress>,
    pub notes: Option<String>,
    pub placed_by: Option<Uuid>,
}

impl SalesOrder {
    pub fn place(order: PlaceOrder, delivery: &DeliveryPolicy) -> Result<Self, OrderError> {
        if order.lines.is_empty() { return Err(OrderError::NoItems); }
        let discount = order.coupon.map(|(_, pct)| pct).unwrap_or(Percentage::ZERO);
        let totals = OrderTotals::compute(&order.lines, discount, delivery);
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), so_number: order.so_number, customer_id: order.customer_id,
            payment_term_id: order.payment_term_id, order_date: order.order_date,
            order_source: OrderSource::Website, order_status: OrderStatus::Confirmed,
            lines: order.lines, totals, coupon_id: order.coupon.map(|(id, _)| id),
            applied_discount_percentage: discount, notes: order.notes, shipping_address: order.shipping_address,
            status_log: vec![StatusChange {
                previous_status: OrderStatus::Draft, new_status: OrderStatus::Confirmed,
                changed_by: order.placed_by, note: Some("Placed on website".into()), changed_at: now,
            }],
            created_by: order.placed_by, confirmed_at: Some(now), created_at: now, updated_at: now,
        })
    }

    /// Moves the order to `next`, logging the change. Returns the previous status.
    pub fn transition(&mut self, next: OrderStatus, by: Option<Uuid>, note: Option<String>) -> Result<OrderStatus, OrderError> {
        let previous = self.order_status;
        if !previous.can_become(next) { return Err(OrderError::InvalidTransition { from: previous, to: next }); }
        let now = Utc::now();
        self.order_status = next;
        if next == OrderStatus::Confirmed { self.confirmed_at = Some(now); }
        self.status_log.push(StatusChange { previous_status: previous, new_status: next, changed_by: by, note, changed_at: now });
        self.updated_at = now;
        Ok(previous)
    }

    /// Whether the order's quantities are currently withdrawn from stock.
    pub fn holds_stock(&self) -> bool {
        matches!(self.order_status, OrderStatus::Confirmed | OrderStatus::Invoiced)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Cannot move order from {} to {}", from.as_str(), to.as_str())]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}
