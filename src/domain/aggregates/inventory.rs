//! Stock ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::product::{Product, ProductError};
use crate::domain::value_objects::round_quantity;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType { Purchase, Sale, Adjustment, Return }

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Purchase => "purchase", Self::Sale => "sale", Self::Adjustment => "adjustment", Self::Return => "return" }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(Self::Purchase),
            "sale" => Some(Self::Sale),
            "adjustment" => Some(Self::Adjustment),
            "return" => Some(Self::Return),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection { In, Out }

impl MovementDirection {
    pub fn as_str(&self) -> &'static str { match self { Self::In => "in", Self::Out => "out" } }
    pub fn parse(s: &str) -> Option<Self> { match s { "in" => Some(Self::In), "out" => Some(Self::Out), _ => None } }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType { PurchaseOrder, SalesOrder, Adjustment }

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::PurchaseOrder => "purchase_order", Self::SalesOrder => "sales_order", Self::Adjustment => "adjustment" }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "purchase_order" => Some(Self::PurchaseOrder),
            "sales_order" => Some(Self::SalesOrder),
            "adjustment" => Some(Self::Adjustment),
            _ => None,
        }
    }
}

/// Immutable ledger entry for one stock change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub direction: MovementDirection,
    /// Always positive; `direction` carries the sign.
    pub quantity: Decimal,
    pub reference_type: ReferenceType,
    pub reference_id: Option<Uuid>,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub movement_date: DateTime<Utc>,
}

/// A requested stock change, applied by the store together with its ledger entry.
#[derive(Clone, Debug, PartialEq)]
pub struct StockChange {
    pub product_id: Uuid,
    /// Signed: positive adds stock.
    pub delta: Decimal,
    pub movement_type: MovementType,
    pub reference_type: ReferenceType,
    pub reference_id: Option<Uuid>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
}

impl StockChange {
    pub fn sale(product_id: Uuid, quantity: Decimal, order_id: Uuid, by: Option<Uuid>) -> Self {
        Self {
            product_id, delta: -round_quantity(quantity), movement_type: MovementType::Sale,
            reference_type: ReferenceType::SalesOrder, reference_id: Some(order_id), notes: None, created_by: by,
        }
    }

    pub fn sale_return(product_id: Uuid, quantity: Decimal, order_id: Uuid, by: Option<Uuid>) -> Self {
        Self {
            product_id, delta: round_quantity(quantity), movement_type: MovementType::Return,
            reference_type: ReferenceType::SalesOrder, reference_id: Some(order_id),
            notes: Some("Order cancelled".into()), created_by: by,
        }
    }

    pub fn purchase(product_id: Uuid, quantity: Decimal, po_id: Uuid, by: Option<Uuid>) -> Self {
        Self {
            product_id, delta: round_quantity(quantity), movement_type: MovementType::Purchase,
            reference_type: ReferenceType::PurchaseOrder, reference_id: Some(po_id), notes: None, created_by: by,
        }
    }

    pub fn adjustment(product_id: Uuid, delta: Decimal, notes: Option<String>, by: Option<Uuid>) -> Self {
        Self {
            product_id, delta: round_quantity(delta), movement_type: MovementType::Adjustment,
            reference_type: ReferenceType::Adjustment, reference_id: None, notes, created_by: by,
        }
    }

    pub fn direction(&self) -> MovementDirection {
        if self.delta < Decimal::ZERO { MovementDirection::Out } else { MovementDirection::In }
    }

    /// Ledger entry for a change that moved stock from `before` to `after`.
    pub fn movement(&self, before: Decimal, after: Decimal) -> StockMovement {
        StockMovement {
            id: Uuid::now_v7(), product_id: self.product_id, movement_type: self.movement_type,
            direction: self.direction(), quantity: self.delta.abs(), reference_type: self.reference_type,
            reference_id: self.reference_id, stock_before: before, stock_after: after,
            notes: self.notes.clone(), created_by: self.created_by, movement_date: Utc::now(),
        }
    }

    /// Shifts the product's stock; fails rather than going negative.
    pub fn apply_to(&self, product: &mut Product) -> Result<StockMovement, ProductError> {
        let (before, after) = product.shift_stock(self.delta)?;
        Ok(self.movement(before, after))
    }
}
