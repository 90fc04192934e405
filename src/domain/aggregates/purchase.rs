//! Purchase orders and vendor bills

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::invoice::{settle, InvoiceError, InvoiceStatus, Settlement};
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::{round_money, round_quantity, Percentage};

/// Days a bill stays open when no due date is given.
pub const DEFAULT_BILL_TERM_DAYS: i64 = 30;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus { #[default] Draft, Confirmed, Received, Cancelled }

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::Received => "received",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "confirmed" => Some(Self::Confirmed),
            "received" => Some(Self::Received),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderLine {
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
    pub received_quantity: Decimal,
}

impl PurchaseOrderLine {
    /// Prices a purchase line, defaulting to the product's purchase price and purchase tax.
    pub fn price(line_number: i32, product: &Product, quantity: Decimal, unit_price: Option<Decimal>, tax: Option<Percentage>) -> Self {
        let quantity = round_quantity(quantity);
        let unit_price = unit_price.unwrap_or(product.purchase_price);
        let tax_percentage = tax.unwrap_or(product.purchase_tax_percentage);
        let line_subtotal = round_money(quantity * unit_price);
        let line_tax_amount = tax_percentage.of(line_subtotal);
        Self {
            line_number, product_id: product.id, product_name: product.name.clone(), product_code: product.code.to_string(),
            quantity, unit_price, tax_percentage, line_subtotal, line_tax_amount,
            line_total: line_subtotal + line_tax_amount, received_quantity: Decimal::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub po_number: String,
    pub vendor_id: Uuid,
    pub order_date: NaiveDate,
    pub expected_delivery_date: Option<NaiveDate>,
    pub po_status: PurchaseStatus,
    pub lines: Vec<PurchaseOrderLine>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub confirmed_by: Option<Uuid>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn draft(
        po_number: String, vendor_id: Uuid, order_date: NaiveDate, expected_delivery_date: Option<NaiveDate>,
        lines: Vec<PurchaseOrderLine>, notes: Option<String>, created_by: Option<Uuid>,
    ) -> Result<Self, PurchaseError> {
        if lines.is_empty() { return Err(PurchaseError::NoLines); }
        let subtotal: Decimal = lines.iter().map(|l| l.line_subtotal).sum();
        let tax_amount: Decimal = lines.iter().map(|l| l.line_tax_amount).sum();
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), po_number, vendor_id, order_date, expected_delivery_date,
            po_status: PurchaseStatus::Draft, lines, subtotal, tax_amount, total_amount: subtotal + tax_amount,
            notes, created_by, confirmed_by: None, confirmed_at: None, created_at: now, updated_at: now,
        })
    }

    fn require(&self, action: &'static str, allowed: &[PurchaseStatus]) -> Result<(), PurchaseError> {
        if allowed.contains(&self.po_status) { Ok(()) }
        else { Err(PurchaseError::InvalidStatus { action, status: self.po_status }) }
    }

    pub fn confirm(&mut self, by: Option<Uuid>) -> Result<(), PurchaseError> {
        self.require("confirm", &[PurchaseStatus::Draft])?;
        let now = Utc::now();
        self.po_status = PurchaseStatus::Confirmed;
        self.confirmed_by = by;
        self.confirmed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Marks every line fully received.
    pub fn receive(&mut self) -> Result<(), PurchaseError> {
        self.require("receive", &[PurchaseStatus::Confirmed])?;
        for line in &mut self.lines { line.received_quantity = line.quantity; }
        self.po_status = PurchaseStatus::Received;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), PurchaseError> {
        self.require("cancel", &[PurchaseStatus::Draft, PurchaseStatus::Confirmed])?;
        self.po_status = PurchaseStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VendorBill {
    pub id: Uuid,
    pub bill_number: String,
    pub purchase_order_id: Uuid,
    pub vendor_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub bill_status: InvoiceStatus,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub vendor_reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VendorBill {
    pub fn for_purchase_order(
        bill_number: String, po: &PurchaseOrder, invoice_date: NaiveDate, due_date: Option<NaiveDate>,
        vendor_reference: Option<String>, created_by: Option<Uuid>,
    ) -> Result<Self, PurchaseError> {
        po.require("bill", &[PurchaseStatus::Confirmed, PurchaseStatus::Received])?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), bill_number, purchase_order_id: po.id, vendor_id: po.vendor_id, invoice_date,
            due_date: due_date.unwrap_or(invoice_date + Duration::days(DEFAULT_BILL_TERM_DAYS)),
            bill_status: InvoiceStatus::Confirmed, subtotal: po.subtotal, tax_amount: po.tax_amount,
            total_amount: po.total_amount, paid_amount: Decimal::ZERO, remaining_amount: po.total_amount,
            vendor_reference, notes: None, created_by, created_at: now, updated_at: now,
        })
    }

    pub fn register_payment(&mut self, amount: Decimal) -> Result<Settlement, InvoiceError> {
        let settlement = settle(self.bill_status, self.remaining_amount, amount, Decimal::ZERO)?;
        self.paid_amount += settlement.allocated;
        self.remaining_amount = settlement.remaining;
        self.bill_status = settlement.status;
        self.updated_at = Utc::now();
        Ok(settlement)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("Purchase order needs at least one line")]
    NoLines,
    #[error("Cannot {action} a {} purchase order", status.as_str())]
    InvalidStatus { action: &'static str, status: PurchaseStatus },
    #[error("Contact is not a vendor")]
    NotVendor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::kurta;
    use rust_decimal_macros::dec;

    fn po() -> PurchaseOrder {
        let product = kurta();
        let lines = vec![PurchaseOrderLine::price(1, &product, dec!(10), None, None)];
        PurchaseOrder::draft("PO-000001".into(), Uuid::now_v7(), NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(), None, lines, None, None).unwrap()
    }

    #[test]
    fn test_purchase_lifecycle() {
        let mut po = po();
        assert_eq!(po.total_amount, dec!(6300.00));
        assert!(matches!(po.receive(), Err(PurchaseError::InvalidStatus { action: "receive", .. })));
        po.confirm(None).unwrap();
        po.receive().unwrap();
        assert_eq!(po.lines[0].received_quantity, dec!(10));
        assert!(po.cancel().is_err());
    }

    #[test]
    fn test_bill_requires_confirmed_po() {
        let mut po = po();
        let today = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
        assert!(VendorBill::for_purchase_order("BILL-1".into(), &po, today, None, None, None).is_err());
        po.confirm(None).unwrap();
        let mut bill = VendorBill::for_purchase_order("BILL-1".into(), &po, today, None, Some("V-778".into()), None).unwrap();
        assert_eq!(bill.due_date, NaiveDate::from_ymd_opt(2026, 11, 4).unwrap());
        bill.register_payment(dec!(6300)).unwrap();
        assert_eq!(bill.bill_status, InvoiceStatus::Paid);
    }
}
