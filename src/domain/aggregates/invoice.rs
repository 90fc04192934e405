//! Customer invoices and the settlement rules shared with vendor bills

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::order::SalesOrder;
use crate::domain::aggregates::pricing::PaymentTerm;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus { #[default] Draft, Confirmed, PartiallyPaid, Paid, Cancelled }

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Confirmed => "confirmed",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "confirmed" => Some(Self::Confirmed),
            "partially_paid" => Some(Self::PartiallyPaid),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_payable(&self) -> bool { matches!(self, Self::Confirmed | Self::PartiallyPaid) }
}

/// Outcome of applying one payment to an open balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub allocated: Decimal,
    /// Early-payment discount written off alongside the payment.
    pub discount: Decimal,
    pub remaining: Decimal,
    pub status: InvoiceStatus,
}

/// Applies `amount` against `remaining`. `early_discount` is the write-off the payer is
/// entitled to if this payment, plus that discount, clears the balance.
pub fn settle(status: InvoiceStatus, remaining: Decimal, amount: Decimal, early_discount: Decimal) -> Result<Settlement, InvoiceError> {
    if !status.is_payable() { return Err(InvoiceError::NotPayable(status)); }
    if amount <= Decimal::ZERO { return Err(InvoiceError::InvalidAmount); }
    if amount > remaining { return Err(InvoiceError::Overpayment { remaining }); }
    let discount = if early_discount > Decimal::ZERO && amount + early_discount >= remaining {
        remaining - amount
    } else {
        Decimal::ZERO
    };
    let left = remaining - amount - discount;
    let status = if left <= Decimal::ZERO { InvoiceStatus::Paid } else { InvoiceStatus::PartiallyPaid };
    Ok(Settlement { allocated: amount, discount, remaining: left.max(Decimal::ZERO), status })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerInvoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub sales_order_id: Uuid,
    pub customer_id: Uuid,
    pub payment_term_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub invoice_status: InvoiceStatus,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub early_payment_discount_applicable: bool,
    pub early_payment_discount_amount: Decimal,
    pub early_payment_deadline: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomerInvoice {
    /// Confirmed invoice for the full order amount, dated `invoice_date`.
    pub fn for_order(invoice_number: String, order: &SalesOrder, term: &PaymentTerm, invoice_date: NaiveDate) -> Self {
        let t = order.totals;
        let deadline = term.early_payment_deadline(invoice_date);
        let early_amount = term.early_payment_discount_on(t.base_amount(), t.tax_amount);
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(), invoice_number, sales_order_id: order.id, customer_id: order.customer_id,
            payment_term_id: term.id, invoice_date, due_date: term.due_date(invoice_date),
            invoice_status: InvoiceStatus::Confirmed,
            subtotal: t.subtotal, discount_amount: t.discount_amount, tax_amount: t.tax_amount,
            delivery_fee: t.delivery_fee, total_amount: t.total_amount,
            paid_amount: Decimal::ZERO, remaining_amount: t.total_amount,
            early_payment_discount_applicable: deadline.is_some() && early_amount > Decimal::ZERO,
            early_payment_discount_amount: early_amount, early_payment_deadline: deadline,
            notes: None, created_by: order.created_by, created_at: now, updated_at: now,
        }
    }

    fn early_discount_on(&self, paid_on: NaiveDate) -> Decimal {
        match self.early_payment_deadline {
            Some(deadline) if self.early_payment_discount_applicable && paid_on <= deadline => self.early_payment_discount_amount,
            _ => Decimal::ZERO,
        }
    }

    pub fn register_payment(&mut self, amount: Decimal, paid_on: NaiveDate) -> Result<Settlement, InvoiceError> {
        let settlement = settle(self.invoice_status, self.remaining_amount, amount, self.early_discount_on(paid_on))?;
        self.paid_amount += settlement.allocated;
        self.remaining_amount = settlement.remaining;
        self.invoice_status = settlement.status;
        self.updated_at = Utc::now();
        Ok(settlement)
    }

    pub fn cancel(&mut self) -> Result<(), InvoiceError> {
        if self.paid_amount > Decimal::ZERO { return Err(InvoiceError::HasPayments); }
        self.invoice_status = InvoiceStatus::Cancelled;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_open(&self) -> bool { !matches!(self.invoice_status, InvoiceStatus::Cancelled | InvoiceStatus::Paid) }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    #[error("Document is {} and cannot take payments", .0.as_str())]
    NotPayable(InvoiceStatus),
    #[error("Payment amount must be greater than zero")]
    InvalidAmount,
    #[error("Payment exceeds the remaining balance of {remaining}")]
    Overpayment { remaining: Decimal },
    #[error("Invoice already has payments and cannot be cancelled")]
    HasPayments,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::tests::placed_order;
    use crate::domain::aggregates::pricing::tests::{day, net_15_with_early_discount};
    use rust_decimal_macros::dec;

    fn invoice() -> CustomerInvoice {
        // total 1900.00, base 1800.00 -> 2% early discount = 36.00
        CustomerInvoice::for_order("INV-000001".into(), &placed_order(), &net_15_with_early_discount(), day("2026-10-17"))
    }

    #[test]
    fn test_invoice_from_order() {
        let inv = invoice();
        assert_eq!(inv.total_amount, dec!(1900.00));
        assert_eq!(inv.remaining_amount, dec!(1900.00));
        assert_eq!(inv.due_date, day("2026-11-01"));
        assert_eq!(inv.early_payment_discount_amount, dec!(36.00));
        assert!(inv.early_payment_discount_applicable);
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut inv = invoice();
        let s = inv.register_payment(dec!(900), day("2026-11-10")).unwrap();
        assert_eq!(s.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(inv.remaining_amount, dec!(1000.00));
        assert_eq!(inv.register_payment(dec!(1000.01), day("2026-11-10")), Err(InvoiceError::Overpayment { remaining: dec!(1000.00) }));
        inv.register_payment(dec!(1000), day("2026-11-10")).unwrap();
        assert_eq!(inv.invoice_status, InvoiceStatus::Paid);
        assert_eq!(inv.register_payment(dec!(1), day("2026-11-10")), Err(InvoiceError::NotPayable(InvoiceStatus::Paid)));
        assert_eq!(inv.cancel(), Err(InvoiceError::HasPayments));
    }

    #[test]
    fn test_early_payment_discount_settles_balance() {
        let mut inv = invoice();
        let s = inv.register_payment(dec!(1864), day("2026-10-20")).unwrap();
        assert_eq!(s.discount, dec!(36.00));
        assert_eq!(inv.invoice_status, InvoiceStatus::Paid);
        assert_eq!(inv.paid_amount, dec!(1864));
        assert_eq!(inv.remaining_amount, Decimal::ZERO);
    }

    #[test]
    fn test_early_discount_not_granted_after_deadline() {
        let mut inv = invoice();
        let s = inv.register_payment(dec!(1864), day("2026-10-25")).unwrap();
        assert_eq!(s.discount, Decimal::ZERO);
        assert_eq!(inv.remaining_amount, dec!(36.00));
        assert_eq!(inv.invoice_status, InvoiceStatus::PartiallyPaid);
    }
}
