//! Payments received from customers and paid to vendors

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::invoice::Settlement;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType { CustomerPayment, VendorPayment }

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::CustomerPayment => "customer_payment", Self::VendorPayment => "vendor_payment" }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s { "customer_payment" => Some(Self::CustomerPayment), "vendor_payment" => Some(Self::VendorPayment), _ => None }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod { Cash, CreditCard, DebitCard, BankTransfer, #[default] Upi, Wallet, Other }

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::BankTransfer => "bank_transfer",
            Self::Upi => "upi",
            Self::Wallet => "wallet",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "credit_card" => Some(Self::CreditCard),
            "debit_card" => Some(Self::DebitCard),
            "bank_transfer" => Some(Self::BankTransfer),
            "upi" => Some(Self::Upi),
            "wallet" => Some(Self::Wallet),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus { Pending, #[default] Completed, Failed, Refunded }

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Completed => "completed", Self::Failed => "failed", Self::Refunded => "refunded" }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

/// Document a payment is allocated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AllocationTarget { CustomerInvoice(Uuid), VendorBill(Uuid) }

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub id: Uuid,
    pub target: AllocationTarget,
    pub allocated_amount: Decimal,
    pub allocation_date: NaiveDate,
    pub early_payment_discount_applied: bool,
    pub discount_amount_applied: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub payment_number: String,
    pub payment_type: PaymentType,
    pub contact_id: Uuid,
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub payment_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub allocations: Vec<PaymentAllocation>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// A completed payment fully allocated to a single document.
    pub fn settling(
        payment_number: String, payment_type: PaymentType, contact_id: Uuid, target: AllocationTarget,
        method: PaymentMethod, paid_on: NaiveDate, settlement: &Settlement, reference_number: Option<String>,
        created_by: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(), payment_number, payment_type, contact_id, payment_date: paid_on,
            payment_method: method, payment_amount: settlement.allocated, payment_status: PaymentStatus::Completed,
            reference_number, notes: None,
            allocations: vec![PaymentAllocation {
                id: Uuid::now_v7(), target, allocated_amount: settlement.allocated, allocation_date: paid_on,
                early_payment_discount_applied: settlement.discount > Decimal::ZERO,
                discount_amount_applied: settlement.discount,
            }],
            created_by, created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::invoice::InvoiceStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_allocation_records_early_discount() {
        let settlement = Settlement { allocated: dec!(980), discount: dec!(20), remaining: Decimal::ZERO, status: InvoiceStatus::Paid };
        let invoice = Uuid::now_v7();
        let p = Payment::settling(
            "PAY-000001".into(), PaymentType::CustomerPayment, Uuid::now_v7(), AllocationTarget::CustomerInvoice(invoice),
            PaymentMethod::default(), NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(), &settlement, None, None,
        );
        assert_eq!(p.payment_method, PaymentMethod::Upi);
        assert_eq!(p.payment_amount, dec!(980));
        assert!(p.allocations[0].early_payment_discount_applied);
        assert_eq!(p.allocations[0].target, AllocationTarget::CustomerInvoice(invoice));
    }

    #[test]
    fn test_method_names_round_trip_through_parse() {
        for m in [PaymentMethod::Cash, PaymentMethod::BankTransfer, PaymentMethod::Wallet] {
            assert_eq!(PaymentMethod::parse(m.as_str()), Some(m));
        }
        assert_eq!(PaymentMethod::parse("cheque"), None);
    }
}
