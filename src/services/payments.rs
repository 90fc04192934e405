//! Customer invoice payments and vendor bill payments

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{positive, today};
use crate::auth::TokenClaims;
use crate::domain::aggregates::{
    AccountError, AllocationTarget, CustomerInvoice, InvoiceStatus, Payment, PaymentMethod, PaymentType, VendorBill,
};
use crate::domain::events::{DomainEvent, InvoiceEvent};
use crate::domain::value_objects::round_money;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct PayInvoice {
    pub invoice_id: Uuid,
    #[validate(custom = "positive")]
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[validate(length(max = 100))]
    pub reference_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoicePayment {
    pub payment: Payment,
    pub invoice: CustomerInvoice,
}

pub async fn pay_invoice(state: &AppState, claims: &TokenClaims, req: PayInvoice) -> AppResult<InvoicePayment> {
    let customer_id = claims.contact.ok_or(AccountError::NoContact)?;
    let mut invoice = state.store.invoice(req.invoice_id).await?
        .filter(|i| i.customer_id == customer_id)
        .ok_or_else(|| AppError::not_found("Invoice"))?;
    let expected_paid = invoice.paid_amount;
    let paid_on = today();
    let settlement = invoice.register_payment(round_money(req.amount), paid_on)?;

    let number = state.store.next_document_number("payment").await?;
    let payment = Payment::settling(
        number, PaymentType::CustomerPayment, customer_id, AllocationTarget::CustomerInvoice(invoice.id),
        req.payment_method, paid_on, &settlement, req.reference_number, Some(claims.sub),
    );
    state.store.record_invoice_payment(&invoice, expected_paid, &payment).await?;
    info!(
        payment = %payment.payment_number, invoice = %invoice.invoice_number, amount = %settlement.allocated,
        discount = %settlement.discount, status = invoice.invoice_status.as_str(), "invoice payment recorded"
    );

    if invoice.invoice_status == InvoiceStatus::Paid {
        state.events.publish(DomainEvent::Invoice(InvoiceEvent::Paid {
            invoice_id: invoice.id, invoice_number: invoice.invoice_number.clone(), payment_id: payment.id, at: Utc::now(),
        })).await;
    }
    Ok(InvoicePayment { payment, invoice })
}

#[derive(Debug, Deserialize, Validate)]
pub struct PayBill {
    #[validate(custom = "positive")]
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[validate(length(max = 100))]
    pub reference_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BillPayment {
    pub payment: Payment,
    pub bill: VendorBill,
}

pub async fn pay_bill(state: &AppState, bill_id: Uuid, req: PayBill, by: Uuid) -> AppResult<BillPayment> {
    let mut bill = state.store.bill(bill_id).await?.ok_or_else(|| AppError::not_found("Vendor bill"))?;
    let expected_paid = bill.paid_amount;
    let settlement = bill.register_payment(round_money(req.amount))?;

    let paid_on = today();
    let number = state.store.next_document_number("payment").await?;
    let payment = Payment::settling(
        number, PaymentType::VendorPayment, bill.vendor_id, AllocationTarget::VendorBill(bill.id),
        req.payment_method, paid_on, &settlement, req.reference_number, Some(by),
    );
    state.store.record_bill_payment(&bill, expected_paid, &payment).await?;
    info!(payment = %payment.payment_number, bill = %bill.bill_number, amount = %settlement.allocated, "bill payment recorded");
    Ok(BillPayment { payment, bill })
}

pub async fn my_payments(state: &AppState, claims: &TokenClaims) -> AppResult<Vec<Payment>> {
    let contact_id = claims.contact.ok_or(AccountError::NoContact)?;
    Ok(state.store.payments(Some(contact_id)).await?)
}

pub async fn all_payments(state: &AppState, contact_id: Option<Uuid>) -> AppResult<Vec<Payment>> {
    Ok(state.store.payments(contact_id).await?)
}
