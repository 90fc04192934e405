//! Storage and messaging ports. `infrastructure` provides the adapters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{
    Address, Cart, Contact, ContactType, Coupon, CouponError, CustomerInvoice, DiscountOffer, OrderStatus, Payment,
    PaymentTerm, Product, ProductError, PurchaseOrder, PurchaseStatus, SalesOrder, StockChange, StockMovement, User,
    VendorBill,
};
use crate::domain::events::DomainEvent;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    /// A guarded write found the row changed underneath it.
    #[error("{0} was modified concurrently, please retry")]
    Stale(&'static str),
    #[error(transparent)]
    Stock(#[from] ProductError),
    #[error(transparent)]
    Coupon(#[from] CouponError),
    #[error("Document sequence not configured for {0}")]
    Sequence(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything a checkout writes, committed as one unit.
#[derive(Clone, Debug)]
pub struct CheckoutRecord {
    pub order: SalesOrder,
    pub invoice: CustomerInvoice,
    pub coupon_id: Option<Uuid>,
    pub stock: Vec<StockChange>,
    /// Cart emptied on commit when the order was built from it.
    pub clear_cart_of: Option<Uuid>,
}

/// An order moved from `expected` to its current status, with side effects.
#[derive(Clone, Debug)]
pub struct OrderTransition {
    pub order: SalesOrder,
    pub expected: OrderStatus,
    pub invoice: Option<CustomerInvoice>,
    pub stock: Vec<StockChange>,
}

#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn insert_product(&self, product: &Product) -> StoreResult<()>;
    /// Writes catalog fields. Stock only changes through [`InventoryRepository`].
    async fn update_product(&self, product: &Product) -> StoreResult<()>;
    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>>;
    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>>;
    /// All products, or only storefront-visible ones.
    async fn catalog(&self, published_only: bool) -> StoreResult<Vec<Product>>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn insert_contact(&self, contact: &Contact) -> StoreResult<()>;
    async fn update_contact(&self, contact: &Contact) -> StoreResult<()>;
    async fn contact(&self, id: Uuid) -> StoreResult<Option<Contact>>;
    /// Contacts acting as `kind`; `Both` contacts match either side.
    async fn contacts(&self, kind: Option<ContactType>) -> StoreResult<Vec<Contact>>;
    async fn addresses(&self, contact_id: Uuid) -> StoreResult<Vec<Address>>;
    async fn address(&self, id: Uuid) -> StoreResult<Option<Address>>;
    /// Inserts or replaces the address, clearing the same default flags on the contact's others.
    async fn save_address(&self, address: &Address) -> StoreResult<()>;
    async fn delete_address(&self, contact_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the login and its contact together.
    async fn register(&self, user: &User, contact: &Contact) -> StoreResult<()>;
    async fn user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn touch_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;
}

#[async_trait]
pub trait PricingRepository: Send + Sync {
    async fn insert_payment_term(&self, term: &PaymentTerm) -> StoreResult<()>;
    async fn payment_terms(&self, active_only: bool) -> StoreResult<Vec<PaymentTerm>>;
    async fn payment_term(&self, id: Uuid) -> StoreResult<Option<PaymentTerm>>;
    async fn insert_offer(&self, offer: &DiscountOffer) -> StoreResult<()>;
    async fn offers(&self) -> StoreResult<Vec<DiscountOffer>>;
    async fn offer(&self, id: Uuid) -> StoreResult<Option<DiscountOffer>>;
    async fn insert_coupons(&self, coupons: &[Coupon]) -> StoreResult<()>;
    async fn coupons(&self, offer_id: Option<Uuid>) -> StoreResult<Vec<Coupon>>;
    async fn coupon_by_code(&self, code: &str) -> StoreResult<Option<(Coupon, DiscountOffer)>>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn cart(&self, user_id: Uuid) -> StoreResult<Option<Cart>>;
    async fn save_cart(&self, cart: &Cart) -> StoreResult<()>;
}

#[async_trait]
pub trait SalesRepository: Send + Sync {
    /// Applies stock, redeems the coupon and stores order and invoice, or nothing at all.
    async fn save_checkout(&self, record: CheckoutRecord) -> StoreResult<Vec<StockMovement>>;
    async fn save_order_transition(&self, transition: OrderTransition) -> StoreResult<Vec<StockMovement>>;
    async fn order(&self, id: Uuid) -> StoreResult<Option<SalesOrder>>;
    /// Newest first.
    async fn orders(&self, filter: OrderFilter) -> StoreResult<Vec<SalesOrder>>;
    async fn invoice(&self, id: Uuid) -> StoreResult<Option<CustomerInvoice>>;
    async fn invoice_for_order(&self, order_id: Uuid) -> StoreResult<Option<CustomerInvoice>>;
    /// Newest first.
    async fn invoices(&self, customer_id: Option<Uuid>) -> StoreResult<Vec<CustomerInvoice>>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Stores the updated invoice if its paid amount is still `expected_paid`, plus the payment.
    async fn record_invoice_payment(&self, invoice: &CustomerInvoice, expected_paid: Decimal, payment: &Payment) -> StoreResult<()>;
    async fn record_bill_payment(&self, bill: &VendorBill, expected_paid: Decimal, payment: &Payment) -> StoreResult<()>;
    async fn payments(&self, contact_id: Option<Uuid>) -> StoreResult<Vec<Payment>>;
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn insert_purchase_order(&self, po: &PurchaseOrder) -> StoreResult<()>;
    /// Stores `po` if it was still `expected`.
    async fn update_purchase_order(&self, po: &PurchaseOrder, expected: PurchaseStatus) -> StoreResult<()>;
    /// Marks a confirmed order received and books its stock.
    async fn save_receipt(&self, po: &PurchaseOrder, stock: Vec<StockChange>) -> StoreResult<Vec<StockMovement>>;
    async fn purchase_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>>;
    async fn purchase_orders(&self, vendor_id: Option<Uuid>) -> StoreResult<Vec<PurchaseOrder>>;
    async fn insert_bill(&self, bill: &VendorBill) -> StoreResult<()>;
    async fn bill(&self, id: Uuid) -> StoreResult<Option<VendorBill>>;
    async fn bills(&self, vendor_id: Option<Uuid>) -> StoreResult<Vec<VendorBill>>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn apply_stock_changes(&self, changes: Vec<StockChange>) -> StoreResult<Vec<StockMovement>>;
    /// Newest first.
    async fn movements(&self, product_id: Option<Uuid>) -> StoreResult<Vec<StockMovement>>;
}

#[async_trait]
pub trait SequenceRepository: Send + Sync {
    /// `PREFIX-000042`, atomically advancing the counter.
    async fn next_document_number(&self, document_type: &str) -> StoreResult<String>;
}

/// Every repository the service needs, behind one object.
pub trait Store:
    ProductRepository + ContactRepository + UserRepository + PricingRepository + CartRepository + SalesRepository
    + PaymentRepository + PurchaseRepository + InventoryRepository + SequenceRepository
{
}

impl<T> Store for T where
    T: ProductRepository + ContactRepository + UserRepository + PricingRepository + CartRepository + SalesRepository
        + PaymentRepository + PurchaseRepository + InventoryRepository + SequenceRepository
{
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Fire and forget; failures are logged by the adapter.
    async fn publish(&self, event: DomainEvent);
}

/// Formats a document number, `PREFIX-` plus the zero-padded counter.
pub fn format_document_number(prefix: &str, number: i64, padding: usize) -> String {
    format!("{prefix}-{number:0padding$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_number_format() {
        assert_eq!(format_document_number("SO", 1, 6), "SO-000001");
        assert_eq!(format_document_number("BILL", 1234567, 6), "BILL-1234567");
    }
}
