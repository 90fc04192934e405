//! In-memory adapter for every repository port.
//!
//! One `RwLock` guards all tables, so each multi-row write stages its changes on
//! clones and commits them under a single write guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::aggregates::{
    AccountError, Address, Cart, Contact, ContactType, Coupon, CustomerInvoice, DiscountOffer, EarlyPayComputation,
    Payment, PaymentTerm, Product, PurchaseOrder, PurchaseStatus, SalesOrder, StockChange, StockMovement, User,
    VendorBill,
};
use crate::domain::ports::{
    format_document_number, CartRepository, CheckoutRecord, ContactRepository, InventoryRepository, OrderFilter,
    OrderTransition, PaymentRepository, PricingRepository, ProductRepository, PurchaseRepository, SalesRepository,
    SequenceRepository, StoreError, StoreResult, UserRepository,
};
use crate::domain::value_objects::Percentage;

/// Document types and prefixes every deployment starts with.
pub const DEFAULT_SEQUENCES: [(&str, &str); 5] = [
    ("sales_order", "SO"),
    ("customer_invoice", "INV"),
    ("payment", "PAY"),
    ("purchase_order", "PO"),
    ("vendor_bill", "BILL"),
];

/// `(name, net_days)` of the payment terms seeded on first start.
pub const DEFAULT_PAYMENT_TERMS: [(&str, i32); 4] =
    [("Immediate Payment", 0), ("Net 15", 15), ("Net 30", 30), ("Net 45", 45)];

struct Sequence {
    prefix: String,
    next_number: i64,
    padding: usize,
}

#[derive(Default)]
struct Tables {
    products: HashMap<Uuid, Product>,
    contacts: HashMap<Uuid, Contact>,
    addresses: HashMap<Uuid, Address>,
    users: HashMap<Uuid, User>,
    payment_terms: HashMap<Uuid, PaymentTerm>,
    offers: HashMap<Uuid, DiscountOffer>,
    coupons: HashMap<Uuid, Coupon>,
    carts: HashMap<Uuid, Cart>,
    orders: HashMap<Uuid, SalesOrder>,
    invoices: HashMap<Uuid, CustomerInvoice>,
    payments: Vec<Payment>,
    purchase_orders: HashMap<Uuid, PurchaseOrder>,
    bills: HashMap<Uuid, VendorBill>,
    movements: Vec<StockMovement>,
    sequences: HashMap<String, Sequence>,
}

impl Tables {
    /// Applies `changes` to copies of the products; nothing is written on error.
    fn stage_stock(&self, changes: &[StockChange]) -> StoreResult<(HashMap<Uuid, Product>, Vec<StockMovement>)> {
        let mut staged: HashMap<Uuid, Product> = HashMap::new();
        let mut movements = Vec::with_capacity(changes.len());
        for change in changes {
            if !staged.contains_key(&change.product_id) {
                let p = self.products.get(&change.product_id).cloned().ok_or(StoreError::NotFound("Product"))?;
                staged.insert(change.product_id, p);
            }
            let product = staged.get_mut(&change.product_id).ok_or(StoreError::NotFound("Product"))?;
            movements.push(change.apply_to(product)?);
        }
        Ok((staged, movements))
    }

    fn commit_stock(&mut self, staged: HashMap<Uuid, Product>, movements: &[StockMovement]) {
        self.products.extend(staged);
        self.movements.extend_from_slice(movements);
    }
}

fn newest_first<T>(mut items: Vec<T>, key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
    items
}

/// Thread-safe store backed by hash maps. Used by tests and DB-less runs.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl Default for MemoryStore {
    fn default() -> Self { Self::new() }
}

impl MemoryStore {
    /// A store with the default document sequences and payment terms.
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for (doc, prefix) in DEFAULT_SEQUENCES {
            tables.sequences.insert(doc.to_string(), Sequence { prefix: prefix.to_string(), next_number: 1, padding: 6 });
        }
        for (name, net_days) in DEFAULT_PAYMENT_TERMS {
            let term = PaymentTerm {
                id: Uuid::now_v7(), term_name: name.to_string(), net_days, early_payment_discount: false,
                discount_percentage: Percentage::ZERO, discount_days: 0,
                early_pay_discount_computation: EarlyPayComputation::BaseAmount, is_active: true,
            };
            tables.payment_terms.insert(term.id, term);
        }
        Self { tables: Arc::new(RwLock::new(tables)) }
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn insert_product(&self, product: &Product) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.products.values().any(|p| p.code == product.code) {
            return Err(StoreError::Conflict(format!("Product code {} already exists", product.code)));
        }
        t.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let stored = t.products.get_mut(&product.id).ok_or(StoreError::NotFound("Product"))?;
        let stock = stored.current_stock;
        *stored = product.clone();
        stored.current_stock = stock;
        Ok(())
    }

    async fn product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn products_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let t = self.tables.read().await;
        Ok(ids.iter().filter_map(|id| t.products.get(id).cloned()).collect())
    }

    async fn catalog(&self, published_only: bool) -> StoreResult<Vec<Product>> {
        let t = self.tables.read().await;
        let products = t.products.values().filter(|p| !published_only || p.is_purchasable()).cloned().collect();
        Ok(newest_first(products, |p| p.created_at))
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn insert_contact(&self, contact: &Contact) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.contacts.values().any(|c| c.email == contact.email) {
            return Err(StoreError::Conflict(AccountError::EmailTaken.to_string()));
        }
        t.contacts.insert(contact.id, contact.clone());
        Ok(())
    }

    async fn update_contact(&self, contact: &Contact) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.contacts.values().any(|c| c.email == contact.email && c.id != contact.id) {
            return Err(StoreError::Conflict(AccountError::EmailTaken.to_string()));
        }
        let stored = t.contacts.get_mut(&contact.id).ok_or(StoreError::NotFound("Contact"))?;
        *stored = contact.clone();
        Ok(())
    }

    async fn contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        Ok(self.tables.read().await.contacts.get(&id).cloned())
    }

    async fn contacts(&self, kind: Option<ContactType>) -> StoreResult<Vec<Contact>> {
        let t = self.tables.read().await;
        let mut contacts: Vec<Contact> = t.contacts.values()
            .filter(|c| match kind {
                Some(ContactType::Customer) => c.contact_type.is_customer(),
                Some(ContactType::Vendor) => c.contact_type.is_vendor(),
                Some(ContactType::Both) => c.contact_type == ContactType::Both,
                None => true,
            })
            .cloned()
            .collect();
        contacts.sort_by(|a, b| a.contact_name.cmp(&b.contact_name));
        Ok(contacts)
    }

    async fn addresses(&self, contact_id: Uuid) -> StoreResult<Vec<Address>> {
        let t = self.tables.read().await;
        let mut addresses: Vec<Address> = t.addresses.values().filter(|a| a.contact_id == contact_id).cloned().collect();
        addresses.sort_by_key(|a| a.created_at);
        Ok(addresses)
    }

    async fn address(&self, id: Uuid) -> StoreResult<Option<Address>> {
        Ok(self.tables.read().await.addresses.get(&id).cloned())
    }

    async fn save_address(&self, address: &Address) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        t.addresses.insert(address.id, address.clone());
        let mut siblings: Vec<Address> = t.addresses.values().filter(|a| a.contact_id == address.contact_id).cloned().collect();
        Address::set_defaults(&mut siblings, address.id);
        for a in siblings {
            t.addresses.insert(a.id, a);
        }
        Ok(())
    }

    async fn delete_address(&self, contact_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let owned = t.addresses.get(&id).is_some_and(|a| a.contact_id == contact_id);
        if owned {
            t.addresses.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn register(&self, user: &User, contact: &Contact) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.users.values().any(|u| u.username.eq_ignore_ascii_case(&user.username)) {
            return Err(StoreError::Conflict(AccountError::UsernameTaken.to_string()));
        }
        if t.users.values().any(|u| u.email == user.email) || t.contacts.values().any(|c| c.email == contact.email) {
            return Err(StoreError::Conflict(AccountError::EmailTaken.to_string()));
        }
        t.contacts.insert(contact.id, contact.clone());
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.values().find(|u| u.username.eq_ignore_ascii_case(username)).cloned())
    }

    async fn touch_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let user = t.users.get_mut(&id).ok_or(StoreError::NotFound("User"))?;
        user.last_login = Some(at);
        Ok(())
    }
}

#[async_trait]
impl PricingRepository for MemoryStore {
    async fn insert_payment_term(&self, term: &PaymentTerm) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        if t.payment_terms.values().any(|p| p.term_name.eq_ignore_ascii_case(&term.term_name)) {
            return Err(StoreError::Conflict(format!("Payment term '{}' already exists", term.term_name)));
        }
        t.payment_terms.insert(term.id, term.clone());
        Ok(())
    }

    async fn payment_terms(&self, active_only: bool) -> StoreResult<Vec<PaymentTerm>> {
        let t = self.tables.read().await;
        let mut terms: Vec<PaymentTerm> = t.payment_terms.values().filter(|p| !active_only || p.is_active).cloned().collect();
        terms.sort_by(|a, b| a.net_days.cmp(&b.net_days).then_with(|| a.term_name.cmp(&b.term_name)));
        Ok(terms)
    }

    async fn payment_term(&self, id: Uuid) -> StoreResult<Option<PaymentTerm>> {
        Ok(self.tables.read().await.payment_terms.get(&id).cloned())
    }

    async fn insert_offer(&self, offer: &DiscountOffer) -> StoreResult<()> {
        self.tables.write().await.offers.insert(offer.id, offer.clone());
        Ok(())
    }

    async fn offers(&self) -> StoreResult<Vec<DiscountOffer>> {
        let offers = self.tables.read().await.offers.values().cloned().collect();
        Ok(newest_first(offers, |o| o.created_at))
    }

    async fn offer(&self, id: Uuid) -> StoreResult<Option<DiscountOffer>> {
        Ok(self.tables.read().await.offers.get(&id).cloned())
    }

    async fn insert_coupons(&self, coupons: &[Coupon]) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        for (i, coupon) in coupons.iter().enumerate() {
            let clash = t.coupons.values().any(|c| c.coupon_code == coupon.coupon_code)
                || coupons[..i].iter().any(|c| c.coupon_code == coupon.coupon_code);
            if clash {
                return Err(StoreError::Conflict(format!("Coupon code {} already exists", coupon.coupon_code)));
            }
        }
        t.coupons.extend(coupons.iter().map(|c| (c.id, c.clone())));
        Ok(())
    }

    async fn coupons(&self, offer_id: Option<Uuid>) -> StoreResult<Vec<Coupon>> {
        let t = self.tables.read().await;
        let coupons = t.coupons.values().filter(|c| offer_id.map_or(true, |id| c.offer_id == id)).cloned().collect();
        Ok(newest_first(coupons, |c| c.created_at))
    }

    async fn coupon_by_code(&self, code: &str) -> StoreResult<Option<(Coupon, DiscountOffer)>> {
        let t = self.tables.read().await;
        Ok(t.coupons.values()
            .find(|c| c.coupon_code == code)
            .and_then(|c| t.offers.get(&c.offer_id).map(|o| (c.clone(), o.clone()))))
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn cart(&self, user_id: Uuid) -> StoreResult<Option<Cart>> {
        Ok(self.tables.read().await.carts.get(&user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        self.tables.write().await.carts.insert(cart.user_id, cart.clone());
        Ok(())
    }
}

#[async_trait]
impl SalesRepository for MemoryStore {
    async fn save_checkout(&self, record: CheckoutRecord) -> StoreResult<Vec<StockMovement>> {
        let mut t = self.tables.write().await;
        let (staged, movements) = t.stage_stock(&record.stock)?;
        let coupon = match record.coupon_id {
            Some(id) => {
                let mut coupon = t.coupons.get(&id).cloned().ok_or(StoreError::NotFound("Coupon"))?;
                coupon.redeem(record.order.created_at)?;
                Some(coupon)
            }
            None => None,
        };
        t.commit_stock(staged, &movements);
        if let Some(coupon) = coupon {
            t.coupons.insert(coupon.id, coupon);
        }
        if let Some(user_id) = record.clear_cart_of {
            if let Some(cart) = t.carts.get_mut(&user_id) {
                cart.clear();
            }
        }
        t.invoices.insert(record.invoice.id, record.invoice);
        t.orders.insert(record.order.id, record.order);
        Ok(movements)
    }

    async fn save_order_transition(&self, transition: OrderTransition) -> StoreResult<Vec<StockMovement>> {
        let mut t = self.tables.write().await;
        let current = t.orders.get(&transition.order.id).map(|o| o.order_status).ok_or(StoreError::NotFound("Sales order"))?;
        if current != transition.expected {
            return Err(StoreError::Stale("Sales order"));
        }
        if let Some(invoice) = &transition.invoice {
            let stored = t.invoices.get(&invoice.id).ok_or(StoreError::NotFound("Invoice"))?;
            if stored.paid_amount != invoice.paid_amount {
                return Err(StoreError::Stale("Invoice"));
            }
        }
        let (staged, movements) = t.stage_stock(&transition.stock)?;
        t.commit_stock(staged, &movements);
        if let Some(invoice) = transition.invoice {
            t.invoices.insert(invoice.id, invoice);
        }
        t.orders.insert(transition.order.id, transition.order);
        Ok(movements)
    }

    async fn order(&self, id: Uuid) -> StoreResult<Option<SalesOrder>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn orders(&self, filter: OrderFilter) -> StoreResult<Vec<SalesOrder>> {
        let t = self.tables.read().await;
        let orders = t.orders.values()
            .filter(|o| filter.customer_id.map_or(true, |id| o.customer_id == id))
            .filter(|o| filter.status.map_or(true, |s| o.order_status == s))
            .cloned()
            .collect();
        Ok(newest_first(orders, |o| o.created_at))
    }

    async fn invoice(&self, id: Uuid) -> StoreResult<Option<CustomerInvoice>> {
        Ok(self.tables.read().await.invoices.get(&id).cloned())
    }

    async fn invoice_for_order(&self, order_id: Uuid) -> StoreResult<Option<CustomerInvoice>> {
        let t = self.tables.read().await;
        Ok(t.invoices.values().find(|i| i.sales_order_id == order_id).cloned())
    }

    async fn invoices(&self, customer_id: Option<Uuid>) -> StoreResult<Vec<CustomerInvoice>> {
        let t = self.tables.read().await;
        let invoices = t.invoices.values().filter(|i| customer_id.map_or(true, |id| i.customer_id == id)).cloned().collect();
        Ok(newest_first(invoices, |i| i.created_at))
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn record_invoice_payment(&self, invoice: &CustomerInvoice, expected_paid: Decimal, payment: &Payment) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let stored = t.invoices.get_mut(&invoice.id).ok_or(StoreError::NotFound("Invoice"))?;
        if stored.paid_amount != expected_paid {
            return Err(StoreError::Stale("Invoice"));
        }
        *stored = invoice.clone();
        t.payments.push(payment.clone());
        Ok(())
    }

    async fn record_bill_payment(&self, bill: &VendorBill, expected_paid: Decimal, payment: &Payment) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let stored = t.bills.get_mut(&bill.id).ok_or(StoreError::NotFound("Vendor bill"))?;
        if stored.paid_amount != expected_paid {
            return Err(StoreError::Stale("Vendor bill"));
        }
        *stored = bill.clone();
        t.payments.push(payment.clone());
        Ok(())
    }

    async fn payments(&self, contact_id: Option<Uuid>) -> StoreResult<Vec<Payment>> {
        let t = self.tables.read().await;
        let payments = t.payments.iter().filter(|p| contact_id.map_or(true, |id| p.contact_id == id)).cloned().collect();
        Ok(newest_first(payments, |p| p.created_at))
    }
}

#[async_trait]
impl PurchaseRepository for MemoryStore {
    async fn insert_purchase_order(&self, po: &PurchaseOrder) -> StoreResult<()> {
        self.tables.write().await.purchase_orders.insert(po.id, po.clone());
        Ok(())
    }

    async fn update_purchase_order(&self, po: &PurchaseOrder, expected: PurchaseStatus) -> StoreResult<()> {
        let mut t = self.tables.write().await;
        let stored = t.purchase_orders.get_mut(&po.id).ok_or(StoreError::NotFound("Purchase order"))?;
        if stored.po_status != expected {
            return Err(StoreError::Stale("Purchase order"));
        }
        *stored = po.clone();
        Ok(())
    }

    async fn save_receipt(&self, po: &PurchaseOrder, stock: Vec<StockChange>) -> StoreResult<Vec<StockMovement>> {
        let mut t = self.tables.write().await;
        let status = t.purchase_orders.get(&po.id).map(|p| p.po_status).ok_or(StoreError::NotFound("Purchase order"))?;
        if status != PurchaseStatus::Confirmed {
            return Err(StoreError::Stale("Purchase order"));
        }
        let (staged, movements) = t.stage_stock(&stock)?;
        t.commit_stock(staged, &movements);
        t.purchase_orders.insert(po.id, po.clone());
        Ok(movements)
    }

    async fn purchase_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        Ok(self.tables.read().await.purchase_orders.get(&id).cloned())
    }

    async fn purchase_orders(&self, vendor_id: Option<Uuid>) -> StoreResult<Vec<PurchaseOrder>> {
        let t = self.tables.read().await;
        let pos = t.purchase_orders.values().filter(|p| vendor_id.map_or(true, |id| p.vendor_id == id)).cloned().collect();
        Ok(newest_first(pos, |p| p.created_at))
    }

    async fn insert_bill(&self, bill: &VendorBill) -> StoreResult<()> {
        self.tables.write().await.bills.insert(bill.id, bill.clone());
        Ok(())
    }

    async fn bill(&self, id: Uuid) -> StoreResult<Option<VendorBill>> {
        Ok(self.tables.read().await.bills.get(&id).cloned())
    }

    async fn bills(&self, vendor_id: Option<Uuid>) -> StoreResult<Vec<VendorBill>> {
        let t = self.tables.read().await;
        let bills = t.bills.values().filter(|b| vendor_id.map_or(true, |id| b.vendor_id == id)).cloned().collect();
        Ok(newest_first(bills, |b| b.created_at))
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
    async fn apply_stock_changes(&self, changes: Vec<StockChange>) -> StoreResult<Vec<StockMovement>> {
        let mut t = self.tables.write().await;
        let (staged, movements) = t.stage_stock(&changes)?;
        t.commit_stock(staged, &movements);
        Ok(movements)
    }

    async fn movements(&self, product_id: Option<Uuid>) -> StoreResult<Vec<StockMovement>> {
        let t = self.tables.read().await;
        Ok(t.movements.iter().rev().filter(|m| product_id.map_or(true, |id| m.product_id == id)).cloned().collect())
    }
}

#[async_trait]
impl SequenceRepository for MemoryStore {
    async fn next_document_number(&self, document_type: &str) -> StoreResult<String> {
        let mut t = self.tables.write().await;
        let seq = t.sequences.get_mut(document_type).ok_or_else(|| StoreError::Sequence(document_type.to_string()))?;
        let number = seq.next_number;
        seq.next_number += 1;
        Ok(format_document_number(&seq.prefix, number, seq.padding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::kurta;
    use crate::domain::aggregates::ProductError;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_sequences_are_padded_and_increment() {
        let store = MemoryStore::new();
        assert_eq!(store.next_document_number("sales_order").await.unwrap(), "SO-000001");
        assert_eq!(store.next_document_number("sales_order").await.unwrap(), "SO-000002");
        assert_eq!(store.next_document_number("vendor_bill").await.unwrap(), "BILL-000001");
        let err = store.next_document_number("refund").await.unwrap_err();
        assert_eq!(err.to_string(), "Document sequence not configured for refund");
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_stock_untouched() {
        let store = MemoryStore::new();
        let p = kurta();
        store.insert_product(&p).await.unwrap();
        let changes = vec![
            StockChange::adjustment(p.id, dec!(-30), None, None),
            StockChange::adjustment(p.id, dec!(-20), None, None),
        ];
        let err = store.apply_stock_changes(changes).await.unwrap_err();
        assert!(matches!(err, StoreError::Stock(ProductError::InsufficientStock { .. })));
        assert_eq!(store.product(p.id).await.unwrap().unwrap().current_stock, dec!(40));
        assert!(store.movements(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_does_not_void_a_just_paid_invoice() {
        use crate::domain::aggregates::order::tests::placed_order;
        use crate::domain::aggregates::pricing::tests::{day, net_15_with_early_discount};
        use crate::domain::aggregates::{AllocationTarget, InvoiceStatus, OrderStatus, PaymentMethod, PaymentType};

        let store = MemoryStore::new();
        let mut order = placed_order();
        let invoice = CustomerInvoice::for_order("INV-000001".into(), &order, &net_15_with_early_discount(), day("2026-10-17"));
        store.save_checkout(CheckoutRecord {
            order: order.clone(), invoice: invoice.clone(), coupon_id: None, stock: vec![], clear_cart_of: None,
        }).await.unwrap();

        let mut voided = store.invoice_for_order(order.id).await.unwrap().unwrap();
        voided.cancel().unwrap();

        let mut paying = invoice.clone();
        let settlement = paying.register_payment(dec!(500), day("2026-11-10")).unwrap();
        let payment = Payment::settling(
            "PAY-000001".into(), PaymentType::CustomerPayment, order.customer_id,
            AllocationTarget::CustomerInvoice(invoice.id), PaymentMethod::Upi, day("2026-11-10"), &settlement, None, None,
        );
        store.record_invoice_payment(&paying, Decimal::ZERO, &payment).await.unwrap();

        let previous = order.transition(OrderStatus::Cancelled, None, None).unwrap();
        let err = store.save_order_transition(OrderTransition {
            order: order.clone(), expected: previous, invoice: Some(voided), stock: vec![],
        }).await.unwrap_err();
        assert!(matches!(err, StoreError::Stale("Invoice")));

        let stored = store.invoice(invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_status, InvoiceStatus::PartiallyPaid);
        assert_eq!(stored.paid_amount, dec!(500));
        assert_eq!(store.order(order.id).await.unwrap().unwrap().order_status, previous);
    }

    #[tokio::test]
    async fn test_duplicate_product_code_conflicts() {
        let store = MemoryStore::new();
        store.insert_product(&kurta()).await.unwrap();
        assert!(matches!(store.insert_product(&kurta()).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_product_keeps_stock() {
        let store = MemoryStore::new();
        let mut p = kurta();
        store.insert_product(&p).await.unwrap();
        p.current_stock = dec!(999);
        p.name = "Renamed".into();
        store.update_product(&p).await.unwrap();
        let stored = store.product(p.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert_eq!(stored.current_stock, dec!(40));
    }
}
