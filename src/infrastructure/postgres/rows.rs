//! Row shapes as stored, and their conversion into aggregates.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use uuid::Uuid;

use crate::domain::aggregates::{
    Address, Cart, CartItem, Contact, ContactType, Coupon, CouponStatus, CustomerInvoice, DiscountOffer,
    EarlyPayComputation, InvoiceStatus, MovementDirection, MovementType, OfferChannel, OrderStatus, OrderTotals,
    Payment, PaymentAllocation, PaymentMethod, PaymentTerm, PaymentType, Product, ProductColor, ProductImage,
    PurchaseOrder, PurchaseOrderLine, PurchaseStatus, ReferenceType, SalesOrder, SalesOrderLine, ShippingAddress,
    StockMovement, User, UserRole, VendorBill,
};
use crate::domain::aggregates::order::{OrderSource, StatusChange};
use crate::domain::aggregates::payment::PaymentStatus;
use crate::domain::ports::StoreError;
use crate::domain::value_objects::{Percentage, Sku};

fn column<T>(value: &str, parse: impl Fn(&str) -> Option<T>, what: &str) -> Result<T, StoreError> {
    parse(value).ok_or_else(|| StoreError::Backend(format!("unexpected {what} '{value}'")))
}

fn percentage(value: Decimal) -> Result<Percentage, StoreError> {
    Percentage::new(value).map_err(|e| StoreError::Backend(e.to_string()))
}

#[derive(sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub product_code: String,
    pub product_name: String,
    pub product_category: String,
    pub product_type: String,
    pub material: Option<String>,
    pub description: Option<String>,
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
    pub sales_price: Decimal,
    pub sales_tax_percentage: Decimal,
    pub purchase_price: Decimal,
    pub purchase_tax_percentage: Decimal,
    pub colors: Json<Vec<ProductColor>>,
    pub images: Json<Vec<ProductImage>>,
    pub is_published: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;
    fn try_from(r: ProductRow) -> Result<Self, Self::Error> {
        let backend = |e: crate::domain::aggregates::ProductError| StoreError::Backend(e.to_string());
        Ok(Product {
            id: r.id,
            code: Sku::new(r.product_code).map_err(|e| StoreError::Backend(e.to_string()))?,
            name: r.product_name,
            category: r.product_category.parse().map_err(backend)?,
            product_type: r.product_type.parse().map_err(backend)?,
            material: r.material,
            description: r.description,
            current_stock: r.current_stock,
            minimum_stock: r.minimum_stock,
            sales_price: r.sales_price,
            sales_tax_percentage: percentage(r.sales_tax_percentage)?,
            purchase_price: r.purchase_price,
            purchase_tax_percentage: percentage(r.purchase_tax_percentage)?,
            colors: r.colors.0,
            images: r.images.0,
            is_published: r.is_published,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct ContactRow {
    pub id: Uuid,
    pub contact_name: String,
    pub contact_type: String,
    pub email: String,
    pub mobile: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = StoreError;
    fn try_from(r: ContactRow) -> Result<Self, Self::Error> {
        Ok(Contact {
            id: r.id,
            contact_name: r.contact_name,
            contact_type: column(&r.contact_type, ContactType::parse, "contact type")?,
            email: r.email,
            mobile: r.mobile,
            address_line1: r.address_line1,
            address_line2: r.address_line2,
            city: r.city,
            state: r.state,
            pincode: r.pincode,
            country: r.country,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct AddressRow {
    pub id: Uuid,
    pub contact_id: Uuid,
    pub label: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: String,
    pub is_default_shipping: bool,
    pub is_default_billing: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(r: AddressRow) -> Self {
        Address {
            id: r.id, contact_id: r.contact_id, label: r.label, address_line1: r.address_line1,
            address_line2: r.address_line2, city: r.city, state: r.state, pincode: r.pincode, country: r.country,
            is_default_shipping: r.is_default_shipping, is_default_billing: r.is_default_billing, created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub contact_id: Option<Uuid>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;
    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: r.id, username: r.username, email: r.email, password_hash: r.password_hash,
            role: column(&r.role, UserRole::parse, "user role")?, contact_id: r.contact_id,
            is_active: r.is_active, last_login: r.last_login, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct PaymentTermRow {
    pub id: Uuid,
    pub term_name: String,
    pub net_days: i32,
    pub early_payment_discount: bool,
    pub discount_percentage: Decimal,
    pub discount_days: i32,
    pub early_pay_discount_computation: String,
    pub is_active: bool,
}

impl TryFrom<PaymentTermRow> for PaymentTerm {
    type Error = StoreError;
    fn try_from(r: PaymentTermRow) -> Result<Self, Self::Error> {
        Ok(PaymentTerm {
            id: r.id, term_name: r.term_name, net_days: r.net_days, early_payment_discount: r.early_payment_discount,
            discount_percentage: percentage(r.discount_percentage)?, discount_days: r.discount_days,
            early_pay_discount_computation: column(&r.early_pay_discount_computation, EarlyPayComputation::parse, "discount computation")?,
            is_active: r.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct OfferRow {
    pub id: Uuid,
    pub offer_name: String,
    pub discount_percentage: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available_on: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for DiscountOffer {
    type Error = StoreError;
    fn try_from(r: OfferRow) -> Result<Self, Self::Error> {
        Ok(DiscountOffer {
            id: r.id, offer_name: r.offer_name, discount_percentage: percentage(r.discount_percentage)?,
            start_date: r.start_date, end_date: r.end_date,
            available_on: column(&r.available_on, OfferChannel::parse, "offer channel")?,
            is_active: r.is_active, created_by: r.created_by, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct CouponRow {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub coupon_code: String,
    pub expiration_date: NaiveDate,
    pub coupon_status: String,
    pub contact_id: Option<Uuid>,
    pub usage_count: i32,
    pub max_usage_count: i32,
    pub is_active: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = StoreError;
    fn try_from(r: CouponRow) -> Result<Self, Self::Error> {
        Ok(Coupon {
            id: r.id, offer_id: r.offer_id, coupon_code: r.coupon_code, expiration_date: r.expiration_date,
            coupon_status: column(&r.coupon_status, CouponStatus::parse, "coupon status")?,
            contact_id: r.contact_id, usage_count: r.usage_count, max_usage_count: r.max_usage_count,
            is_active: r.is_active, used_at: r.used_at, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct CartRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Json<Vec<CartItem>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self {
        Cart { id: r.id, user_id: r.user_id, items: r.items.0, created_at: r.created_at, updated_at: r.updated_at }
    }
}

#[derive(sqlx::FromRow)]
pub struct SalesOrderRow {
    pub id: Uuid,
    pub so_number: String,
    pub customer_id: Uuid,
    pub payment_term_id: Uuid,
    pub order_date: NaiveDate,
    pub order_source: String,
    pub order_status: String,
    pub lines: Json<Vec<SalesOrderLine>>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub delivery_fee: Decimal,
    pub total_amount: Decimal,
    pub coupon_id: Option<Uuid>,
    pub applied_discount_percentage: Decimal,
    pub notes: Option<String>,
    pub shipping_address: Option<Json<ShippingAddress>>,
    pub status_log: Json<Vec<StatusChange>>,
    pub created_by: Option<Uuid>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SalesOrderRow> for SalesOrder {
    type Error = StoreError;
    fn try_from(r: SalesOrderRow) -> Result<Self, Self::Error> {
        Ok(SalesOrder {
            id: r.id, so_number: r.so_number, customer_id: r.customer_id, payment_term_id: r.payment_term_id,
            order_date: r.order_date,
            order_source: column(&r.order_source, OrderSource::parse, "order source")?,
            order_status: column(&r.order_status, OrderStatus::parse, "order status")?,
            lines: r.lines.0,
            totals: OrderTotals {
                subtotal: r.subtotal, discount_amount: r.discount_amount, tax_amount: r.tax_amount,
                delivery_fee: r.delivery_fee, total_amount: r.total_amount,
            },
            coupon_id: r.coupon_id, applied_discount_percentage: percentage(r.applied_discount_percentage)?,
            notes: r.notes, shipping_address: r.shipping_address.map(|a| a.0), status_log: r.status_log.0,
            created_by: r.created_by, confirmed_at: r.confirmed_at, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub invoice_number: String,
    pub sales_order_id: Uuid,
    pub customer_id: Uuid,
    pub payment_term_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub invoice_status: String,
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

impl TryFrom<InvoiceRow> for CustomerInvoice {
    type Error = StoreError;
    fn try_from(r: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(CustomerInvoice {
            id: r.id, invoice_number: r.invoice_number, sales_order_id: r.sales_order_id, customer_id: r.customer_id,
            payment_term_id: r.payment_term_id, invoice_date: r.invoice_date, due_date: r.due_date,
            invoice_status: column(&r.invoice_status, InvoiceStatus::parse, "invoice status")?,
            subtotal: r.subtotal, discount_amount: r.discount_amount, tax_amount: r.tax_amount,
            delivery_fee: r.delivery_fee, total_amount: r.total_amount, paid_amount: r.paid_amount,
            remaining_amount: r.remaining_amount,
            early_payment_discount_applicable: r.early_payment_discount_applicable,
            early_payment_discount_amount: r.early_payment_discount_amount,
            early_payment_deadline: r.early_payment_deadline, notes: r.notes, created_by: r.created_by,
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub payment_number: String,
    pub payment_type: String,
    pub contact_id: Uuid,
    pub payment_date: NaiveDate,
    pub payment_method: String,
    pub payment_amount: Decimal,
    pub payment_status: String,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub allocations: Json<Vec<PaymentAllocation>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;
    fn try_from(r: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: r.id, payment_number: r.payment_number,
            payment_type: column(&r.payment_type, PaymentType::parse, "payment type")?,
            contact_id: r.contact_id, payment_date: r.payment_date,
            payment_method: column(&r.payment_method, PaymentMethod::parse, "payment method")?,
            payment_amount: r.payment_amount,
            payment_status: column(&r.payment_status, PaymentStatus::parse, "payment status")?,
            reference_number: r.reference_number, notes: r.notes, allocations: r.allocations.0,
            created_by: r.created_by, created_at: r.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct PurchaseOrderRow {
    pub id: Uuid,
    pub po_number: String,
    pub vendor_id: Uuid,
    pub order_date: NaiveDate,
    pub expected_delivery_date: Option<NaiveDate>,
    pub po_status: String,
    pub lines: Json<Vec<PurchaseOrderLine>>,
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

impl TryFrom<PurchaseOrderRow> for PurchaseOrder {
    type Error = StoreError;
    fn try_from(r: PurchaseOrderRow) -> Result<Self, Self::Error> {
        Ok(PurchaseOrder {
            id: r.id, po_number: r.po_number, vendor_id: r.vendor_id, order_date: r.order_date,
            expected_delivery_date: r.expected_delivery_date,
            po_status: column(&r.po_status, PurchaseStatus::parse, "purchase order status")?,
            lines: r.lines.0, subtotal: r.subtotal, tax_amount: r.tax_amount, total_amount: r.total_amount,
            notes: r.notes, created_by: r.created_by, confirmed_by: r.confirmed_by, confirmed_at: r.confirmed_at,
            created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct VendorBillRow {
    pub id: Uuid,
    pub bill_number: String,
    pub purchase_order_id: Uuid,
    pub vendor_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub bill_status: String,
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

impl TryFrom<VendorBillRow> for VendorBill {
    type Error = StoreError;
    fn try_from(r: VendorBillRow) -> Result<Self, Self::Error> {
        Ok(VendorBill {
            id: r.id, bill_number: r.bill_number, purchase_order_id: r.purchase_order_id, vendor_id: r.vendor_id,
            invoice_date: r.invoice_date, due_date: r.due_date,
            bill_status: column(&r.bill_status, InvoiceStatus::parse, "bill status")?,
            subtotal: r.subtotal, tax_amount: r.tax_amount, total_amount: r.total_amount, paid_amount: r.paid_amount,
            remaining_amount: r.remaining_amount, vendor_reference: r.vendor_reference, notes: r.notes,
            created_by: r.created_by, created_at: r.created_at, updated_at: r.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct MovementRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: String,
    pub direction: String,
    pub quantity: Decimal,
    pub reference_type: String,
    pub reference_id: Option<Uuid>,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub notes: Option<String>,
    pub created_by: Option<Uuid>,
    pub movement_date: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = StoreError;
    fn try_from(r: MovementRow) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: r.id, product_id: r.product_id,
            movement_type: column(&r.movement_type, MovementType::parse, "movement type")?,
            direction: column(&r.direction, MovementDirection::parse, "movement direction")?,
            quantity: r.quantity,
            reference_type: column(&r.reference_type, ReferenceType::parse, "reference type")?,
            reference_id: r.reference_id, stock_before: r.stock_before, stock_after: r.stock_after,
            notes: r.notes, created_by: r.created_by, movement_date: r.movement_date,
        })
    }
}

/// Converts every row, failing on the first that does not map.
pub fn convert<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}
