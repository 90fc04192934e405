use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgConnection;
use sqlx::types::Json;
use uuid::Uuid;

use super::rows::{convert, InvoiceRow, PaymentRow, PurchaseOrderRow, SalesOrderRow, VendorBillRow};
use super::{apply_all, PgStore};
use crate::domain::aggregates::{
    CouponError, CustomerInvoice, Payment, PurchaseOrder, PurchaseStatus, SalesOrder, StockChange, StockMovement,
    VendorBill,
};
use crate::domain::ports::{
    CheckoutRecord, OrderFilter, OrderTransition, PaymentRepository, PurchaseRepository, SalesRepository, StoreError,
    StoreResult,
};

async fn redeem_coupon(conn: &mut PgConnection, coupon_id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
    let redeemed = sqlx::query(
        "UPDATE coupon_codes SET usage_count = usage_count + 1, \
         coupon_status = CASE WHEN usage_count + 1 >= max_usage_count THEN 'used' ELSE coupon_status END, \
         used_at = CASE WHEN usage_count + 1 >= max_usage_count THEN $2 ELSE used_at END \
         WHERE id = $1 AND coupon_status = 'unused' AND usage_count < max_usage_count",
    )
    .bind(coupon_id)
    .bind(at)
    .execute(conn)
    .await?;
    if redeemed.rows_affected() == 0 {
        return Err(CouponError::AlreadyUsed.into());
    }
    Ok(())
}

async fn insert_order(conn: &mut PgConnection, o: &SalesOrder) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO sales_orders (id, so_number, customer_id, payment_term_id, order_date, order_source, order_status, \
         lines, subtotal, discount_amount, tax_amount, delivery_fee, total_amount, coupon_id, applied_discount_percentage, \
         notes, shipping_address, status_log, created_by, confirmed_at, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)",
    )
    .bind(o.id)
    .bind(&o.so_number)
    .bind(o.customer_id)
    .bind(o.payment_term_id)
    .bind(o.order_date)
    .bind(o.order_source.as_str())
    .bind(o.order_status.as_str())
    .bind(Json(&o.lines))
    .bind(o.totals.subtotal)
    .bind(o.totals.discount_amount)
    .bind(o.totals.tax_amount)
    .bind(o.totals.delivery_fee)
    .bind(o.totals.total_amount)
    .bind(o.coupon_id)
    .bind(o.applied_discount_percentage.value())
    .bind(&o.notes)
    .bind(o.shipping_address.as_ref().map(Json))
    .bind(Json(&o.status_log))
    .bind(o.created_by)
    .bind(o.confirmed_at)
    .bind(o.created_at)
    .bind(o.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_invoice(conn: &mut PgConnection, i: &CustomerInvoice) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO customer_invoices (id, invoice_number, sales_order_id, customer_id, payment_term_id, invoice_date, \
         due_date, invoice_status, subtotal, discount_amount, tax_amount, delivery_fee, total_amount, paid_amount, \
         remaining_amount, early_payment_discount_applicable, early_payment_discount_amount, early_payment_deadline, \
         notes, created_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)",
    )
    .bind(i.id)
    .bind(&i.invoice_number)
    .bind(i.sales_order_id)
    .bind(i.customer_id)
    .bind(i.payment_term_id)
    .bind(i.invoice_date)
    .bind(i.due_date)
    .bind(i.invoice_status.as_str())
    .bind(i.subtotal)
    .bind(i.discount_amount)
    .bind(i.tax_amount)
    .bind(i.delivery_fee)
    .bind(i.total_amount)
    .bind(i.paid_amount)
    .bind(i.remaining_amount)
    .bind(i.early_payment_discount_applicable)
    .bind(i.early_payment_discount_amount)
    .bind(i.early_payment_deadline)
    .bind(&i.notes)
    .bind(i.created_by)
    .bind(i.created_at)
    .bind(i.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Writes the invoice's balance fields if nobody paid against it since `expected_paid` was read.
async fn update_invoice(conn: &mut PgConnection, i: &CustomerInvoice, expected_paid: Decimal) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE customer_invoices SET invoice_status = $3, paid_amount = $4, remaining_amount = $5, updated_at = $6 \
         WHERE id = $1 AND paid_amount = $2",
    )
    .bind(i.id)
    .bind(expected_paid)
    .bind(i.invoice_status.as_str())
    .bind(i.paid_amount)
    .bind(i.remaining_amount)
    .bind(i.updated_at)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Stale("Invoice"));
    }
    Ok(())
}

async fn insert_payment(conn: &mut PgConnection, p: &Payment) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO payments (id, payment_number, payment_type, contact_id, payment_date, payment_method, payment_amount, \
         payment_status, reference_number, notes, allocations, created_by, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(p.id)
    .bind(&p.payment_number)
    .bind(p.payment_type.as_str())
    .bind(p.contact_id)
    .bind(p.payment_date)
    .bind(p.payment_method.as_str())
    .bind(p.payment_amount)
    .bind(p.payment_status.as_str())
    .bind(&p.reference_number)
    .bind(&p.notes)
    .bind(Json(&p.allocations))
    .bind(p.created_by)
    .bind(p.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl SalesRepository for PgStore {
    async fn save_checkout(&self, record: CheckoutRecord) -> StoreResult<Vec<StockMovement>> {
        let mut tx = self.pool.begin().await?;
        let movements = apply_all(&mut tx, &record.stock).await?;
        if let Some(coupon_id) = record.coupon_id {
            redeem_coupon(&mut tx, coupon_id, record.order.created_at).await?;
        }
        insert_order(&mut tx, &record.order).await?;
        insert_invoice(&mut tx, &record.invoice).await?;
        if let Some(user_id) = record.clear_cart_of {
            sqlx::query("UPDATE carts SET items = '[]', updated_at = NOW() WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(movements)
    }

    async fn save_order_transition(&self, t: OrderTransition) -> StoreResult<Vec<StockMovement>> {
        let mut tx = self.pool.begin().await?;
        let o = &t.order;
        let result = sqlx::query(
            "UPDATE sales_orders SET order_status = $3, status_log = $4, confirmed_at = $5, updated_at = $6 \
             WHERE id = $1 AND order_status = $2",
        )
        .bind(o.id)
        .bind(t.expected.as_str())
        .bind(o.order_status.as_str())
        .bind(Json(&o.status_log))
        .bind(o.confirmed_at)
        .bind(o.updated_at)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Stale("Sales order"));
        }
        let movements = apply_all(&mut tx, &t.stock).await?;
        if let Some(invoice) = &t.invoice {
            update_invoice(&mut tx, invoice, invoice.paid_amount).await?;
        }
        tx.commit().await?;
        Ok(movements)
    }

    async fn order(&self, id: Uuid) -> StoreResult<Option<SalesOrder>> {
        let row: Option<SalesOrderRow> = sqlx::query_as("SELECT * FROM sales_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(SalesOrder::try_from).transpose()
    }

    async fn orders(&self, filter: OrderFilter) -> StoreResult<Vec<SalesOrder>> {
        let rows: Vec<SalesOrderRow> = sqlx::query_as(
            "SELECT * FROM sales_orders WHERE ($1::uuid IS NULL OR customer_id = $1) \
             AND ($2::text IS NULL OR order_status = $2) ORDER BY created_at DESC",
        )
        .bind(filter.customer_id)
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }

    async fn invoice(&self, id: Uuid) -> StoreResult<Option<CustomerInvoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as("SELECT * FROM customer_invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CustomerInvoice::try_from).transpose()
    }

    async fn invoice_for_order(&self, order_id: Uuid) -> StoreResult<Option<CustomerInvoice>> {
        let row: Option<InvoiceRow> = sqlx::query_as("SELECT * FROM customer_invoices WHERE sales_order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(CustomerInvoice::try_from).transpose()
    }

    async fn invoices(&self, customer_id: Option<Uuid>) -> StoreResult<Vec<CustomerInvoice>> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(
            "SELECT * FROM customer_invoices WHERE $1::uuid IS NULL OR customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }
}

#[async_trait]
impl PaymentRepository for PgStore {
    async fn record_invoice_payment(&self, invoice: &CustomerInvoice, expected_paid: Decimal, payment: &Payment) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        update_invoice(&mut tx, invoice, expected_paid).await?;
        insert_payment(&mut tx, payment).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn record_bill_payment(&self, bill: &VendorBill, expected_paid: Decimal, payment: &Payment) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE vendor_bills SET bill_status = $3, paid_amount = $4, remaining_amount = $5, updated_at = $6 \
             WHERE id = $1 AND paid_amount = $2",
        )
        .bind(bill.id)
        .bind(expected_paid)
        .bind(bill.bill_status.as_str())
        .bind(bill.paid_amount)
        .bind(bill.remaining_amount)
        .bind(bill.updated_at)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Stale("Vendor bill"));
        }
        insert_payment(&mut tx, payment).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn payments(&self, contact_id: Option<Uuid>) -> StoreResult<Vec<Payment>> {
        let rows: Vec<PaymentRow> = sqlx::query_as(
            "SELECT * FROM payments WHERE $1::uuid IS NULL OR contact_id = $1 ORDER BY created_at DESC",
        )
        .bind(contact_id)
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }
}

async fn update_po(conn: &mut PgConnection, po: &PurchaseOrder, expected: PurchaseStatus) -> StoreResult<()> {
    let result = sqlx::query(
        "UPDATE purchase_orders SET po_status = $3, lines = $4, confirmed_by = $5, confirmed_at = $6, updated_at = $7 \
         WHERE id = $1 AND po_status = $2",
    )
    .bind(po.id)
    .bind(expected.as_str())
    .bind(po.po_status.as_str())
    .bind(Json(&po.lines))
    .bind(po.confirmed_by)
    .bind(po.confirmed_at)
    .bind(po.updated_at)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Stale("Purchase order"));
    }
    Ok(())
}

#[async_trait]
impl PurchaseRepository for PgStore {
    async fn insert_purchase_order(&self, po: &PurchaseOrder) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO purchase_orders (id, po_number, vendor_id, order_date, expected_delivery_date, po_status, lines, \
             subtotal, tax_amount, total_amount, notes, created_by, confirmed_by, confirmed_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(po.id)
        .bind(&po.po_number)
        .bind(po.vendor_id)
        .bind(po.order_date)
        .bind(po.expected_delivery_date)
        .bind(po.po_status.as_str())
        .bind(Json(&po.lines))
        .bind(po.subtotal)
        .bind(po.tax_amount)
        .bind(po.total_amount)
        .bind(&po.notes)
        .bind(po.created_by)
        .bind(po.confirmed_by)
        .bind(po.confirmed_at)
        .bind(po.created_at)
        .bind(po.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_purchase_order(&self, po: &PurchaseOrder, expected: PurchaseStatus) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        update_po(&mut conn, po, expected).await
    }

    async fn save_receipt(&self, po: &PurchaseOrder, stock: Vec<StockChange>) -> StoreResult<Vec<StockMovement>> {
        let mut tx = self.pool.begin().await?;
        update_po(&mut tx, po, PurchaseStatus::Confirmed).await?;
        let movements = apply_all(&mut tx, &stock).await?;
        tx.commit().await?;
        Ok(movements)
    }

    async fn purchase_order(&self, id: Uuid) -> StoreResult<Option<PurchaseOrder>> {
        let row: Option<PurchaseOrderRow> = sqlx::query_as("SELECT * FROM purchase_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PurchaseOrder::try_from).transpose()
    }

    async fn purchase_orders(&self, vendor_id: Option<Uuid>) -> StoreResult<Vec<PurchaseOrder>> {
        let rows: Vec<PurchaseOrderRow> = sqlx::query_as(
            "SELECT * FROM purchase_orders WHERE $1::uuid IS NULL OR vendor_id = $1 ORDER BY created_at DESC",
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }

    async fn insert_bill(&self, b: &VendorBill) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO vendor_bills (id, bill_number, purchase_order_id, vendor_id, invoice_date, due_date, bill_status, \
             subtotal, tax_amount, total_amount, paid_amount, remaining_amount, vendor_reference, notes, created_by, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(b.id)
        .bind(&b.bill_number)
        .bind(b.purchase_order_id)
        .bind(b.vendor_id)
        .bind(b.invoice_date)
        .bind(b.due_date)
        .bind(b.bill_status.as_str())
        .bind(b.subtotal)
        .bind(b.tax_amount)
        .bind(b.total_amount)
        .bind(b.paid_amount)
        .bind(b.remaining_amount)
        .bind(&b.vendor_reference)
        .bind(&b.notes)
        .bind(b.created_by)
        .bind(b.created_at)
        .bind(b.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn bill(&self, id: Uuid) -> StoreResult<Option<VendorBill>> {
        let row: Option<VendorBillRow> = sqlx::query_as("SELECT * FROM vendor_bills WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(VendorBill::try_from).transpose()
    }

    async fn bills(&self, vendor_id: Option<Uuid>) -> StoreResult<Vec<VendorBill>> {
        let rows: Vec<VendorBillRow> = sqlx::query_as(
            "SELECT * FROM vendor_bills WHERE $1::uuid IS NULL OR vendor_id = $1 ORDER BY created_at DESC",
        )
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }
}
