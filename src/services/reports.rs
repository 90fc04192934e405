//! Vendor dashboard summary

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::aggregates::{
    CustomerInvoice, InvoiceStatus, OrderStatus, Product, SalesOrder, VendorBill,
};
use crate::domain::ports::OrderFilter;
use crate::domain::value_objects::round_money;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

const TOP_PRODUCTS: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct LowStock {
    pub product_id: Uuid,
    pub code: String,
    pub name: String,
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub quantity_sold: Decimal,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub currency_symbol: String,
    pub sales_total: Decimal,
    pub order_count: usize,
    pub average_order_value: Decimal,
    pub discount_total: Decimal,
    pub receivables_outstanding: Decimal,
    pub payables_outstanding: Decimal,
    pub low_stock: Vec<LowStock>,
    pub top_products: Vec<TopProduct>,
}

impl Summary {
    fn build(
        q: &ReportQuery, orders: &[SalesOrder], invoices: &[CustomerInvoice], bills: &[VendorBill], products: &[Product],
    ) -> Self {
        let in_range = |day: NaiveDate| q.from.map_or(true, |f| day >= f) && q.to.map_or(true, |t| day <= t);
        let sold: Vec<&SalesOrder> = orders.iter()
            .filter(|o| o.order_status != OrderStatus::Cancelled && in_range(o.order_date))
            .collect();

        let sales_total: Decimal = sold.iter().map(|o| o.totals.total_amount).sum();
        let discount_total: Decimal = sold.iter().map(|o| o.totals.discount_amount).sum();
        let average_order_value = if sold.is_empty() {
            Decimal::ZERO
        } else {
            round_money(sales_total / Decimal::from(sold.len()))
        };

        let mut by_product: HashMap<Uuid, TopProduct> = HashMap::new();
        for line in sold.iter().flat_map(|o| &o.lines) {
            let entry = by_product.entry(line.product_id).or_insert_with(|| TopProduct {
                product_id: line.product_id, name: line.product_name.clone(),
                quantity_sold: Decimal::ZERO, revenue: Decimal::ZERO,
            });
            entry.quantity_sold += line.quantity;
            entry.revenue += line.line_subtotal;
        }
        let mut top_products: Vec<TopProduct> = by_product.into_values().collect();
        top_products.sort_by(|a, b| b.quantity_sold.cmp(&a.quantity_sold).then_with(|| b.revenue.cmp(&a.revenue)));
        top_products.truncate(TOP_PRODUCTS);

        let low_stock = products.iter()
            .filter(|p| p.is_active && p.is_low_stock())
            .map(|p| LowStock {
                product_id: p.id, code: p.code.to_string(), name: p.name.clone(),
                current_stock: p.current_stock, minimum_stock: p.minimum_stock,
            })
            .collect();

        Self {
            from: q.from,
            to: q.to,
            currency_symbol: String::new(),
            sales_total,
            order_count: sold.len(),
            average_order_value,
            discount_total,
            receivables_outstanding: invoices.iter()
                .filter(|i| i.invoice_status != InvoiceStatus::Cancelled)
                .map(|i| i.remaining_amount)
                .sum(),
            payables_outstanding: bills.iter()
                .filter(|b| b.bill_status != InvoiceStatus::Cancelled)
                .map(|b| b.remaining_amount)
                .sum(),
            low_stock,
            top_products,
        }
    }
}

pub async fn summary(state: &AppState, q: ReportQuery) -> AppResult<Summary> {
    if let (Some(from), Some(to)) = (q.from, q.to) {
        if from > to {
            return Err(AppError::Validation("from must not be after to".into()));
        }
    }
    let orders = state.store.orders(OrderFilter::default()).await?;
    let invoices = state.store.invoices(None).await?;
    let bills = state.store.bills(None).await?;
    let products = state.store.catalog(false).await?;
    let mut summary = Summary::build(&q, &orders, &invoices, &bills, &products);
    summary.currency_symbol = state.config.currency_symbol.clone();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::tests::placed_order;
    use crate::domain::aggregates::product::tests::kurta;
    use rust_decimal_macros::dec;

    #[test]
    fn test_summary_skips_cancelled_and_out_of_range_orders() {
        let first = placed_order();
        let mut cancelled = placed_order();
        cancelled.transition(OrderStatus::Cancelled, None, None).unwrap();
        let mut old = placed_order();
        old.order_date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();

        let q = ReportQuery { from: NaiveDate::from_ymd_opt(2026, 10, 1), to: None };
        let s = Summary::build(&q, &[first, cancelled, old], &[], &[], &[]);
        assert_eq!(s.order_count, 1);
        assert_eq!(s.sales_total, dec!(1900.00));
        assert_eq!(s.average_order_value, dec!(1900.00));
        assert_eq!(s.discount_total, dec!(200.00));
        assert_eq!(s.top_products.len(), 1);
        assert_eq!(s.top_products[0].quantity_sold, dec!(2));
        assert_eq!(s.top_products[0].revenue, dec!(2000));
    }

    #[test]
    fn test_low_stock_lists_active_products_only() {
        let mut low = kurta();
        low.current_stock = dec!(3);
        let mut archived = low.clone();
        archived.id = Uuid::now_v7();
        archived.archive();
        let s = Summary::build(&ReportQuery::default(), &[], &[], &[], &[low.clone(), archived, kurta()]);
        assert_eq!(s.low_stock.len(), 1);
        assert_eq!(s.low_stock[0].product_id, low.id);
        assert_eq!(s.average_order_value, Decimal::ZERO);
    }
}
