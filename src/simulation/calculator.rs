//! Profit waterfall for one product line and the breakeven search over it.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregates::{PaymentTerm, Product};
use crate::domain::value_objects::{percent_of, round_money, Percentage};

const BREAKEVEN_ITERATIONS: usize = 100;
const BREAKEVEN_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Revenue to net profit, every step rounded to currency precision.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Waterfall {
    pub gross_revenue: Decimal,
    pub discount_amount: Decimal,
    pub net_revenue: Decimal,
    pub cogs: Decimal,
    pub sales_tax: Decimal,
    pub early_payment_discount: Decimal,
    pub operational_fees: Decimal,
    pub total_costs: Decimal,
    pub net_profit: Decimal,
    /// Net profit over net revenue, zero when there is no net revenue.
    pub profit_margin_percentage: Decimal,
}

pub struct ProfitCalculator<'a> {
    product: &'a Product,
    term: &'a PaymentTerm,
    quantity: Decimal,
    operational_fee: Percentage,
}

impl<'a> ProfitCalculator<'a> {
    pub fn new(product: &'a Product, term: &'a PaymentTerm, quantity: Decimal, operational_fee: Percentage) -> Self {
        Self { product, term, quantity, operational_fee }
    }

    /// The waterfall at `discount` percent off the sales price.
    pub fn waterfall(&self, discount: Decimal) -> Waterfall {
        let gross_revenue = round_money(self.product.sales_price * self.quantity);
        let discount_amount = percent_of(gross_revenue, discount);
        let net_revenue = gross_revenue - discount_amount;
        let cogs = round_money(self.product.purchase_price * self.quantity);
        let sales_tax = self.product.sales_tax_percentage.of(net_revenue);
        let early_payment_discount = self.term.early_payment_discount_on(net_revenue, sales_tax);
        let operational_fees = self.operational_fee.of(gross_revenue);
        let total_costs = cogs + sales_tax + early_payment_discount + operational_fees;
        let net_profit = net_revenue - total_costs;
        let profit_margin_percentage = if net_revenue > Decimal::ZERO {
            round_money(net_profit / net_revenue * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        };
        Waterfall {
            gross_revenue, discount_amount, net_revenue, cogs, sales_tax, early_payment_discount,
            operational_fees, total_costs, net_profit, profit_margin_percentage,
        }
    }

    /// Largest discount that still breaks even, found by bisecting 0..=100.
    pub fn breakeven_discount(&self) -> Decimal {
        let (mut low, mut high) = (Decimal::ZERO, Decimal::ONE_HUNDRED);
        for _ in 0..BREAKEVEN_ITERATIONS {
            let mid = (low + high) / Decimal::TWO;
            let profit = self.waterfall(mid).net_profit;
            if profit.abs() < BREAKEVEN_TOLERANCE {
                return round_money(mid);
            }
            if profit > Decimal::ZERO { low = mid; } else { high = mid; }
        }
        round_money(low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::kurta;
    use crate::domain::aggregates::EarlyPayComputation;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn term(early: Option<(Decimal, EarlyPayComputation)>) -> PaymentTerm {
        PaymentTerm {
            id: Uuid::now_v7(), term_name: "Net 30".into(), net_days: 30,
            early_payment_discount: early.is_some(),
            discount_percentage: Percentage::new(early.map(|e| e.0).unwrap_or_default()).unwrap(),
            discount_days: 10,
            early_pay_discount_computation: early.map(|e| e.1).unwrap_or_default(),
            is_active: true,
        }
    }

    fn fee() -> Percentage { Percentage::new(dec!(2.5)).unwrap() }

    #[test]
    fn test_waterfall_steps() {
        let product = kurta();
        let term = term(None);
        let w = ProfitCalculator::new(&product, &term, dec!(1), fee()).waterfall(dec!(10));
        assert_eq!(w.gross_revenue, dec!(1000));
        assert_eq!(w.discount_amount, dec!(100.00));
        assert_eq!(w.net_revenue, dec!(900.00));
        assert_eq!(w.cogs, dec!(600));
        assert_eq!(w.sales_tax, dec!(45.00));
        assert_eq!(w.early_payment_discount, Decimal::ZERO);
        assert_eq!(w.operational_fees, dec!(25.00));
        assert_eq!(w.total_costs, dec!(670.00));
        assert_eq!(w.net_profit, dec!(230.00));
        assert_eq!(w.profit_margin_percentage, dec!(25.56));
    }

    #[test]
    fn test_early_payment_discount_basis() {
        let product = kurta();
        let on_base = term(Some((dec!(2), EarlyPayComputation::BaseAmount)));
        let on_total = term(Some((dec!(2), EarlyPayComputation::TotalAmount)));
        let base = ProfitCalculator::new(&product, &on_base, dec!(1), fee()).waterfall(dec!(10));
        let total = ProfitCalculator::new(&product, &on_total, dec!(1), fee()).waterfall(dec!(10));
        assert_eq!(base.early_payment_discount, dec!(18.00));
        assert_eq!(total.early_payment_discount, dec!(18.90));
    }

    #[test]
    fn test_full_discount_has_zero_margin() {
        let product = kurta();
        let term = term(None);
        let w = ProfitCalculator::new(&product, &term, dec!(2), fee()).waterfall(dec!(100));
        assert_eq!(w.net_revenue, Decimal::ZERO);
        assert_eq!(w.profit_margin_percentage, Decimal::ZERO);
        assert!(w.net_profit < Decimal::ZERO);
    }

    #[test]
    fn test_breakeven_discount() {
        let product = kurta();
        let term = term(None);
        let calc = ProfitCalculator::new(&product, &term, dec!(1), fee());
        assert_eq!(calc.breakeven_discount(), dec!(34.21));
    }

    #[test]
    fn test_breakeven_is_zero_when_never_profitable() {
        let mut product = kurta();
        product.purchase_price = dec!(2000);
        let term = term(None);
        assert_eq!(ProfitCalculator::new(&product, &term, dec!(1), fee()).breakeven_discount(), Decimal::ZERO);
    }
}
