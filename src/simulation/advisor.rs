//! Margin verdicts and what-if scenarios on top of the waterfall.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculator::{ProfitCalculator, Waterfall};
use crate::domain::aggregates::Product;

const CRITICAL_MARGIN: Decimal = Decimal::from_parts(5, 0, 0, false, 0);
const HEALTHY_MARGIN: Decimal = Decimal::from_parts(15, 0, 0, false, 0);
const HIGH_DISCOUNT: Decimal = Decimal::from_parts(30, 0, 0, false, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginHealth { Critical, Warning, Healthy }

impl MarginHealth {
    pub fn of(margin: Decimal) -> Self {
        if margin < CRITICAL_MARGIN { Self::Critical }
        else if margin < HEALTHY_MARGIN { Self::Warning }
        else { Self::Healthy }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyInsight { LossTransaction, LiquidationAcceptable, OptimalMargin, PremiumPricing }

#[derive(Clone, Debug, Serialize)]
pub struct MarginAnalysis {
    pub health_status: MarginHealth,
    pub health_score: Decimal,
    pub strategy_insight: StrategyInsight,
    pub recommendation: String,
    pub risk_factors: Vec<String>,
}

/// Thresholds and labels the advisor works with.
pub struct Advisor<'a> {
    pub liquidation_threshold: Decimal,
    pub currency_symbol: &'a str,
}

impl Advisor<'_> {
    pub fn analyze(&self, w: &Waterfall, product: &Product, discount: Decimal) -> MarginAnalysis {
        let margin = w.profit_margin_percentage;
        let stock = product.current_stock;
        let cur = self.currency_symbol;
        let mut risk_factors = Vec::new();

        let (strategy_insight, recommendation) = if margin < Decimal::ZERO {
            risk_factors.push("Negative profit margin".to_string());
            (
                StrategyInsight::LossTransaction,
                format!(
                    "REJECT: This transaction results in a loss of {cur}{}. Consider reducing the discount or rejecting the sale.",
                    w.net_profit.abs()
                ),
            )
        } else if margin < CRITICAL_MARGIN && stock > self.liquidation_threshold {
            risk_factors.push("Critical margin but high inventory".to_string());
            (
                StrategyInsight::LiquidationAcceptable,
                format!(
                    "CAUTION: Minimal {margin}% margin, but acceptable for inventory liquidation (stock: {stock} units). Approve for clearance only."
                ),
            )
        } else if margin < CRITICAL_MARGIN {
            risk_factors.push("Critical margin with low inventory".to_string());
            (
                StrategyInsight::LossTransaction,
                format!(
                    "REJECT: Critical {margin}% margin with low stock ({stock} units). Reduce the discount or raise the price."
                ),
            )
        } else if margin < HEALTHY_MARGIN {
            if product.is_low_stock() {
                risk_factors.push("Stock below minimum threshold".to_string());
            }
            (
                StrategyInsight::OptimalMargin,
                format!("APPROVE: Acceptable {margin}% margin. Profitable, but watch for volume opportunities."),
            )
        } else {
            (
                StrategyInsight::PremiumPricing,
                format!("EXCELLENT: Strong {margin}% margin. Use this as a benchmark for future pricing."),
            )
        };

        if discount > HIGH_DISCOUNT {
            risk_factors.push(format!("High discount applied: {discount}%"));
        }
        if w.early_payment_discount > Decimal::ZERO {
            risk_factors.push(format!("Early payment discount cost: {cur}{}", w.early_payment_discount));
        }

        MarginAnalysis {
            health_status: MarginHealth::of(margin),
            health_score: margin,
            strategy_insight,
            recommendation,
            risk_factors,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Scenario {
    pub scenario_name: &'static str,
    pub discount_percentage: Decimal,
    pub net_profit: Decimal,
    pub profit_margin: Decimal,
    pub is_profitable: bool,
}

/// No discount, the requested discount and the breakeven discount, side by side.
pub fn compare_scenarios(calc: &ProfitCalculator<'_>, current_discount: Decimal) -> Vec<Scenario> {
    let scenario = |name, discount: Decimal, breakeven: bool| {
        let w = calc.waterfall(discount);
        Scenario {
            scenario_name: name,
            discount_percentage: discount,
            net_profit: w.net_profit,
            profit_margin: w.profit_margin_percentage,
            is_profitable: if breakeven { w.net_profit >= Decimal::ZERO } else { w.net_profit > Decimal::ZERO },
        }
    };
    vec![
        scenario("No Discount (Full Margin)", Decimal::ZERO, false),
        scenario("Current Discount Applied", current_discount, false),
        scenario("Maximum Breakeven Discount", calc.breakeven_discount(), true),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::kurta;
    use crate::domain::aggregates::PaymentTerm;
    use crate::domain::value_objects::Percentage;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn waterfall(margin: Decimal, profit: Decimal) -> Waterfall {
        Waterfall {
            gross_revenue: dec!(1000), discount_amount: Decimal::ZERO, net_revenue: dec!(1000), cogs: dec!(600),
            sales_tax: dec!(50), early_payment_discount: Decimal::ZERO, operational_fees: dec!(25),
            total_costs: dec!(675), net_profit: profit, profit_margin_percentage: margin,
        }
    }

    fn advisor() -> Advisor<'static> {
        Advisor { liquidation_threshold: dec!(50), currency_symbol: "₹" }
    }

    #[test]
    fn test_health_bands() {
        assert_eq!(MarginHealth::of(dec!(4.99)), MarginHealth::Critical);
        assert_eq!(MarginHealth::of(dec!(5)), MarginHealth::Warning);
        assert_eq!(MarginHealth::of(dec!(15)), MarginHealth::Healthy);
    }

    #[test]
    fn test_loss_is_rejected() {
        let a = advisor().analyze(&waterfall(dec!(-3.2), dec!(-32)), &kurta(), dec!(40));
        assert_eq!(a.strategy_insight, StrategyInsight::LossTransaction);
        assert!(a.recommendation.contains("₹32"));
        assert_eq!(a.risk_factors, vec!["Negative profit margin".to_string(), "High discount applied: 40%".to_string()]);
    }

    #[test]
    fn test_thin_margin_depends_on_stock() {
        let mut product = kurta();
        let thin = waterfall(dec!(3), dec!(30));
        assert_eq!(advisor().analyze(&thin, &product, dec!(5)).strategy_insight, StrategyInsight::LossTransaction);
        product.current_stock = dec!(120);
        let a = advisor().analyze(&thin, &product, dec!(5));
        assert_eq!(a.strategy_insight, StrategyInsight::LiquidationAcceptable);
        assert_eq!(a.health_status, MarginHealth::Critical);
    }

    #[test]
    fn test_warning_margin_flags_low_stock() {
        let mut product = kurta();
        product.current_stock = dec!(4);
        let a = advisor().analyze(&waterfall(dec!(10), dec!(100)), &product, Decimal::ZERO);
        assert_eq!(a.strategy_insight, StrategyInsight::OptimalMargin);
        assert_eq!(a.risk_factors, vec!["Stock below minimum threshold".to_string()]);
    }

    #[test]
    fn test_scenarios() {
        let product = kurta();
        let term = PaymentTerm {
            id: Uuid::now_v7(), term_name: "Immediate Payment".into(), net_days: 0, early_payment_discount: false,
            discount_percentage: Percentage::ZERO, discount_days: 0,
            early_pay_discount_computation: Default::default(), is_active: true,
        };
        let calc = ProfitCalculator::new(&product, &term, dec!(1), Percentage::new(dec!(2.5)).unwrap());
        let s = compare_scenarios(&calc, dec!(50));
        assert_eq!(s.len(), 3);
        assert!(s[0].is_profitable);
        assert!(!s[1].is_profitable);
        assert_eq!(s[2].discount_percentage, dec!(34.21));
        assert!(s[2].is_profitable);
    }
}
