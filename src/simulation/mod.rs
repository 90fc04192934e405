//! Profit simulation for the vendor dashboard: what a sale of one product
//! earns under a coupon and a payment term, and how far the discount can go.

pub mod advisor;
pub mod calculator;

pub use advisor::{compare_scenarios, Advisor, MarginAnalysis, MarginHealth, Scenario, StrategyInsight};
pub use calculator::{ProfitCalculator, Waterfall};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{Coupon, CouponStatus};
use crate::domain::value_objects::round_quantity;
use crate::error::{AppError, AppResult};
use crate::services::{positive, today};
use crate::state::AppState;

fn one() -> Decimal { Decimal::ONE }

#[derive(Debug, Deserialize, Validate)]
pub struct SimulationRequest {
    pub product_id: Uuid,
    pub coupon_code: Option<String>,
    pub payment_term_id: Uuid,
    #[serde(default = "one")]
    #[validate(custom = "positive")]
    pub quantity: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ProductInfo {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_code: String,
    pub current_stock: Decimal,
    pub quantity_simulated: Decimal,
    pub coupon_applied: Option<String>,
    pub discount_percentage: Decimal,
    pub payment_term: String,
}

#[derive(Debug, Serialize)]
pub struct SimulationResponse {
    pub product_info: ProductInfo,
    pub waterfall: Waterfall,
    pub margin_analysis: MarginAnalysis,
    pub scenarios: Vec<Scenario>,
    pub timestamp: DateTime<Utc>,
}

/// Discount percentage of a coupon that is unused and whose offer runs today.
async fn coupon_discount(state: &AppState, raw_code: &str) -> AppResult<Decimal> {
    let code = Coupon::normalize_code(raw_code);
    let day = today();
    state.store.coupon_by_code(&code).await?
        .filter(|(c, o)| c.is_active && c.coupon_status == CouponStatus::Unused && o.is_active && o.covers(day))
        .map(|(_, o)| o.discount_percentage.value())
        .ok_or_else(|| AppError::NotFound(format!("Coupon '{raw_code}' not found or expired")))
}

pub async fn simulate(state: &AppState, req: SimulationRequest) -> AppResult<SimulationResponse> {
    let product = state.store.product(req.product_id).await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::NotFound(format!("Product {} not found or inactive", req.product_id)))?;
    let coupon_code = req.coupon_code.filter(|c| !c.trim().is_empty());
    let discount = match coupon_code.as_deref() {
        Some(code) => coupon_discount(state, code).await?,
        None => Decimal::ZERO,
    };
    let term = state.store.payment_term(req.payment_term_id).await?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::NotFound(format!("Payment term {} not found", req.payment_term_id)))?;

    let quantity = round_quantity(req.quantity);
    let calc = ProfitCalculator::new(&product, &term, quantity, state.config.operational_fee);
    let waterfall = calc.waterfall(discount);
    let advisor = Advisor {
        liquidation_threshold: state.config.liquidation_threshold,
        currency_symbol: &state.config.currency_symbol,
    };
    let margin_analysis = advisor.analyze(&waterfall, &product, discount);
    let scenarios = compare_scenarios(&calc, discount);
    info!(
        product = %product.code, %quantity, %discount, net_profit = %waterfall.net_profit,
        strategy = ?margin_analysis.strategy_insight, "profit simulated"
    );

    Ok(SimulationResponse {
        product_info: ProductInfo {
            product_id: product.id,
            product_name: product.name.clone(),
            product_code: product.code.to_string(),
            current_stock: product.current_stock,
            quantity_simulated: quantity,
            coupon_applied: coupon_code,
            discount_percentage: discount,
            payment_term: term.term_name.clone(),
        },
        waterfall,
        margin_analysis,
        scenarios,
        timestamp: Utc::now(),
    })
}
