//! Payment terms, discount offers and coupon codes

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{non_negative, percentage, positive, today};
use crate::domain::aggregates::{
    AppliedCoupon, Coupon, CouponError, DiscountOffer, EarlyPayComputation, OfferChannel, PaymentTerm,
};
use crate::domain::value_objects::Percentage;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const MAX_COUPON_BATCH: u32 = 500;

/// Looks up `raw_code` and checks it can be used on `on`.
pub async fn applied_coupon(state: &AppState, raw_code: &str, on: NaiveDate) -> AppResult<AppliedCoupon> {
    let code = Coupon::normalize_code(raw_code);
    let (coupon, offer) = state.store.coupon_by_code(&code).await?.ok_or(CouponError::Invalid)?;
    coupon.check(&offer, on)?;
    Ok(AppliedCoupon { coupon, discount_offer: offer })
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateCoupon {
    #[validate(length(min = 1, max = 50))]
    pub coupon_code: String,
}

#[derive(Debug, Serialize)]
pub struct CouponValidation {
    pub valid: bool,
    pub coupon: AppliedCoupon,
}

pub async fn validate_coupon(state: &AppState, req: ValidateCoupon) -> AppResult<CouponValidation> {
    let coupon = applied_coupon(state, &req.coupon_code, today()).await?;
    Ok(CouponValidation { valid: true, coupon })
}

pub async fn active_terms(state: &AppState) -> AppResult<Vec<PaymentTerm>> {
    Ok(state.store.payment_terms(true).await?)
}

/// An active term, 404 otherwise.
pub async fn active_term(state: &AppState, id: Uuid) -> AppResult<PaymentTerm> {
    state.store.payment_term(id).await?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::not_found("Payment term"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentTerm {
    #[validate(length(min = 1, max = 100))]
    pub term_name: String,
    #[validate(range(min = 0, max = 3650))]
    pub net_days: i32,
    #[serde(default)]
    pub early_payment_discount: bool,
    #[validate(custom = "non_negative")]
    pub discount_percentage: Option<Decimal>,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub discount_days: i32,
    #[serde(default)]
    pub early_pay_discount_computation: EarlyPayComputation,
}

pub async fn create_term(state: &AppState, req: CreatePaymentTerm) -> AppResult<PaymentTerm> {
    if req.discount_days > req.net_days {
        return Err(AppError::Validation("discount_days must not exceed net_days".into()));
    }
    let term = PaymentTerm {
        id: Uuid::now_v7(),
        term_name: req.term_name.trim().to_string(),
        net_days: req.net_days,
        early_payment_discount: req.early_payment_discount,
        discount_percentage: percentage(req.discount_percentage)?,
        discount_days: req.discount_days,
        early_pay_discount_computation: req.early_pay_discount_computation,
        is_active: true,
    };
    state.store.insert_payment_term(&term).await?;
    info!(term = %term.term_name, "payment term created");
    Ok(term)
}

pub async fn offers(state: &AppState) -> AppResult<Vec<DiscountOffer>> {
    Ok(state.store.offers().await?)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOffer {
    #[validate(length(min = 1, max = 200))]
    pub offer_name: String,
    #[validate(custom = "positive")]
    pub discount_percentage: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available_on: OfferChannel,
}

pub async fn create_offer(state: &AppState, req: CreateOffer, by: Uuid) -> AppResult<DiscountOffer> {
    let offer = DiscountOffer::create(
        req.offer_name.trim(), Percentage::new(req.discount_percentage)?, req.start_date, req.end_date,
        req.available_on, Some(by),
    )?;
    state.store.insert_offer(&offer).await?;
    info!(offer_id = %offer.id, name = %offer.offer_name, "discount offer created");
    Ok(offer)
}

pub async fn coupons(state: &AppState, offer_id: Option<Uuid>) -> AppResult<Vec<Coupon>> {
    Ok(state.store.coupons(offer_id).await?)
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateCoupons {
    pub offer_id: Uuid,
    #[validate(range(min = 1, max = 500))]
    pub count: u32,
    #[validate(length(min = 1, max = 10))]
    pub prefix: String,
    /// Defaults to the offer's end date.
    pub expiration_date: Option<NaiveDate>,
    #[validate(range(min = 1))]
    pub max_usage_count: Option<i32>,
}

pub async fn generate_coupons(state: &AppState, req: GenerateCoupons) -> AppResult<Vec<Coupon>> {
    let offer = state.store.offer(req.offer_id).await?.ok_or_else(|| AppError::not_found("Discount offer"))?;
    let expires = req.expiration_date.unwrap_or(offer.end_date);
    let prefix = req.prefix.trim();
    let count = req.count.min(MAX_COUPON_BATCH) as usize;
    let mut coupons: Vec<Coupon> = Vec::with_capacity(count);
    while coupons.len() < count {
        let coupon = Coupon::generate(&offer, prefix, expires, req.max_usage_count.unwrap_or(1));
        if !coupons.iter().any(|c| c.coupon_code == coupon.coupon_code) {
            coupons.push(coupon);
        }
    }
    state.store.insert_coupons(&coupons).await?;
    info!(offer_id = %offer.id, count, "coupons generated");
    Ok(coupons)
}
