//! Payment terms, discount offers and coupon codes

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::{distributions::Alphanumeric, Rng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::Percentage;

/// What the early-payment discount percentage is applied to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarlyPayComputation {
    /// Untaxed amount.
    #[default]
    BaseAmount,
    /// Amount including tax.
    TotalAmount,
}

impl EarlyPayComputation {
    pub fn as_str(&self) -> &'static str {
        match self { Self::BaseAmount => "base_amount", Self::TotalAmount => "total_amount" }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s { "base_amount" => Some(Self::BaseAmount), "total_amount" => Some(Self::TotalAmount), _ => None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentTerm {
    pub id: Uuid,
    pub term_name: String,
    pub net_days: i32,
    pub early_payment_discount: bool,
    pub discount_percentage: Percentage,
    pub discount_days: i32,
    pub early_pay_discount_computation: EarlyPayComputation,
    pub is_active: bool,
}

impl PaymentTerm {
    pub fn due_date(&self, from: NaiveDate) -> NaiveDate { from + Duration::days(i64::from(self.net_days)) }

    pub fn early_payment_deadline(&self, from: NaiveDate) -> Option<NaiveDate> {
        self.early_payment_discount.then(|| from + Duration::days(i64::from(self.discount_days)))
    }

    /// Cost of the early-payment discount for an untaxed `base` and its `tax`.
    pub fn early_payment_discount_on(&self, base: Decimal, tax: Decimal) -> Decimal {
        if !self.early_payment_discount { return Decimal::ZERO; }
        let basis = match self.early_pay_discount_computation {
            EarlyPayComputation::BaseAmount => base,
            EarlyPayComputation::TotalAmount => base + tax,
        };
        self.discount_percentage.of(basis)
    }
}

/// Sales channel an offer may be redeemed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferChannel { Sales, Website, Both }

impl OfferChannel {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Sales => "sales", Self::Website => "website", Self::Both => "both" }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s { "sales" => Some(Self::Sales), "website" => Some(Self::Website), "both" => Some(Self::Both), _ => None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiscountOffer {
    pub id: Uuid,
    pub offer_name: String,
    pub discount_percentage: Percentage,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available_on: OfferChannel,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl DiscountOffer {
    pub fn create(
        name: impl Into<String>, discount: Percentage, start_date: NaiveDate, end_date: NaiveDate,
        available_on: OfferChannel, created_by: Option<Uuid>,
    ) -> Result<Self, CouponError> {
        if start_date > end_date { return Err(CouponError::InvalidWindow); }
        if discount.is_zero() { return Err(CouponError::ZeroDiscount); }
        Ok(Self {
            id: Uuid::now_v7(), offer_name: name.into(), discount_percentage: discount,
            start_date, end_date, available_on, is_active: true, created_by, created_at: Utc::now(),
        })
    }

    pub fn covers(&self, day: NaiveDate) -> bool { self.start_date <= day && day <= self.end_date }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus { #[default] Unused, Used, Expired }

impl CouponStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Unused => "unused", Self::Used => "used", Self::Expired => "expired" }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s { "unused" => Some(Self::Unused), "used" => Some(Self::Used), "expired" => Some(Self::Expired), _ => None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub coupon_code: String,
    pub expiration_date: NaiveDate,
    pub coupon_status: CouponStatus,
    pub contact_id: Option<Uuid>,
    pub usage_count: i32,
    pub max_usage_count: i32,
    pub is_active: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn normalize_code(raw: &str) -> String { raw.trim().to_uppercase() }

    /// Generates a fresh single-offer coupon `<PREFIX>-<8 alphanumerics>`.
    pub fn generate(offer: &DiscountOffer, prefix: &str, expiration_date: NaiveDate, max_usage_count: i32) -> Self {
        let suffix: String = rand::thread_rng().sample_iter(&Alphanumeric).take(8).map(char::from).collect();
        Self {
            id: Uuid::now_v7(), offer_id: offer.id,
            coupon_code: Self::normalize_code(&format!("{prefix}-{suffix}")),
            expiration_date, coupon_status: CouponStatus::Unused, contact_id: None,
            usage_count: 0, max_usage_count: max_usage_count.max(1), is_active: true, used_at: None,
            created_at: Utc::now(),
        }
    }

    /// Checks the coupon against its offer on `today`, in the order customers see the failures.
    pub fn check(&self, offer: &DiscountOffer, today: NaiveDate) -> Result<(), CouponError> {
        if !self.is_active || !offer.is_active || self.offer_id != offer.id { return Err(CouponError::Invalid); }
        if self.expiration_date < today || self.coupon_status == CouponStatus::Expired || today > offer.end_date {
            return Err(CouponError::Expired);
        }
        if today < offer.start_date { return Err(CouponError::NotYetActive); }
        if self.usage_count >= self.max_usage_count || self.coupon_status == CouponStatus::Used {
            return Err(CouponError::AlreadyUsed);
        }
        Ok(())
    }

    pub fn redeem(&mut self, at: DateTime<Utc>) -> Result<(), CouponError> {
        if self.usage_count >= self.max_usage_count || self.coupon_status != CouponStatus::Unused {
            return Err(CouponError::AlreadyUsed);
        }
        self.usage_count += 1;
        if self.usage_count >= self.max_usage_count {
            self.coupon_status = CouponStatus::Used;
            self.used_at = Some(at);
        }
        Ok(())
    }
}

/// A coupon that passed [`Coupon::check`], paired with its offer.
#[derive(Clone, Debug, Serialize)]
pub struct AppliedCoupon {
    #[serde(flatten)]
    pub coupon: Coupon,
    pub discount_offer: DiscountOffer,
}

impl AppliedCoupon {
    pub fn percentage(&self) -> Percentage { self.discount_offer.discount_percentage }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Invalid coupon")]
    Invalid,
    #[error("Coupon expired")]
    Expired,
    #[error("Offer not yet active")]
    NotYetActive,
    #[error("Coupon already used")]
    AlreadyUsed,
    #[error("offer start date must not be after its end date")]
    InvalidWindow,
    #[error("offer discount must be greater than zero")]
    ZeroDiscount,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn day(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

    pub(crate) fn festive_offer() -> DiscountOffer {
        DiscountOffer::create("Festive", Percentage::new(dec!(20)).unwrap(), day("2026-10-01"), day("2026-10-31"), OfferChannel::Both, None).unwrap()
    }

    pub(crate) fn net_15_with_early_discount() -> PaymentTerm {
        PaymentTerm {
            id: Uuid::now_v7(), term_name: "15 Days, 2% within 7".into(), net_days: 15,
            early_payment_discount: true, discount_percentage: Percentage::new(dec!(2)).unwrap(), discount_days: 7,
            early_pay_discount_computation: EarlyPayComputation::BaseAmount, is_active: true,
        }
    }

    #[test]
    fn test_term_dates_and_discount() {
        let mut term = net_15_with_early_discount();
        assert_eq!(term.due_date(day("2026-10-17")), day("2026-11-01"));
        assert_eq!(term.early_payment_deadline(day("2026-10-17")), Some(day("2026-10-24")));
        assert_eq!(term.early_payment_discount_on(dec!(1000), dec!(50)), dec!(20.00));
        term.early_pay_discount_computation = EarlyPayComputation::TotalAmount;
        assert_eq!(term.early_payment_discount_on(dec!(1000), dec!(50)), dec!(21.00));
        term.early_payment_discount = false;
        assert_eq!(term.early_payment_discount_on(dec!(1000), dec!(50)), Decimal::ZERO);
        assert_eq!(term.early_payment_deadline(day("2026-10-17")), None);
    }

    #[test]
    fn test_coupon_check_order() {
        let offer = festive_offer();
        let mut coupon = Coupon::generate(&offer, "fest", day("2026-10-20"), 1);
        assert!(coupon.coupon_code.starts_with("FEST-"));
        assert_eq!(coupon.check(&offer, day("2026-10-17")), Ok(()));
        assert_eq!(coupon.check(&offer, day("2026-09-30")), Err(CouponError::NotYetActive));
        assert_eq!(coupon.check(&offer, day("2026-10-21")), Err(CouponError::Expired));
        coupon.redeem(Utc::now()).unwrap();
        assert_eq!(coupon.coupon_status, CouponStatus::Used);
        assert_eq!(coupon.check(&offer, day("2026-10-17")), Err(CouponError::AlreadyUsed));
        coupon.is_active = false;
        assert_eq!(coupon.check(&offer, day("2026-10-17")), Err(CouponError::Invalid));
    }

    #[test]
    fn test_multi_use_coupon_stays_unused_until_exhausted() {
        let offer = festive_offer();
        let mut coupon = Coupon::generate(&offer, "TEAM", day("2026-10-31"), 2);
        coupon.redeem(Utc::now()).unwrap();
        assert_eq!(coupon.coupon_status, CouponStatus::Unused);
        assert!(coupon.used_at.is_none());
        coupon.redeem(Utc::now()).unwrap();
        assert_eq!(coupon.coupon_status, CouponStatus::Used);
        assert_eq!(coupon.redeem(Utc::now()), Err(CouponError::AlreadyUsed));
    }

    #[test]
    fn test_offer_window_validation() {
        let err = DiscountOffer::create("Bad", Percentage::new(dec!(5)).unwrap(), day("2026-10-31"), day("2026-10-01"), OfferChannel::Website, None);
        assert_eq!(err.unwrap_err(), CouponError::InvalidWindow);
    }
}
