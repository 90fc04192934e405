//! Use cases. Each function loads aggregates through the store, applies the
//! domain rules, persists the outcome and publishes the resulting events.

pub mod accounts;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod purchasing;
pub mod reports;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

use crate::domain::value_objects::Percentage;
use crate::error::{AppError, AppResult};

/// Business date used for document dates, coupon windows and payment deadlines.
pub fn today() -> NaiveDate { Utc::now().date_naive() }

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Slices `items` to the requested page. `page` starts at 1; `per_page` defaults to 20 and caps at 100.
    pub fn of(items: Vec<T>, page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(20).clamp(1, 100);
        let total = items.len();
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let data = items.into_iter().skip(skip).take(per_page as usize).collect();
        Self { data, total, page, per_page }
    }
}

pub(crate) fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO { Ok(()) } else { Err(ValidationError::new("must_be_positive")) }
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO { Ok(()) } else { Err(ValidationError::new("must_not_be_negative")) }
}

pub(crate) fn phone(value: &str) -> Result<(), ValidationError> {
    let ok = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit() || "+() -".contains(c));
    if ok { Ok(()) } else { Err(ValidationError::new("invalid_mobile")) }
}

pub(crate) fn percentage(value: Option<Decimal>) -> AppResult<Percentage> {
    value.map(Percentage::new).transpose().map(Option::unwrap_or_default).map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        let page = Page::of((1..=45).collect::<Vec<_>>(), Some(3), None);
        assert_eq!((page.total, page.data.len()), (45, 5));
        assert_eq!(page.data[0], 41);
        let page = Page::of((1..=5).collect::<Vec<_>>(), Some(0), Some(500));
        assert_eq!((page.page, page.per_page, page.data.len()), (1, 100, 5));
    }

    #[test]
    fn test_mobile_format() {
        assert!(phone("+91 (20) 555-0101").is_ok());
        assert!(phone("call me").is_err());
    }
}
