use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::domain::aggregates::{
    AccountError, CartError, CouponError, InvoiceError, OrderError, ProductError, PurchaseError,
};
use crate::domain::ports::StoreError;
use crate::domain::value_objects::{PercentageError, SkuError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BusinessRule(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(what: impl std::fmt::Display) -> Self { Self::NotFound(format!("{what} not found")) }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::BusinessRule(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), detail = %self, "request rejected");
        }
        let detail = match &self {
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => AppError::not_found(what),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Stale(_) => AppError::Conflict(e.to_string()),
            StoreError::Stock(e) => e.into(),
            StoreError::Coupon(e) => e.into(),
            StoreError::Sequence(_) | StoreError::Backend(_) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<ProductError> for AppError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::InsufficientStock { .. } => AppError::Conflict(e.to_string()),
            ProductError::UnknownCategory(_) | ProductError::UnknownType(_) | ProductError::UnknownGroup(_)
            | ProductError::MissingName | ProductError::NegativePrice | ProductError::NegativeStock => {
                AppError::Validation(e.to_string())
            }
            ProductError::NotPriced | ProductError::Archived => AppError::BusinessRule(e.to_string()),
        }
    }
}

impl From<CouponError> for AppError {
    fn from(e: CouponError) -> Self {
        match e {
            CouponError::Invalid => AppError::NotFound(e.to_string()),
            CouponError::InvalidWindow | CouponError::ZeroDiscount => AppError::Validation(e.to_string()),
            CouponError::Expired | CouponError::NotYetActive | CouponError::AlreadyUsed => AppError::BusinessRule(e.to_string()),
        }
    }
}

impl From<CartError> for AppError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ItemNotFound => AppError::NotFound(e.to_string()),
            CartError::InvalidQuantity => AppError::Validation(e.to_string()),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self { AppError::BusinessRule(e.to_string()) }
}

impl From<InvoiceError> for AppError {
    fn from(e: InvoiceError) -> Self { AppError::BusinessRule(e.to_string()) }
}

impl From<PurchaseError> for AppError {
    fn from(e: PurchaseError) -> Self { AppError::BusinessRule(e.to_string()) }
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::UsernameTaken | AccountError::EmailTaken => AppError::Conflict(e.to_string()),
            AccountError::InvalidCredentials => AppError::Unauthorized(e.to_string()),
            AccountError::NotVendor => AppError::Forbidden(e.to_string()),
            AccountError::NoContact => AppError::BusinessRule(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self { AppError::Validation(e.to_string()) }
}

impl From<SkuError> for AppError {
    fn from(e: SkuError) -> Self { AppError::Validation(e.to_string()) }
}

impl From<PercentageError> for AppError {
    fn from(e: PercentageError) -> Self { AppError::Validation(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(CouponError::Invalid).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(CouponError::Expired).status(), StatusCode::BAD_REQUEST);
        let stock = ProductError::InsufficientStock { code: "KUR-001".into(), available: Decimal::ONE, requested: Decimal::TWO };
        assert_eq!(AppError::from(StoreError::Stock(stock)).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(StoreError::Sequence("refund".into())).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::from(AccountError::InvalidCredentials).status(), StatusCode::UNAUTHORIZED);
    }
}
