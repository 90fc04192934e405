//! Request extractors: bearer-token users, vendor users and validated JSON bodies.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::{validate_token, TokenClaims};
use crate::domain::aggregates::{AccountError, Contact, User};
use crate::error::AppError;
use crate::state::AppState;

/// The caller identified by `Authorization: Bearer <token>`.
/// Usage in handlers: `async fn handler(AuthUser(claims): AuthUser)`
pub struct AuthUser(pub TokenClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("Authentication credentials were not provided".into()))?;
        validate_token(token.trim(), &state.config.jwt_secret).map(AuthUser)
    }
}

/// A caller allowed on the vendor dashboard, checked against the stored user and contact
/// rather than the token's snapshot.
pub struct VendorUser {
    pub user: User,
    pub contact: Option<Contact>,
}

#[async_trait]
impl FromRequestParts<AppState> for VendorUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        let user = state.store.user(claims.sub).await?
            .filter(|u| u.is_active)
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;
        let contact = match user.contact_id {
            Some(id) => state.store.contact(id).await?,
            None => None,
        };
        if !user.can_use_vendor_dashboard(contact.as_ref()) {
            return Err(AccountError::NotVendor.into());
        }
        Ok(VendorUser { user, contact })
    }
}

/// JSON body that has passed its `validator` rules.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
