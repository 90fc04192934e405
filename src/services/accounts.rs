//! Registration, login, profile, saved addresses and dashboard contacts

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::phone;
use crate::auth::{generate_access_token, hash_password, verify_password, TokenClaims};
use crate::domain::aggregates::{
    AccountError, Address, Contact, ContactChanges, ContactType, PostalFields, User,
};
use crate::domain::aggregates::contact::DEFAULT_COUNTRY;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub contact_name: String,
    #[validate(custom = "phone")]
    pub mobile: Option<String>,
    #[serde(flatten)]
    pub postal: PostalFields,
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub user: User,
    pub contact: Option<Contact>,
    pub is_vendor: bool,
}

/// Creates a portal login with a contact of `kind`.
pub async fn register(state: &AppState, req: RegisterRequest, kind: ContactType) -> AppResult<Profile> {
    let password_hash = hash_password(&req.password)?;
    let contact = Contact::new(req.contact_name.trim(), kind, req.email.as_str(), req.mobile, req.postal);
    let user = User::portal(req.username, req.email, password_hash, contact.id);
    state.store.register(&user, &contact).await?;
    info!(username = %user.username, contact_type = kind.as_str(), "account registered");
    let is_vendor = user.can_use_vendor_dashboard(Some(&contact));
    Ok(Profile { user, contact: Some(contact), is_vendor })
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    #[serde(flatten)]
    pub profile: Profile,
}

pub async fn login(state: &AppState, req: LoginRequest) -> AppResult<LoginResponse> {
    let user = match state.store.user_by_username(req.username.trim()).await? {
        Some(u) if u.is_active && verify_password(&req.password, &u.password_hash) => u,
        _ => {
            warn!(username = %req.username, "login rejected");
            return Err(AccountError::InvalidCredentials.into());
        }
    };
    let contact = match user.contact_id {
        Some(id) => state.store.contact(id).await?,
        None => None,
    };
    let is_vendor = user.can_use_vendor_dashboard(contact.as_ref());
    let access_token = generate_access_token(&user, is_vendor, &state.config.jwt_secret, state.config.jwt_ttl_hours)?;
    let now = Utc::now();
    state.store.touch_login(user.id, now).await?;
    info!(username = %user.username, vendor = is_vendor, "user logged in");

    let user = User { last_login: Some(now), ..user };
    Ok(LoginResponse { access_token, token_type: "bearer", profile: Profile { user, contact, is_vendor } })
}

pub async fn profile(state: &AppState, claims: &TokenClaims) -> AppResult<Profile> {
    let user = state.store.user(claims.sub).await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;
    let contact = match user.contact_id {
        Some(id) => state.store.contact(id).await?,
        None => None,
    };
    let is_vendor = user.can_use_vendor_dashboard(contact.as_ref());
    Ok(Profile { user, contact, is_vendor })
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressInput {
    #[validate(length(min = 1, max = 50))]
    pub label: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub address_line1: String,
    #[validate(length(max = 255))]
    pub address_line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(max = 10))]
    pub pincode: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub is_default_shipping: bool,
    #[serde(default)]
    pub is_default_billing: bool,
}

pub async fn addresses(state: &AppState, claims: &TokenClaims) -> AppResult<Vec<Address>> {
    let contact_id = claims.contact.ok_or(AccountError::NoContact)?;
    Ok(state.store.addresses(contact_id).await?)
}

pub async fn create_address(state: &AppState, claims: &TokenClaims, req: AddressInput) -> AppResult<Address> {
    let contact_id = claims.contact.ok_or(AccountError::NoContact)?;
    // the first address becomes the default for both uses
    let first = state.store.addresses(contact_id).await?.is_empty();
    let address = Address {
        id: Uuid::now_v7(),
        contact_id,
        label: req.label.unwrap_or_else(|| "Home".to_string()),
        address_line1: req.address_line1,
        address_line2: req.address_line2,
        city: req.city,
        state: req.state,
        pincode: req.pincode,
        country: req.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        is_default_shipping: req.is_default_shipping || first,
        is_default_billing: req.is_default_billing || first,
        created_at: Utc::now(),
    };
    state.store.save_address(&address).await?;
    info!(%contact_id, address_id = %address.id, "address saved");
    Ok(address)
}

pub async fn update_address(state: &AppState, claims: &TokenClaims, id: Uuid, req: AddressInput) -> AppResult<Address> {
    let contact_id = claims.contact.ok_or(AccountError::NoContact)?;
    let existing = state.store.address(id).await?
        .filter(|a| a.contact_id == contact_id)
        .ok_or_else(|| AppError::not_found("Address"))?;
    let address = Address {
        label: req.label.unwrap_or(existing.label),
        address_line1: req.address_line1,
        address_line2: req.address_line2,
        city: req.city,
        state: req.state,
        pincode: req.pincode,
        country: req.country.unwrap_or(existing.country),
        is_default_shipping: req.is_default_shipping,
        is_default_billing: req.is_default_billing,
        ..existing
    };
    state.store.save_address(&address).await?;
    Ok(address)
}

pub async fn delete_address(state: &AppState, claims: &TokenClaims, id: Uuid) -> AppResult<()> {
    let contact_id = claims.contact.ok_or(AccountError::NoContact)?;
    if !state.store.delete_address(contact_id, id).await? {
        return Err(AppError::not_found("Address"));
    }
    info!(%contact_id, address_id = %id, "address deleted");
    Ok(())
}

pub async fn contacts(state: &AppState, kind: Option<ContactType>) -> AppResult<Vec<Contact>> {
    Ok(state.store.contacts(kind).await?)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateContact {
    #[validate(length(min = 1, max = 200))]
    pub contact_name: String,
    pub contact_type: ContactType,
    #[validate(email)]
    pub email: String,
    #[validate(custom = "phone")]
    pub mobile: Option<String>,
    #[serde(flatten)]
    pub postal: PostalFields,
}

pub async fn create_contact(state: &AppState, req: CreateContact) -> AppResult<Contact> {
    let contact = Contact::new(req.contact_name.trim(), req.contact_type, req.email, req.mobile, req.postal);
    state.store.insert_contact(&contact).await?;
    info!(contact_id = %contact.id, contact_type = contact.contact_type.as_str(), "contact created");
    Ok(contact)
}

pub async fn update_contact(state: &AppState, id: Uuid, changes: ContactChanges) -> AppResult<Contact> {
    if changes.mobile.as_deref().is_some_and(|m| phone(m).is_err()) {
        return Err(AppError::Validation("mobile: invalid_mobile".into()));
    }
    if changes.contact_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation("contact_name must not be empty".into()));
    }
    let mut contact = state.store.contact(id).await?.ok_or_else(|| AppError::not_found("Contact"))?;
    contact.apply(changes);
    state.store.update_contact(&contact).await?;
    info!(contact_id = %contact.id, "contact updated");
    Ok(contact)
}
