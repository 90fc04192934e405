use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::extract::{AuthUser, ValidatedJson};
use crate::domain::aggregates::{Address, ContactType};
use crate::error::AppResult;
use crate::services::accounts::{self, AddressInput, LoginRequest, LoginResponse, Profile, RegisterRequest};
use crate::state::AppState;

pub async fn register(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<RegisterRequest>) -> AppResult<(StatusCode, Json<Profile>)> {
    Ok((StatusCode::CREATED, Json(accounts::register(&s, r, ContactType::Customer).await?)))
}

pub async fn register_vendor(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<RegisterRequest>) -> AppResult<(StatusCode, Json<Profile>)> {
    Ok((StatusCode::CREATED, Json(accounts::register(&s, r, ContactType::Vendor).await?)))
}

pub async fn login(State(s): State<AppState>, ValidatedJson(r): ValidatedJson<LoginRequest>) -> AppResult<Json<LoginResponse>> {
    Ok(Json(accounts::login(&s, r).await?))
}

pub async fn me(State(s): State<AppState>, AuthUser(c): AuthUser) -> AppResult<Json<Profile>> {
    Ok(Json(accounts::profile(&s, &c).await?))
}

pub async fn list_addresses(State(s): State<AppState>, AuthUser(c): AuthUser) -> AppResult<Json<Vec<Address>>> {
    Ok(Json(accounts::addresses(&s, &c).await?))
}

pub async fn create_address(State(s): State<AppState>, AuthUser(c): AuthUser, ValidatedJson(r): ValidatedJson<AddressInput>) -> AppResult<(StatusCode, Json<Address>)> {
    Ok((StatusCode::CREATED, Json(accounts::create_address(&s, &c, r).await?)))
}

pub async fn update_address(State(s): State<AppState>, AuthUser(c): AuthUser, Path(id): Path<Uuid>, ValidatedJson(r): ValidatedJson<AddressInput>) -> AppResult<Json<Address>> {
    Ok(Json(accounts::update_address(&s, &c, id, r).await?))
}

pub async fn delete_address(State(s): State<AppState>, AuthUser(c): AuthUser, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    accounts::delete_address(&s, &c, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
