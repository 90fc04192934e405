use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::aggregates::{StockChange, StockMovement};
use crate::domain::events::DomainEvent;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub async fn movements(state: &AppState, product_id: Option<Uuid>) -> AppResult<Vec<StockMovement>> {
    Ok(state.store.movements(product_id).await?)
}

fn non_zero(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_zero() { Err(ValidationError::new("must_not_be_zero")) } else { Ok(()) }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StockAdjustment {
    pub product_id: Uuid,
    /// Signed: negative removes stock.
    #[validate(custom = "non_zero")]
    pub quantity: Decimal,
    #[validate(length(min = 1, max = 500))]
    pub notes: String,
}

pub async fn adjust(state: &AppState, req: StockAdjustment, by: Uuid) -> AppResult<StockMovement> {
    if state.store.product(req.product_id).await?.is_none() {
        return Err(AppError::not_found("Product"));
    }
    let change = StockChange::adjustment(req.product_id, req.quantity, Some(req.notes), Some(by));
    let movement = state.store.apply_stock_changes(vec![change]).await?
        .pop()
        .ok_or_else(|| AppError::Internal("adjustment produced no movement".into()))?;
    info!(
        product_id = %movement.product_id, direction = movement.direction.as_str(), quantity = %movement.quantity,
        stock_after = %movement.stock_after, "stock adjusted"
    );
    state.events.publish(DomainEvent::from(&movement)).await;
    Ok(movement)
}
