//! Postgres adapter. Multi-row writes run inside one transaction each; stock and
//! balance updates are guarded in SQL so concurrent requests cannot overdraw them.

mod catalog;
mod ledger;
mod rows;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::{AccountError, ProductError, StockChange, StockMovement};
use crate::domain::ports::{
    format_document_number, InventoryRepository, SequenceRepository, StoreError, StoreResult,
};
use rows::{convert, MovementRow};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects and brings the schema up to date.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self { Self { pool } }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let message = match db.constraint() {
                    Some("users_username_key") => AccountError::UsernameTaken.to_string(),
                    Some("users_email_key" | "contacts_email_key") => AccountError::EmailTaken.to_string(),
                    Some("products_product_code_key") => "Product code already exists".to_string(),
                    Some("coupon_codes_coupon_code_key") => "Coupon code already exists".to_string(),
                    Some("payment_terms_term_name_key") => "Payment term already exists".to_string(),
                    _ => db.message().to_string(),
                };
                return StoreError::Conflict(message);
            }
        }
        StoreError::Backend(e.to_string())
    }
}

/// Shifts one product's stock, refusing to go below zero, and writes the ledger row.
async fn apply_stock(conn: &mut PgConnection, change: &StockChange) -> StoreResult<StockMovement> {
    let shifted: Option<(Decimal, Decimal)> = sqlx::query_as(
        "UPDATE products SET current_stock = current_stock + $2, updated_at = NOW() \
         WHERE id = $1 AND current_stock + $2 >= 0 \
         RETURNING current_stock - $2, current_stock",
    )
    .bind(change.product_id)
    .bind(change.delta)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((before, after)) = shifted else {
        let current: Option<(String, Decimal)> =
            sqlx::query_as("SELECT product_code, current_stock FROM products WHERE id = $1")
                .bind(change.product_id)
                .fetch_optional(&mut *conn)
                .await?;
        return Err(match current {
            Some((code, available)) => ProductError::InsufficientStock { code, available, requested: -change.delta }.into(),
            None => StoreError::NotFound("Product"),
        });
    };

    let movement = change.movement(before, after);
    sqlx::query(
        "INSERT INTO stock_movements (id, product_id, movement_type, direction, quantity, reference_type, reference_id, \
         stock_before, stock_after, notes, created_by, movement_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(movement.id)
    .bind(movement.product_id)
    .bind(movement.movement_type.as_str())
    .bind(movement.direction.as_str())
    .bind(movement.quantity)
    .bind(movement.reference_type.as_str())
    .bind(movement.reference_id)
    .bind(movement.stock_before)
    .bind(movement.stock_after)
    .bind(&movement.notes)
    .bind(movement.created_by)
    .bind(movement.movement_date)
    .execute(&mut *conn)
    .await?;
    Ok(movement)
}

async fn apply_all(conn: &mut PgConnection, changes: &[StockChange]) -> StoreResult<Vec<StockMovement>> {
    let mut movements = Vec::with_capacity(changes.len());
    for change in changes {
        movements.push(apply_stock(&mut *conn, change).await?);
    }
    Ok(movements)
}

#[async_trait]
impl InventoryRepository for PgStore {
    async fn apply_stock_changes(&self, changes: Vec<StockChange>) -> StoreResult<Vec<StockMovement>> {
        let mut tx = self.pool.begin().await?;
        let movements = apply_all(&mut tx, &changes).await?;
        tx.commit().await?;
        Ok(movements)
    }

    async fn movements(&self, product_id: Option<Uuid>) -> StoreResult<Vec<StockMovement>> {
        let rows: Vec<MovementRow> = sqlx::query_as(
            "SELECT * FROM stock_movements WHERE ($1::uuid IS NULL OR product_id = $1) ORDER BY movement_date DESC, id DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        convert(rows)
    }
}

#[async_trait]
impl SequenceRepository for PgStore {
    async fn next_document_number(&self, document_type: &str) -> StoreResult<String> {
        let row: Option<(String, i64, i32)> = sqlx::query_as(
            "UPDATE document_sequences SET next_number = next_number + 1 WHERE document_type = $1 \
             RETURNING prefix, next_number - 1, padding",
        )
        .bind(document_type)
        .fetch_optional(&self.pool)
        .await?;
        let (prefix, number, padding) = row.ok_or_else(|| StoreError::Sequence(document_type.to_string()))?;
        Ok(format_document_number(&prefix, number, usize::try_from(padding).unwrap_or(6)))
    }
}
