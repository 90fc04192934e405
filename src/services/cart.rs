//! Shopping cart and its priced quote

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{pricing, today};
use crate::domain::aggregates::{
    AppliedCoupon, Cart, CartItem, CartLineKey, OrderTotals, Product, SalesOrderLine,
};
use crate::domain::value_objects::Percentage;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct QuoteLine {
    #[serde(flatten)]
    pub line: SalesOrderLine,
    pub cart_quantity: u32,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CartQuote {
    pub cart_id: Uuid,
    pub items: Vec<QuoteLine>,
    /// Lines whose product was archived, unpublished or removed.
    pub unavailable: Vec<CartItem>,
    pub coupon: Option<AppliedCoupon>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub item_count: usize,
}

/// Prices `cart` against the current catalog.
pub async fn quote(state: &AppState, cart: &Cart, coupon_code: Option<&str>) -> AppResult<CartQuote> {
    let coupon = match coupon_code.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(pricing::applied_coupon(state, code, today()).await?),
        None => None,
    };
    let ids: Vec<Uuid> = cart.items.iter().map(|i| i.product_id).collect();
    let products = state.store.products_by_ids(&ids).await?;

    let mut items = Vec::new();
    let mut unavailable = Vec::new();
    for item in &cart.items {
        match products.iter().find(|p| p.id == item.product_id && p.is_purchasable()) {
            Some(product) => items.push(quote_line(items.len() as i32 + 1, product, item)),
            None => unavailable.push(item.clone()),
        }
    }
    let lines: Vec<SalesOrderLine> = items.iter().map(|q| q.line.clone()).collect();
    let discount = coupon.as_ref().map(AppliedCoupon::percentage).unwrap_or(Percentage::ZERO);
    let totals = OrderTotals::compute(&lines, discount, &state.config.delivery);
    Ok(CartQuote { cart_id: cart.id, item_count: cart.item_count(), items, unavailable, coupon, totals })
}

fn quote_line(line_number: i32, product: &Product, item: &CartItem) -> QuoteLine {
    QuoteLine {
        line: SalesOrderLine::price(
            line_number, product, Decimal::from(item.quantity), item.selected_size.clone(), item.selected_color.clone(),
        ),
        cart_quantity: item.quantity,
        image_url: product.primary_image().map(|i| i.image_url.clone()),
    }
}

pub async fn load(state: &AppState, user_id: Uuid) -> AppResult<Cart> {
    Ok(state.store.cart(user_id).await?.unwrap_or_else(|| Cart::new(user_id)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 999))]
    pub quantity: u32,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
}

pub async fn add_item(state: &AppState, user_id: Uuid, req: AddItem) -> AppResult<CartQuote> {
    let available = state.store.product(req.product_id).await?.is_some_and(|p| p.is_purchasable());
    if !available {
        return Err(AppError::not_found("Product"));
    }
    let mut cart = load(state, user_id).await?;
    cart.add_item(CartItem {
        product_id: req.product_id, quantity: req.quantity,
        selected_size: req.selected_size, selected_color: req.selected_color,
    })?;
    state.store.save_cart(&cart).await?;
    info!(%user_id, product_id = %req.product_id, quantity = req.quantity, "cart item added");
    quote(state, &cart, None).await
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItem {
    #[serde(flatten)]
    pub key: CartLineKey,
    #[validate(range(max = 999))]
    pub quantity: u32,
}

pub async fn update_item(state: &AppState, user_id: Uuid, req: UpdateItem) -> AppResult<CartQuote> {
    let mut cart = load(state, user_id).await?;
    cart.update_quantity(&req.key, req.quantity)?;
    state.store.save_cart(&cart).await?;
    quote(state, &cart, None).await
}

pub async fn remove_item(state: &AppState, user_id: Uuid, key: CartLineKey) -> AppResult<CartQuote> {
    let mut cart = load(state, user_id).await?;
    cart.remove_item(&key)?;
    state.store.save_cart(&cart).await?;
    quote(state, &cart, None).await
}

pub async fn clear(state: &AppState, user_id: Uuid) -> AppResult<()> {
    let mut cart = load(state, user_id).await?;
    cart.clear();
    state.store.save_cart(&cart).await?;
    info!(%user_id, "cart cleared");
    Ok(())
}
