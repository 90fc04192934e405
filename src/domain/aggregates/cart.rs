//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub selected_size: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
}

/// Identity of a cart line: the same product in another size or color is a separate line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineKey {
    pub product_id: Uuid,
    #[serde(default)]
    pub selected_size: Option<String>,
    #[serde(default)]
    pub selected_color: Option<String>,
}

impl CartItem {
    fn matches(&self, key: &CartLineKey) -> bool {
        self.product_id == key.product_id && self.selected_size == key.selected_size && self.selected_color == key.selected_color
    }

    pub fn key(&self) -> CartLineKey {
        CartLineKey { product_id: self.product_id, selected_size: self.selected_size.clone(), selected_color: self.selected_color.clone() }
    }
}

impl Cart {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self { id: Uuid::now_v7(), user_id, items: vec![], created_at: now, updated_at: now }
    }

    pub fn item_count(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn add_item(&mut self, item: CartItem) -> Result<(), CartError> {
        if item.quantity == 0 { return Err(CartError::InvalidQuantity); }
        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.matches(&key)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
        } else {
            self.items.push(item);
        }
        self.touch();
        Ok(())
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, key: &CartLineKey, quantity: u32) -> Result<(), CartError> {
        let pos = self.items.iter().position(|i| i.matches(key)).ok_or(CartError::ItemNotFound)?;
        if quantity == 0 { self.items.remove(pos); }
        else { self.items[pos].quantity = quantity; }
        self.touch();
        Ok(())
    }

    pub fn remove_item(&mut self, key: &CartLineKey) -> Result<(), CartError> {
        let before = self.items.len();
        self.items.retain(|i| !i.matches(key));
        if self.items.len() == before { return Err(CartError::ItemNotFound); }
        self.touch();
        Ok(())
    }

    pub fn clear(&mut self) { self.items.clear(); self.touch(); }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Item not found in cart")]
    ItemNotFound,
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: Uuid, quantity: u32, size: &str) -> CartItem {
        CartItem { product_id, quantity, selected_size: Some(size.into()), selected_color: None }
    }

    #[test]
    fn test_cart_operations() {
        let p1 = Uuid::now_v7();
        let mut cart = Cart::new(Uuid::now_v7());
        cart.add_item(item(p1, 2, "M")).unwrap();
        cart.add_item(item(p1, 1, "M")).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items[0].quantity, 3); // Merged
        cart.add_item(item(p1, 1, "L")).unwrap();
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let p1 = Uuid::now_v7();
        let mut cart = Cart::new(Uuid::now_v7());
        cart.add_item(item(p1, 2, "M")).unwrap();
        let key = cart.items[0].key();
        cart.update_quantity(&key, 5).unwrap();
        assert_eq!(cart.items[0].quantity, 5);
        cart.update_quantity(&key, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.update_quantity(&key, 1), Err(CartError::ItemNotFound));
        assert_eq!(cart.remove_item(&key), Err(CartError::ItemNotFound));
    }

    #[test]
    fn test_rejects_empty_add() {
        let mut cart = Cart::new(Uuid::now_v7());
        assert_eq!(cart.add_item(item(Uuid::now_v7(), 0, "S")), Err(CartError::InvalidQuantity));
    }
}
