//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::value_objects::{round_quantity, Percentage, Sku};

/// Audience a garment is cut for. Surfaced to the storefront as "gender".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory { Men, Women, Children, Unisex }

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
            Self::Children => "children",
            Self::Unisex => "unisex",
        }
    }
}

impl FromStr for ProductCategory {
    type Err = ProductError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "men" => Ok(Self::Men),
            "women" => Ok(Self::Women),
            "children" => Ok(Self::Children),
            "unisex" => Ok(Self::Unisex),
            other => Err(ProductError::UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "shirt")] Shirt,
    #[serde(rename = "pant")] Pant,
    #[serde(rename = "kurta")] Kurta,
    #[serde(rename = "t-shirt")] TShirt,
    #[serde(rename = "jeans")] Jeans,
    #[serde(rename = "dress")] Dress,
    #[serde(rename = "other")] Other,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shirt => "shirt",
            Self::Pant => "pant",
            Self::Kurta => "kurta",
            Self::TShirt => "t-shirt",
            Self::Jeans => "jeans",
            Self::Dress => "dress",
            Self::Other => "other",
        }
    }

    /// Broad storefront grouping for the type.
    pub fn group(&self) -> ProductGroup {
        match self {
            Self::Pant | Self::Jeans => ProductGroup::Bottomwear,
            Self::Shirt | Self::TShirt | Self::Kurta | Self::Dress => ProductGroup::Topwear,
            Self::Other => ProductGroup::Accessories,
        }
    }
}

impl FromStr for ProductType {
    type Err = ProductError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shirt" => Ok(Self::Shirt),
            "pant" => Ok(Self::Pant),
            "kurta" => Ok(Self::Kurta),
            "t-shirt" => Ok(Self::TShirt),
            "jeans" => Ok(Self::Jeans),
            "dress" => Ok(Self::Dress),
            "other" => Ok(Self::Other),
            other => Err(ProductError::UnknownType(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductGroup { Topwear, Bottomwear, Accessories }

impl FromStr for ProductGroup {
    type Err = ProductError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "topwear" => Ok(Self::Topwear),
            "bottomwear" => Ok(Self::Bottomwear),
            "accessories" => Ok(Self::Accessories),
            other => Err(ProductError::UnknownGroup(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductColor {
    pub color_name: String,
    #[serde(default)]
    pub color_code: Option<String>,
    #[serde(default)]
    pub display_order: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub image_url: String,
    #[serde(default)]
    pub image_alt_text: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    #[serde(rename = "product_code")]
    pub code: Sku,
    #[serde(rename = "product_name")]
    pub name: String,
    #[serde(rename = "product_category")]
    pub category: ProductCategory,
    pub product_type: ProductType,
    pub material: Option<String>,
    pub description: Option<String>,
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
    pub sales_price: Decimal,
    pub sales_tax_percentage: Percentage,
    pub purchase_price: Decimal,
    pub purchase_tax_percentage: Percentage,
    pub colors: Vec<ProductColor>,
    pub images: Vec<ProductImage>,
    pub is_published: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything a vendor supplies when listing a new product.
#[derive(Clone, Debug)]
pub struct NewProduct {
    pub code: Sku,
    pub name: String,
    pub category: ProductCategory,
    pub product_type: ProductType,
    pub material: Option<String>,
    pub description: Option<String>,
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
    pub sales_price: Decimal,
    pub sales_tax_percentage: Percentage,
    pub purchase_price: Decimal,
    pub purchase_tax_percentage: Percentage,
    pub colors: Vec<ProductColor>,
    pub images: Vec<ProductImage>,
}

/// Partial edit; `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
    pub product_type: Option<ProductType>,
    pub material: Option<String>,
    pub description: Option<String>,
    pub minimum_stock: Option<Decimal>,
    pub sales_price: Option<Decimal>,
    pub sales_tax_percentage: Option<Percentage>,
    pub purchase_price: Option<Decimal>,
    pub purchase_tax_percentage: Option<Percentage>,
    pub colors: Option<Vec<ProductColor>>,
    pub images: Option<Vec<ProductImage>>,
}

impl Product {
    pub fn create(new: NewProduct) -> Result<Self, ProductError> {
        let name = new.name.trim().to_string();
        if name.is_empty() { return Err(ProductError::MissingName); }
        ensure_price(new.sales_price)?;
        ensure_price(new.purchase_price)?;
        if new.current_stock < Decimal::ZERO || new.minimum_stock < Decimal::ZERO {
            return Err(ProductError::NegativeStock);
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(), code: new.code, name, category: new.category, product_type: new.product_type,
            material: new.material, description: new.description,
            current_stock: round_quantity(new.current_stock), minimum_stock: round_quantity(new.minimum_stock),
            sales_price: new.sales_price, sales_tax_percentage: new.sales_tax_percentage,
            purchase_price: new.purchase_price, purchase_tax_percentage: new.purchase_tax_percentage,
            colors: new.colors, images: new.images,
            is_published: false, is_active: true, created_at: now, updated_at: now,
        })
    }

    pub fn group(&self) -> ProductGroup { self.product_type.group() }

    /// Visible and orderable on the storefront.
    pub fn is_purchasable(&self) -> bool { self.is_active && self.is_published }

    pub fn is_low_stock(&self) -> bool { self.current_stock < self.minimum_stock }

    /// The image flagged primary, otherwise the first by display order.
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images.iter().find(|i| i.is_primary)
            .or_else(|| self.images.iter().min_by_key(|i| i.display_order))
    }

    pub fn apply(&mut self, changes: ProductChanges) -> Result<(), ProductError> {
        if let Some(name) = changes.name {
            let name = name.trim().to_string();
            if name.is_empty() { return Err(ProductError::MissingName); }
            self.name = name;
        }
        if let Some(price) = changes.sales_price { ensure_price(price)?; self.sales_price = price; }
        if let Some(price) = changes.purchase_price { ensure_price(price)?; self.purchase_price = price; }
        if let Some(min) = changes.minimum_stock {
            if min < Decimal::ZERO { return Err(ProductError::NegativeStock); }
            self.minimum_stock = round_quantity(min);
        }
        if let Some(c) = changes.category { self.category = c; }
        if let Some(t) = changes.product_type { self.product_type = t; }
        if let Some(m) = changes.material { self.material = Some(m); }
        if let Some(d) = changes.description { self.description = Some(d); }
        if let Some(t) = changes.sales_tax_percentage { self.sales_tax_percentage = t; }
        if let Some(t) = changes.purchase_tax_percentage { self.purchase_tax_percentage = t; }
        if let Some(c) = changes.colors { self.colors = c; }
        if let Some(i) = changes.images { self.images = i; }
        self.touch();
        Ok(())
    }

    pub fn publish(&mut self) -> Result<(), ProductError> {
        if self.name.is_empty() { return Err(ProductError::MissingName); }
        if self.sales_price <= Decimal::ZERO { return Err(ProductError::NotPriced); }
        if !self.is_active { return Err(ProductError::Archived); }
        self.is_published = true;
        self.touch();
        Ok(())
    }

    pub fn unpublish(&mut self) { self.is_published = false; self.touch(); }

    pub fn archive(&mut self) { self.is_active = false; self.is_published = false; self.touch(); }

    /// Adds `delta` (may be negative) to stock. Returns `(before, after)`.
    pub fn shift_stock(&mut self, delta: Decimal) -> Result<(Decimal, Decimal), ProductError> {
        let before = self.current_stock;
        let after = round_quantity(before + delta);
        if after < Decimal::ZERO {
            return Err(ProductError::InsufficientStock { code: self.code.to_string(), available: before, requested: -delta });
        }
        self.current_stock = after;
        self.touch();
        Ok((before, after))
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

fn ensure_price(price: Decimal) -> Result<(), ProductError> {
    if price < Decimal::ZERO { Err(ProductError::NegativePrice) } else { Ok(()) }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductError {
    #[error("product name is required")]
    MissingName,
    #[error("prices must not be negative")]
    NegativePrice,
    #[error("stock levels must not be negative")]
    NegativeStock,
    #[error("product needs a sales price before it can be published")]
    NotPriced,
    #[error("archived products cannot be published")]
    Archived,
    #[error("insufficient stock for {code}: {available} available, {requested} requested")]
    InsufficientStock { code: String, available: Decimal, requested: Decimal },
    #[error("unknown product category '{0}'")]
    UnknownCategory(String),
    #[error("unknown product type '{0}'")]
    UnknownType(String),
    #[error("unknown product group '{0}'")]
    UnknownGroup(String),
}
