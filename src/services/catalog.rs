//! Storefront browsing and vendor product management

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{non_negative, percentage, Page};
use crate::domain::aggregates::{
    NewProduct, Product, ProductCategory, ProductChanges, ProductColor, ProductGroup, ProductImage, ProductType,
};
use crate::domain::value_objects::{Percentage, Sku};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub gender: Option<String>,
    pub group: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Comma-separated color names; a product matches if it has any of them.
    pub colors: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SortOrder { #[default] Newest, PriceAsc, PriceDesc, Name }

impl SortOrder {
    fn parse(s: Option<&str>) -> AppResult<Self> {
        match s.map(str::trim) {
            None | Some("") | Some("newest") => Ok(Self::Newest),
            Some("price_asc") => Ok(Self::PriceAsc),
            Some("price_desc") => Ok(Self::PriceDesc),
            Some("name") => Ok(Self::Name),
            Some(other) => Err(AppError::Validation(format!("unknown sort '{other}'"))),
        }
    }
}

/// Parsed storefront filters.
struct Filter {
    gender: Option<ProductCategory>,
    group: Option<ProductGroup>,
    category: Option<String>,
    search: Option<String>,
    min_price: Option<Decimal>,
    max_price: Option<Decimal>,
    colors: Vec<String>,
}

fn blank_to_none(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Filter {
    fn from_query(q: &ProductQuery) -> AppResult<Self> {
        Ok(Self {
            gender: blank_to_none(&q.gender).map(str::parse).transpose()?,
            group: blank_to_none(&q.group).map(str::parse).transpose()?,
            category: blank_to_none(&q.category).map(str::to_lowercase),
            search: blank_to_none(&q.search).map(str::to_lowercase),
            min_price: q.min_price,
            max_price: q.max_price,
            colors: blank_to_none(&q.colors)
                .map(|c| c.split(',').map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()).collect())
                .unwrap_or_default(),
        })
    }

    fn matches(&self, p: &Product) -> bool {
        if self.gender.is_some_and(|g| g != p.category) { return false; }
        if self.group.is_some_and(|g| g != p.group()) { return false; }
        if let Some(c) = &self.category {
            if !p.product_type.as_str().contains(c.as_str()) { return false; }
        }
        if let Some(s) = &self.search {
            let hit = p.name.to_lowercase().contains(s.as_str())
                || p.code.as_str().to_lowercase().contains(s.as_str())
                || p.description.as_deref().is_some_and(|d| d.to_lowercase().contains(s.as_str()));
            if !hit { return false; }
        }
        if self.min_price.is_some_and(|min| p.sales_price < min) { return false; }
        if self.max_price.is_some_and(|max| p.sales_price > max) { return false; }
        if !self.colors.is_empty()
            && !p.colors.iter().any(|c| self.colors.contains(&c.color_name.to_lowercase()))
        {
            return false;
        }
        true
    }
}

/// Published, active products matching `q`, sorted and paginated.
pub async fn storefront(state: &AppState, q: ProductQuery) -> AppResult<Page<Product>> {
    let filter = Filter::from_query(&q)?;
    let sort = SortOrder::parse(q.sort.as_deref())?;
    let mut products: Vec<Product> =
        state.store.catalog(true).await?.into_iter().filter(|p| filter.matches(p)).collect();
    match sort {
        SortOrder::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortOrder::PriceAsc => products.sort_by(|a, b| a.sales_price.cmp(&b.sales_price)),
        SortOrder::PriceDesc => products.sort_by(|a, b| b.sales_price.cmp(&a.sales_price)),
        SortOrder::Name => products.sort_by_key(|p| p.name.to_lowercase()),
    }
    Ok(Page::of(products, q.page, q.per_page))
}

/// Any active product. Archived and unknown products are both 404.
pub async fn product(state: &AppState, id: Uuid) -> AppResult<Product> {
    state.store.product(id).await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::not_found("Product"))
}

pub async fn vendor_products(state: &AppState) -> AppResult<Vec<Product>> {
    Ok(state.store.catalog(false).await?)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 50))]
    pub product_code: String,
    #[validate(length(min = 1, max = 200))]
    pub product_name: String,
    pub product_category: String,
    pub product_type: String,
    pub material: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    #[serde(default)]
    pub current_stock: Decimal,
    #[validate(custom = "non_negative")]
    #[serde(default)]
    pub minimum_stock: Decimal,
    #[validate(custom = "non_negative")]
    pub sales_price: Decimal,
    pub sales_tax_percentage: Option<Decimal>,
    #[validate(custom = "non_negative")]
    #[serde(default)]
    pub purchase_price: Decimal,
    pub purchase_tax_percentage: Option<Decimal>,
    #[serde(default)]
    pub colors: Vec<ProductColor>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub is_published: bool,
}

pub async fn create_product(state: &AppState, req: CreateProduct) -> AppResult<Product> {
    let mut product = Product::create(NewProduct {
        code: Sku::new(req.product_code)?,
        name: req.product_name,
        category: req.product_category.parse()?,
        product_type: req.product_type.parse::<ProductType>()?,
        material: req.material,
        description: req.description,
        current_stock: req.current_stock,
        minimum_stock: req.minimum_stock,
        sales_price: req.sales_price,
        sales_tax_percentage: percentage(req.sales_tax_percentage)?,
        purchase_price: req.purchase_price,
        purchase_tax_percentage: percentage(req.purchase_tax_percentage)?,
        colors: req.colors,
        images: req.images,
    })?;
    if req.is_published { product.publish()?; }
    state.store.insert_product(&product).await?;
    info!(product_id = %product.id, code = %product.code, "product created");
    Ok(product)
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub product_name: Option<String>,
    pub product_category: Option<String>,
    pub product_type: Option<String>,
    pub material: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "non_negative")]
    pub minimum_stock: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub sales_price: Option<Decimal>,
    pub sales_tax_percentage: Option<Decimal>,
    #[validate(custom = "non_negative")]
    pub purchase_price: Option<Decimal>,
    pub purchase_tax_percentage: Option<Decimal>,
    pub colors: Option<Vec<ProductColor>>,
    pub images: Option<Vec<ProductImage>>,
}

pub async fn update_product(state: &AppState, id: Uuid, req: UpdateProduct) -> AppResult<Product> {
    let mut product = state.store.product(id).await?.ok_or_else(|| AppError::not_found("Product"))?;
    product.apply(ProductChanges {
        name: req.product_name,
        category: req.product_category.as_deref().map(str::parse).transpose()?,
        product_type: req.product_type.as_deref().map(str::parse).transpose()?,
        material: req.material,
        description: req.description,
        minimum_stock: req.minimum_stock,
        sales_price: req.sales_price,
        sales_tax_percentage: req.sales_tax_percentage.map(Percentage::new).transpose()?,
        purchase_price: req.purchase_price,
        purchase_tax_percentage: req.purchase_tax_percentage.map(Percentage::new).transpose()?,
        colors: req.colors,
        images: req.images,
    })?;
    state.store.update_product(&product).await?;
    info!(product_id = %id, "product updated");
    Ok(product)
}

#[derive(Clone, Copy, Debug)]
pub enum Visibility { Publish, Unpublish, Archive }

pub async fn set_visibility(state: &AppState, id: Uuid, visibility: Visibility) -> AppResult<Product> {
    let mut product = state.store.product(id).await?.ok_or_else(|| AppError::not_found("Product"))?;
    match visibility {
        Visibility::Publish => product.publish()?,
        Visibility::Unpublish => product.unpublish(),
        Visibility::Archive => product.archive(),
    }
    state.store.update_product(&product).await?;
    info!(product_id = %id, ?visibility, "product visibility changed");
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::kurta;
    use rust_decimal_macros::dec;

    fn query() -> ProductQuery { ProductQuery::default() }

    #[test]
    fn test_filter_matching() {
        let mut p = kurta();
        p.colors = vec![ProductColor { color_name: "Indigo".into(), color_code: None, display_order: 0 }];
        let f = Filter::from_query(&ProductQuery { gender: Some("MEN".into()), group: Some("topwear".into()), ..query() }).unwrap();
        assert!(f.matches(&p));
        let f = Filter::from_query(&ProductQuery { search: Some("kur-0".into()), colors: Some("red, indigo".into()), ..query() }).unwrap();
        assert!(f.matches(&p));
        let f = Filter::from_query(&ProductQuery { min_price: Some(dec!(1000.01)), ..query() }).unwrap();
        assert!(!f.matches(&p));
        let f = Filter::from_query(&ProductQuery { max_price: Some(dec!(1000)), category: Some("kur".into()), ..query() }).unwrap();
        assert!(f.matches(&p));
    }

    #[test]
    fn test_unknown_filters_are_rejected() {
        assert!(Filter::from_query(&ProductQuery { gender: Some("aliens".into()), ..query() }).is_err());
        // No product type maps to footwear, so the group is not offered as a filter.
        assert!(Filter::from_query(&ProductQuery { group: Some("footwear".into()), ..query() }).is_err());
        assert!(Filter::from_query(&ProductQuery { group: Some("Bottomwear".into()), ..query() }).is_ok());
        assert!(SortOrder::parse(Some("random")).is_err());
        assert_eq!(SortOrder::parse(None).unwrap(), SortOrder::Newest);
    }
}
