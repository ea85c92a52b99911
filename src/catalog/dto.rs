use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{Category, Product};
use super::services::{discounted_unit_price, SortMode};

/// Query string of the catalog index.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, alias = "filter")]
    pub filter_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Parsed catalog filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub sort: SortMode,
}

#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub discount: Decimal,
    pub unit_price: Decimal,
    pub description: String,
    pub stock: i32,
    pub category_id: i64,
    pub image_url: Option<String>,
    /// Echoed back by the edit form as its version.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ProductView {
    pub fn new(p: Product, image_url: Option<String>) -> Self {
        Self {
            unit_price: discounted_unit_price(p.price, p.discount),
            id: p.id,
            name: p.name,
            price: p.price,
            discount: p.discount,
            description: p.description,
            stock: p.stock,
            category_id: p.category_id,
            image_url,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogPage {
    pub categories: Vec<Category>,
    pub products: Vec<ProductView>,
    pub q: Option<String>,
    pub filter_type: SortMode,
    pub category: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub title: String,
}

/// Data behind the product create/edit forms.
#[derive(Debug, Serialize)]
pub struct ProductFormPage {
    pub product: Option<ProductView>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct CategoryFormPage {
    pub fields: &'static [&'static str],
}
