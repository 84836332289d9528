use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, ProductHistoryId, ProductId};

/// A stocked product.
///
/// `product_history_id` points at the current price-history record; it changes
/// whenever the sell or buy price changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub product_history_id: ProductHistoryId,
    pub category_id: CategoryId,
    pub name: String,
    pub sell_price: f64,
    pub buy_price: f64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            product_id: self.product_id,
            name: self.name.clone(),
            sell_price: self.sell_price,
            stock: self.stock,
        }
    }
}

/// Minified product projection for pickers and quick lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: ProductId,
    pub name: String,
    pub sell_price: f64,
    pub stock: i64,
}

/// A product category. Names are unique across categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub category_id: CategoryId,
    pub name: String,
}

/// Column a product listing is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductOrder {
    Name,
    CreatedAt,
    UpdatedAt,
    BuyPrice,
    SellPrice,
    #[default]
    Stock,
}

impl ProductOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductOrder::Name => "name",
            ProductOrder::CreatedAt => "created_at",
            ProductOrder::UpdatedAt => "updated_at",
            ProductOrder::BuyPrice => "buy_price",
            ProductOrder::SellPrice => "sell_price",
            ProductOrder::Stock => "stock",
        }
    }

    /// Parse a client-supplied column, falling back to the default ordering.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for ProductOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(ProductOrder::Name),
            "created_at" => Ok(ProductOrder::CreatedAt),
            "updated_at" => Ok(ProductOrder::UpdatedAt),
            "buy_price" => Ok(ProductOrder::BuyPrice),
            "sell_price" => Ok(ProductOrder::SellPrice),
            "stock" => Ok(ProductOrder::Stock),
            other => Err(DomainError::validation(format!("unknown product order: {other}"))),
        }
    }
}

/// Filters for a product listing, as received from the client.
///
/// `order` stays a raw string: interpreting it is up to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub search: String,
    pub order: String,
    pub category_id: i64,
    pub offset: i64,
}

impl ProductQuery {
    /// `0` means every category.
    pub fn category_filter(&self) -> Option<CategoryId> {
        (self.category_id != 0).then(|| CategoryId::new(self.category_id))
    }
}

/// Fields of a product to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub category_id: CategoryId,
    pub sell_price: f64,
    pub buy_price: f64,
    pub stock: i64,
}

/// Replacement fields for an existing product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub product_id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub sell_price: f64,
    pub buy_price: f64,
    pub stock: i64,
}
