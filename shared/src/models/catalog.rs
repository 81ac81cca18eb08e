//! Catalog Model
//!
//! 商品/服务由外部目录管理维护，这里只读取价格与上架状态，并修改库存。

use serde::{Deserialize, Serialize};

/// Kind of catalog entry a cart or order line points at
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ItemKind {
    Product,
    Service,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Product => "PRODUCT",
            ItemKind::Service => "SERVICE",
        }
    }

    /// Human label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Product => "Product",
            ItemKind::Service => "Service",
        }
    }
}

/// Reference to exactly one catalog entry (product XOR service)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub item_type: ItemKind,
    pub item_id: i64,
}

impl ItemRef {
    pub fn product(id: i64) -> Self {
        Self {
            item_type: ItemKind::Product,
            item_id: id,
        }
    }

    pub fn service(id: i64) -> Self {
        Self {
            item_type: ItemKind::Service,
            item_id: id,
        }
    }

    /// Build from the legacy `product_id` / `service_id` pair.
    ///
    /// Returns `None` unless exactly one side is set.
    pub fn from_pair(product_id: Option<i64>, service_id: Option<i64>) -> Option<Self> {
        match (product_id, service_id) {
            (Some(id), None) => Some(Self::product(id)),
            (None, Some(id)) => Some(Self::service(id)),
            _ => None,
        }
    }
}

/// Product entity (有库存)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub price: f64,
    pub stock: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Service entity (按单生产，无库存)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Resolved catalog entry, product or service
///
/// `stock` is `None` for services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CatalogItem {
    pub item_type: ItemKind,
    pub item_id: i64,
    pub name: String,
    pub price: f64,
    pub stock: Option<i64>,
    pub is_active: bool,
}

impl CatalogItem {
    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            item_type: self.item_type,
            item_id: self.item_id,
        }
    }
}
