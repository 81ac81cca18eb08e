//! Cart Model

use super::catalog::ItemKind;
use serde::{Deserialize, Serialize};

/// Cart line (购物车条目)
///
/// `price` is the unit price captured when the line was first added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub item_type: ItemKind,
    pub item_id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Cart with items and computed total
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<CartItem>,
    pub item_count: usize,
    pub total_amount: f64,
}

/// Add item payload (`POST /api/cart`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemAdd {
    pub product_id: Option<i64>,
    pub service_id: Option<i64>,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Update quantity payload (`PUT /api/cart`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemUpdate {
    pub cart_item_id: i64,
    pub quantity: i64,
}
