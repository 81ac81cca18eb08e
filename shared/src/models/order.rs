//! Order Model

use super::catalog::ItemKind;
use super::payment::{Payment, PaymentStatus};
use serde::{Deserialize, Serialize};

/// Order fulfillment status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    /// 当前有效支付（结构化替代“取最新一条”）
    pub current_payment_id: Option<i64>,
    /// 财务确认收款后置为 true，且只置一次
    pub payment_confirmed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line, frozen at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub item_type: ItemKind,
    pub item_id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

/// Order with items and payments (`GET /api/orders/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub current_payment: Option<Payment>,
}

/// Order list row with computed fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub order: Order,
    pub item_count: i64,
    pub has_payment: bool,
    pub current_payment_status: Option<PaymentStatus>,
    pub can_process: bool,
}

/// One requested checkout line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub item_type: ItemKind,
    pub item_id: i64,
    pub quantity: i64,
}

/// Create order payload (`POST /api/orders`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCreate {
    #[serde(default)]
    pub items: Vec<CheckoutLine>,
    /// Use the caller's cart instead of `items`
    #[serde(default)]
    pub from_cart: bool,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    /// Client-side total, checked against the server-side total
    pub total_amount: Option<f64>,
    /// Staff ordering on behalf of a customer
    pub user_id: Option<i64>,
}

/// Status change payload (`PUT /api/orders/{id}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

/// Pagination block for list responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Paged order list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub pagination: Pagination,
}
