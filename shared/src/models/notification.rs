//! Notification Model

use serde::{Deserialize, Serialize};

/// Kind of state change a notification reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum NotificationKind {
    OrderCreated,
    OrderStatusChanged,
    PaymentUploaded,
    PaymentVerified,
    PaymentRejected,
}

/// User-visible notification
///
/// `user_id = None` addresses all staff.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub user_id: Option<i64>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub order_id: Option<i64>,
    pub payment_id: Option<i64>,
    pub is_read: bool,
    pub created_at: i64,
}

/// Mark-read payload (`POST /api/notifications/mark-read`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkRead {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub mark_all: bool,
}
