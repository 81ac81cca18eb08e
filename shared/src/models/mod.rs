//! Data models
//!
//! Shared between commerce-server and its clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod cart;
pub mod catalog;
pub mod notification;
pub mod order;
pub mod payment;

// Re-exports
pub use cart::*;
pub use catalog::*;
pub use notification::*;
pub use order::*;
pub use payment::*;
