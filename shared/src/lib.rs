//! Shared types for the commerce backend
//!
//! Error codes, API response envelope, and the catalog / cart / order /
//! payment / notification models used by the server and its clients.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
