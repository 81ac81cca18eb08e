//! Unified error codes for the commerce backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors (including proof upload)
//! - 6xxx: Catalog / inventory errors
//! - 7xxx: Cart errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values on the wire so clients
/// can switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order belongs to another user
    OrderNotOwned = 4002,
    /// Requested status change is not a legal transition
    InvalidOrderTransition = 4003,
    /// PENDING -> PROCESSING without a PAID payment
    PaymentNotConfirmed = 4004,
    /// Client total differs from the server-side total
    TotalMismatch = 4005,
    /// Generated order number collided
    OrderNumberConflict = 4006,
    /// Order has no items
    EmptyOrder = 4007,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Requested payment status change is not legal
    InvalidPaymentTransition = 5002,
    /// A proof is already waiting for verification
    PaymentAlreadySubmitted = 5003,
    /// Amount is missing, not a number, or not positive
    InvalidAmount = 5004,
    /// Proof file exceeds the size limit
    PayloadTooLarge = 5501,
    /// Proof file type is not accepted
    UnsupportedMediaType = 5502,
    /// Proof storage rejected or failed the upload
    ProofStorageFailed = 5503,
    /// Proof storage did not answer in time
    ProofStorageTimeout = 5504,

    // ==================== 6xxx: Catalog / Inventory ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Service not found
    ServiceNotFound = 6002,
    /// Item exists but is not currently sellable
    ItemInactive = 6003,
    /// Requested quantity exceeds stock
    InsufficientStock = 6004,

    // ==================== 7xxx: Cart ====================
    /// Cart item not found
    CartItemNotFound = 7001,
    /// Quantity below one or above the maximum
    InvalidQuantity = 7002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9101,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderNotOwned => "Order does not belong to the caller",
            ErrorCode::InvalidOrderTransition => "Invalid order status transition",
            ErrorCode::PaymentNotConfirmed => "Payment has not been confirmed",
            ErrorCode::TotalMismatch => "Total amount mismatch",
            ErrorCode::OrderNumberConflict => "Order number already exists",
            ErrorCode::EmptyOrder => "Order has no items",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::InvalidPaymentTransition => "Invalid payment status transition",
            ErrorCode::PaymentAlreadySubmitted => "Payment proof already submitted",
            ErrorCode::InvalidAmount => "Invalid payment amount",
            ErrorCode::PayloadTooLarge => "Payment proof is too large",
            ErrorCode::UnsupportedMediaType => "Unsupported payment proof type",
            ErrorCode::ProofStorageFailed => "Failed to store payment proof",
            ErrorCode::ProofStorageTimeout => "Payment proof storage timed out",

            // Catalog / Inventory
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::ServiceNotFound => "Service not found",
            ErrorCode::ItemInactive => "Item is not available",
            ErrorCode::InsufficientStock => "Insufficient stock",

            // Cart
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::InvalidQuantity => "Invalid quantity",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            2001 => Ok(ErrorCode::PermissionDenied),

            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderNotOwned),
            4003 => Ok(ErrorCode::InvalidOrderTransition),
            4004 => Ok(ErrorCode::PaymentNotConfirmed),
            4005 => Ok(ErrorCode::TotalMismatch),
            4006 => Ok(ErrorCode::OrderNumberConflict),
            4007 => Ok(ErrorCode::EmptyOrder),

            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::InvalidPaymentTransition),
            5003 => Ok(ErrorCode::PaymentAlreadySubmitted),
            5004 => Ok(ErrorCode::InvalidAmount),
            5501 => Ok(ErrorCode::PayloadTooLarge),
            5502 => Ok(ErrorCode::UnsupportedMediaType),
            5503 => Ok(ErrorCode::ProofStorageFailed),
            5504 => Ok(ErrorCode::ProofStorageTimeout),

            6001 => Ok(ErrorCode::ProductNotFound),
            6002 => Ok(ErrorCode::ServiceNotFound),
            6003 => Ok(ErrorCode::ItemInactive),
            6004 => Ok(ErrorCode::InsufficientStock),

            7001 => Ok(ErrorCode::CartItemNotFound),
            7002 => Ok(ErrorCode::InvalidQuantity),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9101 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
