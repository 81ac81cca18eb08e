//! 业务错误
//!
//! 购物车、结账、订单、支付服务统一返回 [`CommerceError`]，
//! 在 HTTP 边界转换为带错误码的 [`AppError`]。

use shared::error::{AppError, ErrorCode};
use shared::models::{ItemKind, OrderStatus, PaymentStatus};
use thiserror::Error;

use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("{} {id} not found", kind.label())]
    ItemNotFound { kind: ItemKind, id: i64 },

    #[error("{} is not currently available: {name}", kind.label())]
    ItemInactive { kind: ItemKind, id: i64, name: String },

    #[error("Insufficient stock for product: {name}. Available: {available}, Requested: {requested}")]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Quantity must be between 1 and {max}, got {got}")]
    InvalidQuantity { got: i64, max: i64 },

    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Total amount mismatch. Calculated: {calculated}, Provided: {provided}")]
    TotalMismatch { calculated: f64, provided: f64 },

    #[error("Could not allocate a unique order number, please retry")]
    OrderNumberConflict,

    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Order {0} not found")]
    OrderNotOwned(i64),

    #[error("Payment {0} not found")]
    PaymentNotFound(i64),

    #[error("Cart item {0} not found")]
    CartItemNotFound(i64),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidOrderTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order is {0} and no longer accepts payments")]
    OrderNotPayable(OrderStatus),

    #[error("{reason}")]
    PaymentNotConfirmed {
        order_status: OrderStatus,
        payment_status: Option<PaymentStatus>,
        reason: String,
    },

    #[error("Cannot change payment status from {from} to {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("Payment proof already submitted and awaiting verification")]
    PaymentAlreadySubmitted,

    #[error("{0}")]
    InvalidAmount(String),

    #[error("File exceeds the {max} byte limit")]
    PayloadTooLarge { max: usize },

    #[error("Unsupported file type: {0}. Allowed: JPEG, PNG, WEBP, PDF")]
    UnsupportedMediaType(String),

    #[error("Failed to store payment proof: {0}")]
    Storage(String),

    #[error("Payment proof storage timed out")]
    StorageTimeout,

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type CommerceResult<T> = Result<T, CommerceError>;

impl CommerceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CommerceError::ItemNotFound {
                kind: ItemKind::Product,
                ..
            } => ErrorCode::ProductNotFound,
            CommerceError::ItemNotFound {
                kind: ItemKind::Service,
                ..
            } => ErrorCode::ServiceNotFound,
            CommerceError::ItemInactive { .. } => ErrorCode::ItemInactive,
            CommerceError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CommerceError::MissingField(_) => ErrorCode::RequiredField,
            CommerceError::InvalidArgument(_) => ErrorCode::ValidationFailed,
            CommerceError::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
            CommerceError::EmptyOrder => ErrorCode::EmptyOrder,
            CommerceError::TotalMismatch { .. } => ErrorCode::TotalMismatch,
            CommerceError::OrderNumberConflict => ErrorCode::OrderNumberConflict,
            CommerceError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            CommerceError::OrderNotOwned(_) => ErrorCode::OrderNotOwned,
            CommerceError::PaymentNotFound(_) => ErrorCode::PaymentNotFound,
            CommerceError::CartItemNotFound(_) => ErrorCode::CartItemNotFound,
            CommerceError::InvalidOrderTransition { .. } => ErrorCode::InvalidOrderTransition,
            CommerceError::OrderNotPayable(_) => ErrorCode::InvalidOrderTransition,
            CommerceError::PaymentNotConfirmed { .. } => ErrorCode::PaymentNotConfirmed,
            CommerceError::InvalidPaymentTransition { .. } => ErrorCode::InvalidPaymentTransition,
            CommerceError::PaymentAlreadySubmitted => ErrorCode::PaymentAlreadySubmitted,
            CommerceError::InvalidAmount(_) => ErrorCode::InvalidAmount,
            CommerceError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            CommerceError::UnsupportedMediaType(_) => ErrorCode::UnsupportedMediaType,
            CommerceError::Storage(_) => ErrorCode::ProofStorageFailed,
            CommerceError::StorageTimeout => ErrorCode::ProofStorageTimeout,
            CommerceError::Repo(RepoError::NotFound(_)) => ErrorCode::NotFound,
            CommerceError::Repo(RepoError::Duplicate(_)) => ErrorCode::AlreadyExists,
            CommerceError::Repo(RepoError::Validation(_)) => ErrorCode::ValidationFailed,
            CommerceError::Repo(RepoError::Database(_)) => ErrorCode::DatabaseError,
        }
    }
}

impl From<CommerceError> for AppError {
    fn from(err: CommerceError) -> Self {
        let code = err.code();
        match err {
            CommerceError::Repo(repo) => repo.into(),
            CommerceError::InsufficientStock {
                product_id,
                ref name,
                available,
                requested,
            } => AppError::with_message(code, err.to_string())
                .with_detail("product_id", product_id)
                .with_detail("product_name", name.clone())
                .with_detail("available", available)
                .with_detail("requested", requested),
            CommerceError::TotalMismatch {
                calculated,
                provided,
            } => AppError::with_message(code, err.to_string())
                .with_detail("calculated", calculated)
                .with_detail("provided", provided),
            CommerceError::InvalidOrderTransition { from, to } => {
                AppError::with_message(code, err.to_string())
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            CommerceError::InvalidPaymentTransition { from, to } => {
                AppError::with_message(code, err.to_string())
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            CommerceError::PaymentNotConfirmed {
                order_status,
                payment_status,
                ref reason,
            } => AppError::with_message(code, reason.clone())
                .with_detail("order_status", order_status.as_str())
                .with_detail(
                    "payment_status",
                    payment_status.map(|s| s.as_str()).unwrap_or("NONE"),
                )
                .with_detail("reason", reason.clone()),
            CommerceError::PayloadTooLarge { max } => {
                AppError::with_message(code, err.to_string()).with_detail("max_size", max)
            }
            CommerceError::MissingField(field) => AppError::required_field(field),
            CommerceError::Storage(ref cause) => {
                tracing::error!(error = %cause, "Proof storage failed");
                AppError::new(code)
            }
            other => AppError::with_message(code, other.to_string()),
        }
    }
}
