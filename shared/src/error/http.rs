//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::PaymentNotFound
            | Self::ProductNotFound
            | Self::ServiceNotFound
            | Self::CartItemNotFound
            // 不向非所有者暴露订单是否存在
            | Self::OrderNotOwned => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists | Self::OrderNumberConflict => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::PermissionDenied => StatusCode::FORBIDDEN,

            // 502 / 504: proof storage collaborator
            Self::ProofStorageFailed => StatusCode::BAD_GATEWAY,
            Self::ProofStorageTimeout => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (validation and business rule conflicts)
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::InvalidOrderTransition
            | Self::PaymentNotConfirmed
            | Self::TotalMismatch
            | Self::EmptyOrder
            | Self::InvalidPaymentTransition
            | Self::PaymentAlreadySubmitted
            | Self::InvalidAmount
            | Self::PayloadTooLarge
            | Self::UnsupportedMediaType
            | Self::ItemInactive
            | Self::InsufficientStock
            | Self::InvalidQuantity => StatusCode::BAD_REQUEST,
        }
    }
}
