//! Order Fulfillment State Machine
//!
//! ```text
//! PENDING ──► PROCESSING ──► SHIPPED ──► DELIVERED
//!    │             │
//!    └─────────────┴──► CANCELLED
//! ```
//!
//! `PENDING → PROCESSING` 额外要求当前付款为 `PAID`（见 [`payment_guard`]）。

use shared::models::{OrderStatus, PaymentStatus};

use crate::error::{CommerceError, CommerceResult};

/// 状态迁移表（不含付款守卫）
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
        (from, to),
        (Pending, Processing)
            | (Processing, Shipped)
            | (Shipped, Delivered)
            | (Pending, Cancelled)
            | (Processing, Cancelled)
    )
}

pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> CommerceResult<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CommerceError::InvalidOrderTransition { from, to })
    }
}

pub fn is_terminal(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Delivered | OrderStatus::Cancelled)
}

/// 付款守卫：`PENDING → PROCESSING` 需要当前付款已确认
///
/// 返回可直接展示给用户的原因。
pub fn payment_guard(
    order_status: OrderStatus,
    payment_status: Option<PaymentStatus>,
    payment_confirmed: bool,
) -> CommerceResult<()> {
    let reason = match payment_status {
        Some(PaymentStatus::Paid) if payment_confirmed => return Ok(()),
        Some(PaymentStatus::Paid) => "Payment has not been confirmed by finance yet".to_string(),
        None => "Order has no payment yet. Upload a payment proof first".to_string(),
        Some(PaymentStatus::Pending) => {
            "Payment proof has not been uploaded yet".to_string()
        }
        Some(PaymentStatus::PendingVerification) => {
            "Payment is awaiting verification by finance".to_string()
        }
        Some(status) => format!("Payment was {status}. A new payment is required"),
    };
    Err(CommerceError::PaymentNotConfirmed {
        order_status,
        payment_status,
        reason,
    })
}
