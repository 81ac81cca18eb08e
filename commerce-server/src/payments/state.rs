//! Payment Verification State Machine
//!
//! ```text
//! PENDING ──submit──► PENDING_VERIFICATION ──verify──► PAID | FAILED | CANCELLED | REFUNDED
//!                                                       PAID ──► REFUNDED (订单已取消)
//! ```

use shared::models::{OrderStatus, PaymentStatus};

use crate::error::{CommerceError, CommerceResult};

/// Statuses finance may set through verification
pub fn is_review_target(status: PaymentStatus) -> bool {
    matches!(
        status,
        PaymentStatus::Paid
            | PaymentStatus::Failed
            | PaymentStatus::Cancelled
            | PaymentStatus::Refunded
    )
}

/// 审核迁移表
pub fn can_review(from: PaymentStatus, to: PaymentStatus, order_status: OrderStatus) -> bool {
    use PaymentStatus::*;
    match (from, to) {
        (PendingVerification, Paid | Failed | Cancelled | Refunded) => true,
        (Paid, Refunded) => order_status == OrderStatus::Cancelled,
        _ => false,
    }
}

pub fn validate_review(
    from: PaymentStatus,
    to: PaymentStatus,
    order_status: OrderStatus,
) -> CommerceResult<()> {
    if is_review_target(to) && can_review(from, to, order_status) {
        Ok(())
    } else {
        Err(CommerceError::InvalidPaymentTransition { from, to })
    }
}

/// 凭证提交的目标付款行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTarget {
    /// 当前付款为 PENDING：原行附加凭证
    Attach(i64),
    /// 无当前付款或已失败/作废：新建一行并设为当前付款
    Replace { previous: Option<i64> },
}

pub fn submit_target(current: Option<(i64, PaymentStatus)>) -> CommerceResult<SubmitTarget> {
    match current {
        None => Ok(SubmitTarget::Replace { previous: None }),
        Some((id, PaymentStatus::Pending)) => Ok(SubmitTarget::Attach(id)),
        Some((id, PaymentStatus::Failed | PaymentStatus::Cancelled)) => {
            Ok(SubmitTarget::Replace { previous: Some(id) })
        }
        Some((_, PaymentStatus::PendingVerification)) => Err(CommerceError::PaymentAlreadySubmitted),
        Some((_, from)) => Err(CommerceError::InvalidPaymentTransition {
            from,
            to: PaymentStatus::PendingVerification,
        }),
    }
}
