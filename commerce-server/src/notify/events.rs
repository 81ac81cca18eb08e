//! 通知事件内容
//!
//! `user_id = None` 的事件投递给全体员工。

use shared::models::{NotificationKind, Order, OrderStatus, PaymentStatus};

use crate::db::repository::notification::NewNotification;

fn event(
    kind: NotificationKind,
    user_id: Option<i64>,
    title: &str,
    message: String,
    order_id: i64,
    payment_id: Option<i64>,
) -> NewNotification {
    NewNotification {
        kind,
        user_id,
        title: title.to_string(),
        message,
        order_id: Some(order_id),
        payment_id,
    }
}

/// 下单：通知下单用户和员工
pub fn order_created(order: &Order) -> Vec<NewNotification> {
    vec![
        event(
            NotificationKind::OrderCreated,
            Some(order.user_id),
            "Order created",
            format!(
                "Order {} has been created. Total: {}",
                order.order_number, order.total_amount
            ),
            order.id,
            order.current_payment_id,
        ),
        event(
            NotificationKind::OrderCreated,
            None,
            "New order",
            format!(
                "New order {} from user {}",
                order.order_number, order.user_id
            ),
            order.id,
            order.current_payment_id,
        ),
    ]
}

pub fn order_status_changed(order: &Order, from: OrderStatus, to: OrderStatus) -> Vec<NewNotification> {
    vec![event(
        NotificationKind::OrderStatusChanged,
        Some(order.user_id),
        "Order status updated",
        format!("Order {} changed from {} to {}", order.order_number, from, to),
        order.id,
        None,
    )]
}

/// 凭证上传：通知员工审核
pub fn payment_uploaded(order: &Order, payment_id: i64, claimed_amount: f64) -> Vec<NewNotification> {
    vec![event(
        NotificationKind::PaymentUploaded,
        None,
        "Payment proof uploaded",
        format!(
            "Payment proof for order {} ({}) awaits verification",
            order.order_number, claimed_amount
        ),
        order.id,
        Some(payment_id),
    )]
}

/// 审核结果：通知下单用户
pub fn payment_reviewed(order: &Order, payment_id: i64, status: PaymentStatus) -> Vec<NewNotification> {
    let (kind, title, message) = match status {
        PaymentStatus::Paid => (
            NotificationKind::PaymentVerified,
            "Payment verified",
            format!(
                "Payment for order {} has been verified. Your order can now be processed",
                order.order_number
            ),
        ),
        other => (
            NotificationKind::PaymentRejected,
            "Payment not accepted",
            format!("Payment for order {} was marked {}", order.order_number, other),
        ),
    };
    vec![event(kind, Some(order.user_id), title, message, order.id, Some(payment_id))]
}
