//! 订单取消：库存回补与付款作废

mod common;

use commerce_server::ErrorCode;
use common::*;
use shared::models::{OrderStatus, OrderStatusUpdate, PaymentStatus, PaymentVerify};

fn status(status: OrderStatus) -> OrderStatusUpdate {
    OrderStatusUpdate {
        status,
        notes: None,
    }
}

#[tokio::test]
async fn test_customer_cancel_restores_stock_and_voids_payment() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 350000.0, 15).await;
    let order = place_order(state, 7, a, 2).await.order;
    assert_eq!(stock_of(state, a).await, 13);

    let detail = state.orders.cancel(&customer(7), order.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Cancelled);
    assert_eq!(
        detail.current_payment.map(|p| p.status),
        Some(PaymentStatus::Cancelled)
    );
    assert_eq!(stock_of(state, a).await, 15);

    let err = state.orders.cancel(&customer(7), order.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderTransition);
    // 不会重复回补
    assert_eq!(stock_of(state, a).await, 15);
}

#[tokio::test]
async fn test_cancel_voids_payment_awaiting_verification() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    let order = place_order(state, 7, a, 1).await.order;
    let summary = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap();

    state.orders.cancel(&customer(7), order.id).await.unwrap();
    let payment = state.payments.get(&finance(2), summary.payment_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Cancelled);

    // 作废后不能再审核为已付款
    let err = state
        .payments
        .verify(
            &finance(2),
            summary.payment_id,
            PaymentVerify {
                status: PaymentStatus::Paid,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPaymentTransition);
}

#[tokio::test]
async fn test_customer_cannot_cancel_others_or_processing_orders() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    let order = place_order(state, 7, a, 1).await.order;

    let err = state.orders.cancel(&customer(8), order.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    assert_eq!(stock_of(state, a).await, 4);

    let summary = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap();
    state
        .payments
        .verify(
            &finance(2),
            summary.payment_id,
            PaymentVerify {
                status: PaymentStatus::Paid,
                notes: None,
            },
        )
        .await
        .unwrap();
    state
        .orders
        .change_status(&admin(1), order.id, status(OrderStatus::Processing))
        .await
        .unwrap();

    let err = state.orders.cancel(&customer(7), order.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderTransition);
}

#[tokio::test]
async fn test_staff_cancel_of_processing_order_allows_refund() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    let order = place_order(state, 7, a, 3).await.order;
    let summary = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 300.0))
        .await
        .unwrap();
    let paid = PaymentVerify {
        status: PaymentStatus::Paid,
        notes: None,
    };
    state
        .payments
        .verify(&finance(2), summary.payment_id, paid)
        .await
        .unwrap();
    state
        .orders
        .change_status(&admin(1), order.id, status(OrderStatus::Processing))
        .await
        .unwrap();

    let refund = PaymentVerify {
        status: PaymentStatus::Refunded,
        notes: Some("refund before cancel".into()),
    };
    // 订单未取消时不可退款
    let err = state
        .payments
        .verify(&finance(2), summary.payment_id, refund.clone())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPaymentTransition);

    let detail = state
        .orders
        .change_status(&admin(1), order.id, status(OrderStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(detail.order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(state, a).await, 5);
    // 已结算付款不被作废
    assert_eq!(
        detail.current_payment.map(|p| p.status),
        Some(PaymentStatus::Paid)
    );

    let payment = state
        .payments
        .verify(&finance(2), summary.payment_id, refund)
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn test_terminal_orders_reject_transitions() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    let order = place_order(state, 7, a, 1).await.order;
    state.orders.cancel(&customer(7), order.id).await.unwrap();

    for to in [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        let err = state
            .orders
            .change_status(&admin(1), order.id, status(to))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderTransition, "to {to}");
    }
    assert_eq!(stock_of(state, a).await, 5);
}

#[tokio::test]
async fn test_service_lines_do_not_touch_stock_on_cancel() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    let b = service(state, "Service B", 200.0).await;
    let order = state
        .checkout
        .checkout(items_request(
            7,
            vec![
                line(shared::models::ItemKind::Product, a, 2),
                line(shared::models::ItemKind::Service, b, 1),
            ],
            None,
        ))
        .await
        .unwrap()
        .order;
    assert_eq!(order.total_amount, 400.0);
    assert_eq!(stock_of(state, a).await, 3);

    let detail = state.orders.cancel(&customer(7), order.id).await.unwrap();
    assert!(detail.current_payment.is_none());
    assert_eq!(stock_of(state, a).await, 5);
}
