//! 并发下的库存与付款一致性（文件库，多连接）

mod common;

use commerce_server::ErrorCode;
use common::*;
use futures::future::join_all;
use shared::models::{ItemKind, PaymentStatus, PaymentVerify};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_unit_is_sold_once() {
    let ctx = setup_file_backed().await;
    let state = &ctx.state;
    let a = product(state, "Last Unit", 500.0, 1).await;

    let attempts = (0..8).map(|i| {
        let checkout = state.checkout.clone();
        tokio::spawn(async move {
            checkout
                .checkout(items_request(
                    100 + i,
                    vec![line(ItemKind::Product, a, 1)],
                    Some("BANK_TRANSFER"),
                ))
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("checkout task panicked"))
        .collect();

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code(), ErrorCode::InsufficientStock, "{err}");
    }
    assert_eq!(stock_of(state, a).await, 0);
    assert_eq!(count(state, "SELECT COUNT(*) FROM orders").await, 1);
    assert_eq!(count(state, "SELECT COUNT(*) FROM order_item").await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_stock_never_goes_negative() {
    let ctx = setup_file_backed().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 10.0, 10).await;

    // 6 个请求各买 3 件，最多成功 3 个
    let attempts = (0..6).map(|i| {
        let checkout = state.checkout.clone();
        tokio::spawn(async move {
            checkout
                .checkout(items_request(200 + i, vec![line(ItemKind::Product, a, 3)], None))
                .await
        })
    });
    let succeeded = join_all(attempts)
        .await
        .into_iter()
        .filter(|joined| matches!(joined, Ok(Ok(_))))
        .count();

    assert_eq!(succeeded, 3);
    assert_eq!(stock_of(state, a).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verification_notifies_once() {
    let ctx = setup_file_backed().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    let order = place_order(state, 7, a, 1).await.order;
    let summary = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap();

    let attempts = (0..4).map(|i| {
        let payments = state.payments.clone();
        let payment_id = summary.payment_id;
        tokio::spawn(async move {
            payments
                .verify(
                    &finance(2 + i),
                    payment_id,
                    PaymentVerify {
                        status: PaymentStatus::Paid,
                        notes: None,
                    },
                )
                .await
        })
    });
    for joined in join_all(attempts).await {
        let payment = joined.expect("verify task panicked").unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
    }

    assert_eq!(
        count(
            state,
            "SELECT COUNT(*) FROM notification_outbox WHERE kind = 'PAYMENT_VERIFIED'"
        )
        .await,
        1
    );
    let detail = state.orders.get(&customer(7), order.id).await.unwrap();
    assert!(detail.order.payment_confirmed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_proof_submissions_attach_once() {
    let ctx = setup_file_backed().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    let order = place_order(state, 7, a, 1).await.order;

    let attempts = (0..4).map(|_| {
        let payments = state.payments.clone();
        let order_id = order.id;
        tokio::spawn(async move {
            payments
                .submit_proof(&customer(7), png_proof(order_id, 100.0))
                .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("submit task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code, ErrorCode::PaymentAlreadySubmitted);
    }
    assert_eq!(count(state, "SELECT COUNT(*) FROM payment").await, 1);

    // 失败方不会删除成功方引用的凭证
    let proof_url = results
        .iter()
        .find_map(|r| r.as_ref().ok())
        .and_then(|s| s.payment_proof.clone())
        .unwrap();
    let key = proof_url.rsplit('/').next().unwrap();
    assert!(state.payments.open_proof(&customer(7), key).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_proof_file_survives_losing_submissions() {
    let ctx = setup_file_backed().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 50).await;

    for round in 0..5 {
        let first = place_order(state, 7, a, 1).await.order;
        let second = place_order(state, 8, a, 1).await.order;
        let bytes = format!("\u{89}PNG shared receipt {round}").into_bytes();

        let attempts = [(7, first.id), (8, second.id)]
            .into_iter()
            .flat_map(|target| std::iter::repeat_n(target, 3))
            .map(|(user_id, order_id)| {
                let payments = state.payments.clone();
                let mut submission = png_proof(order_id, 100.0);
                submission.file.bytes = bytes.clone();
                tokio::spawn(async move { payments.submit_proof(&customer(user_id), submission).await })
            });
        let results: Vec<_> = join_all(attempts)
            .await
            .into_iter()
            .map(|joined| joined.expect("submit task panicked"))
            .collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);

        // 两笔付款共享同一文件，失败方不能删除
        for (user_id, summary) in [7, 7, 7, 8, 8, 8].into_iter().zip(&results) {
            let Ok(summary) = summary else { continue };
            let url = summary.payment_proof.clone().unwrap();
            let key = url.rsplit('/').next().unwrap();
            assert!(state.payments.open_proof(&customer(user_id), key).await.is_ok());
        }
    }
}
