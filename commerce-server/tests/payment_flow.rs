//! 付款凭证提交与财务审核 集成测试

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use commerce_server::ErrorCode;
use commerce_server::payments::{ProofStorage, ProofUpload, StorageError, StoredProof};
use common::*;
use shared::models::{OrderStatus, OrderStatusUpdate, PaymentStatus, PaymentVerify};

fn verify(status: PaymentStatus) -> PaymentVerify {
    PaymentVerify {
        status,
        notes: Some("checked bank statement".into()),
    }
}

fn to_processing() -> OrderStatusUpdate {
    OrderStatusUpdate {
        status: OrderStatus::Processing,
        notes: None,
    }
}

#[tokio::test]
async fn test_processing_requires_verified_payment() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 350000.0, 15).await;
    let order = place_order(state, 7, a, 2).await.order;

    // 付款尚为 PENDING
    let err = state
        .orders
        .change_status(&admin(1), order.id, to_processing())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentNotConfirmed);

    let summary = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 700000.0))
        .await
        .unwrap();
    assert_eq!(summary.status, PaymentStatus::PendingVerification);
    assert_eq!(summary.claimed_amount, Some(700000.0));
    assert_eq!(summary.amount, 700000.0);
    let proof_url = summary.payment_proof.clone().expect("proof url");
    assert!(proof_url.contains("/api/uploads/payments/"));

    // 等待财务审核时仍不可处理
    let err = state
        .orders
        .change_status(&admin(1), order.id, to_processing())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentNotConfirmed);
    let details = err.details.expect("guard details");
    assert_eq!(details["payment_status"], "PENDING_VERIFICATION");

    let payment = state
        .payments
        .verify(&finance(2), summary.payment_id, verify(PaymentStatus::Paid))
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.verifier_id, Some(2));
    assert!(payment.verified_at.is_some());

    let detail = state.orders.get(&customer(7), order.id).await.unwrap();
    assert!(detail.order.payment_confirmed);

    let detail = state
        .orders
        .change_status(&admin(1), order.id, to_processing())
        .await
        .unwrap();
    assert_eq!(detail.order.status, OrderStatus::Processing);
}

#[tokio::test]
async fn test_verify_is_idempotent() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;
    let summary = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap();

    let first = state
        .payments
        .verify(&finance(2), summary.payment_id, verify(PaymentStatus::Paid))
        .await
        .unwrap();
    let second = state
        .payments
        .verify(&finance(3), summary.payment_id, verify(PaymentStatus::Paid))
        .await
        .unwrap();

    assert_eq!(first.status, PaymentStatus::Paid);
    assert_eq!(second.status, PaymentStatus::Paid);
    // 第二次不覆盖审核人
    assert_eq!(second.verifier_id, Some(2));
    assert_eq!(
        count(
            state,
            "SELECT COUNT(*) FROM notification_outbox WHERE kind = 'PAYMENT_VERIFIED'"
        )
        .await,
        1
    );

    // 已付款不能改为失败
    let err = state
        .payments
        .verify(&finance(2), summary.payment_id, verify(PaymentStatus::Failed))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidPaymentTransition);
}

#[tokio::test]
async fn test_only_finance_verifies() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;
    let summary = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap();

    for caller in [customer(7), admin(1), user(4, commerce_server::Role::Owner)] {
        let err = state
            .payments
            .verify(&caller, summary.payment_id, verify(PaymentStatus::Paid))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
    let payment = state.payments.get(&finance(2), summary.payment_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::PendingVerification);
}

#[tokio::test]
async fn test_second_submission_rejected_while_pending_verification() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;

    state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap();
    let err = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentAlreadySubmitted);
    assert_eq!(count(state, "SELECT COUNT(*) FROM payment").await, 1);
}

#[tokio::test]
async fn test_rejected_payment_can_be_resubmitted() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;

    let first = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 90.0))
        .await
        .unwrap();
    state
        .payments
        .verify(&finance(2), first.payment_id, verify(PaymentStatus::Failed))
        .await
        .unwrap();
    assert_eq!(
        count(
            state,
            "SELECT COUNT(*) FROM notification_outbox WHERE kind = 'PAYMENT_REJECTED'"
        )
        .await,
        1
    );

    let second = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap();
    assert_ne!(second.payment_id, first.payment_id);
    assert_eq!(second.status, PaymentStatus::PendingVerification);

    let detail = state.orders.get(&customer(7), order.id).await.unwrap();
    assert_eq!(detail.payments.len(), 2);
    assert_eq!(detail.order.current_payment_id, Some(second.payment_id));
    assert_eq!(
        detail.current_payment.map(|p| p.status),
        Some(PaymentStatus::PendingVerification)
    );
}

#[tokio::test]
async fn test_order_without_payment_gets_one_on_submit() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = state
        .checkout
        .checkout(items_request(
            7,
            vec![line(shared::models::ItemKind::Product, a, 2)],
            None,
        ))
        .await
        .unwrap()
        .order;
    assert!(order.current_payment_id.is_none());

    let summary = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 200.0))
        .await
        .unwrap();
    assert_eq!(summary.amount, 200.0);
    let detail = state.orders.get(&customer(7), order.id).await.unwrap();
    assert_eq!(detail.order.current_payment_id, Some(summary.payment_id));
}

#[tokio::test]
async fn test_submit_rejects_foreign_or_closed_orders() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;

    let err = state
        .payments
        .submit_proof(&customer(8), png_proof(order.id, 100.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotOwned);
    assert_eq!(err.http_status(), http::StatusCode::NOT_FOUND);

    let err = state
        .payments
        .submit_proof(&customer(7), png_proof(999_999, 100.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);

    state.orders.cancel(&customer(7), order.id).await.unwrap();
    let err = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderTransition);
}

#[tokio::test]
async fn test_submit_validates_file_and_amount() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;

    let mut gif = png_proof(order.id, 100.0);
    gif.file.content_type = Some("image/gif".into());
    let err = state.payments.submit_proof(&customer(7), gif).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedMediaType);

    let mut empty = png_proof(order.id, 100.0);
    empty.file.bytes.clear();
    let err = state.payments.submit_proof(&customer(7), empty).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let mut negative = png_proof(order.id, 100.0);
    negative.amount = -5.0;
    let err = state
        .payments
        .submit_proof(&customer(7), negative)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidAmount);

    // PDF 由扩展名推断
    let mut pdf = png_proof(order.id, 100.0);
    pdf.file.content_type = Some("application/octet-stream".into());
    pdf.file.file_name = Some("transfer.pdf".into());
    let summary = state.payments.submit_proof(&customer(7), pdf).await.unwrap();
    assert!(summary.payment_proof.unwrap().ends_with(".pdf"));
}

#[tokio::test]
async fn test_oversized_proof_rejected() {
    let ctx = setup_with(|config| config.max_proof_size = 1024).await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;

    let mut large = png_proof(order.id, 100.0);
    large.file.bytes = vec![0u8; 2048];
    let err = state.payments.submit_proof(&customer(7), large).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PayloadTooLarge);
    assert_eq!(err.details.unwrap()["max_size"], 1024);
}

#[tokio::test]
async fn test_customer_reads_only_own_payment() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let detail = place_order(state, 7, a, 1).await;
    let payment_id = detail.order.current_payment_id.unwrap();

    assert!(state.payments.get(&customer(7), payment_id).await.is_ok());
    assert!(state.payments.get(&finance(2), payment_id).await.is_ok());
    let err = state.payments.get(&customer(8), payment_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
    let err = state.payments.get(&finance(2), 123).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentNotFound);
}

/// 总是失败的存储
struct BrokenStorage;

#[async_trait]
impl ProofStorage for BrokenStorage {
    async fn store(&self, _upload: &ProofUpload) -> Result<StoredProof, StorageError> {
        Err(StorageError::Io(std::io::Error::other("disk full")))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn open(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }
}

/// 永不返回的存储
struct HangingStorage;

#[async_trait]
impl ProofStorage for HangingStorage {
    async fn store(&self, _upload: &ProofUpload) -> Result<StoredProof, StorageError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Err(StorageError::InvalidKey("never".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn open(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_storage_failure_leaves_payment_untouched() {
    let ctx = setup_with_storage(Arc::new(BrokenStorage), 5_000).await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;

    let err = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProofStorageFailed);
    assert_eq!(err.http_status(), http::StatusCode::BAD_GATEWAY);

    let payment = state
        .payments
        .get(&customer(7), order.current_payment_id.unwrap())
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert!(payment.payment_proof.is_none());
}

#[tokio::test]
async fn test_storage_timeout_is_bounded() {
    let ctx = setup_with_storage(Arc::new(HangingStorage), 50).await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;

    let err = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProofStorageTimeout);
    assert_eq!(
        count(
            state,
            "SELECT COUNT(*) FROM payment WHERE status = 'PENDING_VERIFICATION'"
        )
        .await,
        0
    );
}

#[tokio::test]
async fn test_proof_is_readable_by_owner_and_staff_only() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let order = place_order(state, 7, a, 1).await.order;
    let summary = state
        .payments
        .submit_proof(&customer(7), png_proof(order.id, 100.0))
        .await
        .unwrap();
    let url = summary.payment_proof.unwrap();
    let key = url.rsplit('/').next().unwrap().to_string();

    let (bytes, content_type) = state.payments.open_proof(&customer(7), &key).await.unwrap();
    assert_eq!(content_type, "image/png");
    assert!(!bytes.is_empty());
    assert!(state.payments.open_proof(&finance(2), &key).await.is_ok());

    let err = state.payments.open_proof(&customer(8), &key).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    let err = state
        .payments
        .open_proof(&customer(7), "../../etc/passwd")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}

#[tokio::test]
async fn test_payment_without_order_is_not_found_for_customer() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 15).await;
    let detail = place_order(state, 7, a, 1).await;
    let payment_id = detail.order.current_payment_id.unwrap();

    // 单连接内存库：关闭外键后删除订单，留下悬空付款
    sqlx::query("PRAGMA foreign_keys = OFF").execute(&state.pool).await.unwrap();
    sqlx::query("DELETE FROM orders WHERE id = ?1")
        .bind(detail.order.id)
        .execute(&state.pool)
        .await
        .unwrap();

    let err = state.payments.get(&customer(0), payment_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentNotFound);
    let err = state.payments.get(&customer(7), payment_id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentNotFound);
}
