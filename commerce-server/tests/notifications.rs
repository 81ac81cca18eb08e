//! 通知 outbox：投递、失败重试、读取

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use commerce_server::db::repository::notification::{self, NewNotification, OutboxRow};
use commerce_server::notify::{NotificationSink, NotifyError, NotifyWorker, StoreSink};
use common::*;
use shared::models::{NotificationKind, OrderStatus, PaymentStatus, PaymentVerify};
use tokio_util::sync::CancellationToken;

/// 总是失败的投递目标
struct DownSink {
    calls: AtomicUsize,
}

#[async_trait]
impl NotificationSink for DownSink {
    async fn publish(&self, _event: &OutboxRow) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Unavailable("connection refused".into()))
    }
}

fn worker(state: &commerce_server::ServerState, sink: Arc<dyn NotificationSink>) -> NotifyWorker {
    NotifyWorker::new(
        state.pool.clone(),
        sink,
        state.emitter.wake_handle(),
        Duration::from_secs(60),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn test_failing_sink_never_affects_orders() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    let order = place_order(state, 7, a, 1).await.order;

    let sink = Arc::new(DownSink {
        calls: AtomicUsize::new(0),
    });
    let worker = worker(state, sink.clone());
    assert_eq!(worker.drain().await.unwrap(), 0);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 2);

    let detail = state.orders.get(&customer(7), order.id).await.unwrap();
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(stock_of(state, a).await, 4);

    assert_eq!(
        count(
            state,
            "SELECT COUNT(*) FROM notification_outbox WHERE attempts = 1 AND last_error IS NOT NULL AND published_at IS NULL"
        )
        .await,
        2
    );

    // 达到上限后停止重试
    for _ in 0..10 {
        worker.drain().await.unwrap();
    }
    assert_eq!(
        sink.calls.load(Ordering::SeqCst) as i64,
        2 * commerce_server::notify::worker::MAX_ATTEMPTS
    );
}

#[tokio::test]
async fn test_store_sink_delivers_once() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    let order = place_order(state, 7, a, 1).await.order;
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

    let worker = worker(state, Arc::new(StoreSink::new(state.pool.clone())));
    // created x2, uploaded, verified
    assert_eq!(worker.drain().await.unwrap(), 4);
    assert_eq!(worker.drain().await.unwrap(), 0);

    let mine = notification::list_for_user(&state.pool, 7, false, false, 50)
        .await
        .unwrap();
    let kinds: Vec<_> = mine.iter().map(|n| n.kind).collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&NotificationKind::OrderCreated));
    assert!(kinds.contains(&NotificationKind::PaymentVerified));

    let staff = notification::list_for_user(&state.pool, 2, true, false, 50)
        .await
        .unwrap();
    assert_eq!(staff.len(), 2);
    assert!(staff.iter().all(|n| n.user_id.is_none()));

    // 其他客户看不到
    let other = notification::list_for_user(&state.pool, 8, false, false, 50)
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn test_mark_read_is_scoped() {
    let ctx = setup().await;
    let state = &ctx.state;
    let a = product(state, "Product A", 100.0, 5).await;
    place_order(state, 7, a, 1).await;
    place_order(state, 8, a, 1).await;
    worker(state, Arc::new(StoreSink::new(state.pool.clone())))
        .drain()
        .await
        .unwrap();

    let others = notification::list_for_user(&state.pool, 8, false, false, 50)
        .await
        .unwrap();
    let foreign_ids: Vec<i64> = others.iter().map(|n| n.id).collect();
    assert_eq!(
        notification::mark_read(&state.pool, 7, false, Some(foreign_ids.as_slice()))
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        notification::mark_read(&state.pool, 7, false, None).await.unwrap(),
        1
    );
    let unread = notification::list_for_user(&state.pool, 7, false, true, 50)
        .await
        .unwrap();
    assert!(unread.is_empty());
    let unread = notification::list_for_user(&state.pool, 8, false, true, 50)
        .await
        .unwrap();
    assert_eq!(unread.len(), 1);
}

#[tokio::test]
async fn test_background_worker_delivers_after_wake() {
    let ctx = setup().await;
    let state = &ctx.state;
    let tasks = state.start_background_tasks();
    let a = product(state, "Product A", 100.0, 5).await;
    place_order(state, 7, a, 1).await;

    let delivered = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if count(state, "SELECT COUNT(*) FROM notification WHERE user_id = 7").await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(delivered.is_ok(), "notification was not delivered");

    tasks.shutdown().await;
}

#[tokio::test]
async fn test_large_backlog_gets_one_attempt_per_drain() {
    let ctx = setup().await;
    let state = &ctx.state;
    for i in 0..150 {
        notification::enqueue(
            &state.pool,
            &NewNotification {
                kind: NotificationKind::OrderCreated,
                user_id: Some(7),
                title: "Order created".into(),
                message: format!("Order #{i}"),
                order_id: None,
                payment_id: None,
            },
        )
        .await
        .unwrap();
    }

    let sink = Arc::new(DownSink {
        calls: AtomicUsize::new(0),
    });
    let worker = worker(state, sink.clone());
    assert_eq!(worker.drain().await.unwrap(), 0);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 150);
    assert_eq!(
        count(state, "SELECT COUNT(*) FROM notification_outbox WHERE attempts = 1").await,
        150
    );

    worker.drain().await.unwrap();
    assert_eq!(sink.calls.load(Ordering::SeqCst), 300);
    assert_eq!(
        count(state, "SELECT COUNT(*) FROM notification_outbox WHERE attempts = 2").await,
        150
    );
}
