//! Notification outbox worker
//!
//! 唤醒或定时扫描未投递的 outbox 行，交给 [`NotificationSink`]。
//! 单条失败累加 `attempts` 并记录 `last_error`，达到上限后不再重试。
//! 每次 drain 按游标前进，同一行最多尝试一次，重试间隔由下一次扫描决定。

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use super::sink::NotificationSink;
use crate::db::repository::RepoResult;
use crate::db::repository::notification;

/// 单条事件最多投递次数
pub const MAX_ATTEMPTS: i64 = 5;
const BATCH_SIZE: i64 = 100;

pub struct NotifyWorker {
    pool: SqlitePool,
    sink: Arc<dyn NotificationSink>,
    wake: Arc<Notify>,
    scan_interval: Duration,
    shutdown: CancellationToken,
}

impl NotifyWorker {
    pub fn new(
        pool: SqlitePool,
        sink: Arc<dyn NotificationSink>,
        wake: Arc<Notify>,
        scan_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pool,
            sink,
            wake,
            scan_interval,
            shutdown,
        }
    }

    /// 主循环：启动扫描 + 唤醒 + 定时兜底
    pub async fn run(self) {
        tracing::info!(
            interval_ms = self.scan_interval.as_millis() as u64,
            "Notification worker started"
        );

        loop {
            if let Err(e) = self.drain().await {
                tracing::warn!(error = %e, "Notification outbox scan failed");
            }

            tokio::select! {
                _ = self.wake.notified() => {}
                _ = tokio::time::sleep(self.scan_interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Notification worker received shutdown signal");
                    return;
                }
            }
        }
    }

    /// 投递所有待发送事件，返回成功投递数
    pub async fn drain(&self) -> RepoResult<usize> {
        let mut delivered = 0;
        let mut cursor = None;
        loop {
            let pending =
                notification::find_pending(&self.pool, MAX_ATTEMPTS, cursor, BATCH_SIZE).await?;
            let batch_len = pending.len();
            if let Some(last) = pending.last() {
                cursor = Some((last.created_at, last.id));
            }

            for row in pending {
                match self.sink.publish(&row).await {
                    Ok(()) => {
                        notification::mark_published(&self.pool, row.id).await?;
                        delivered += 1;
                    }
                    Err(e) => {
                        let attempt = row.attempts + 1;
                        tracing::warn!(
                            outbox_id = row.id,
                            kind = ?row.kind,
                            attempt,
                            max_attempts = MAX_ATTEMPTS,
                            error = %e,
                            "Notification delivery failed"
                        );
                        notification::mark_failed(&self.pool, row.id, &e.to_string()).await?;
                    }
                }
            }

            if (batch_len as i64) < BATCH_SIZE {
                break;
            }
        }
        if delivered > 0 {
            tracing::debug!(delivered, "Notifications delivered");
        }
        Ok(delivered)
    }
}
