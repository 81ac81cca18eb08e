//! Notification Emitter

use std::sync::Arc;

use sqlx::SqliteConnection;
use tokio::sync::Notify;

use crate::db::repository::RepoResult;
use crate::db::repository::notification::{self, NewNotification};

/// 事务内入队，提交后唤醒 worker
///
/// Clone 成本极低（共享同一个 `Notify`）。
#[derive(Debug, Clone, Default)]
pub struct NotificationEmitter {
    wake: Arc<Notify>,
}

impl NotificationEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared wake handle for the worker
    pub fn wake_handle(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// 写入 outbox（调用方必须传入正在进行的事务连接）
    pub async fn enqueue(
        &self,
        conn: &mut SqliteConnection,
        events: &[NewNotification],
    ) -> RepoResult<()> {
        for event in events {
            let id = notification::enqueue(&mut *conn, event).await?;
            tracing::debug!(outbox_id = id, kind = ?event.kind, "Notification enqueued");
        }
        Ok(())
    }

    /// 事务提交后调用
    pub fn wake(&self) {
        self.wake.notify_one();
    }
}
