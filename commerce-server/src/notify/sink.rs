//! 通知投递目标

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::repository::notification::{self, OutboxRow};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// Fire-and-forget event sink
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: &OutboxRow) -> Result<(), NotifyError>;
}

/// 默认实现：写入用户通知表，供 `GET /api/notifications` 读取
#[derive(Debug, Clone)]
pub struct StoreSink {
    pool: SqlitePool,
}

impl StoreSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSink for StoreSink {
    async fn publish(&self, event: &OutboxRow) -> Result<(), NotifyError> {
        notification::deliver(&self.pool, event)
            .await
            .map_err(|e| NotifyError::Unavailable(e.to_string()))
    }
}
