//! Notification Repository
//!
//! `notification_outbox` 与主写入同事务落库；worker 投递后写入 `notification`。

use super::RepoResult;
use shared::models::{Notification, NotificationKind};
use sqlx::{SqliteExecutor, SqlitePool};

/// Pending outbox row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OutboxRow {
    pub id: i64,
    pub kind: NotificationKind,
    pub user_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub order_id: Option<i64>,
    pub payment_id: Option<i64>,
    pub attempts: i64,
    pub created_at: i64,
}

/// Event to enqueue
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub kind: NotificationKind,
    /// `None` = all staff
    pub user_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub order_id: Option<i64>,
    pub payment_id: Option<i64>,
}

pub async fn enqueue<'e>(
    executor: impl SqliteExecutor<'e>,
    event: &NewNotification,
) -> RepoResult<i64> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO notification_outbox (id, kind, user_id, title, message, order_id, payment_id, attempts, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8)",
    )
    .bind(id)
    .bind(event.kind)
    .bind(event.user_id)
    .bind(&event.title)
    .bind(&event.message)
    .bind(event.order_id)
    .bind(event.payment_id)
    .bind(shared::util::now_millis())
    .execute(executor)
    .await?;
    Ok(id)
}

/// Unpublished rows still under the attempt limit, oldest first
///
/// `after` is a `(created_at, id)` cursor; only rows strictly after it are returned.
pub async fn find_pending(
    pool: &SqlitePool,
    max_attempts: i64,
    after: Option<(i64, i64)>,
    limit: i64,
) -> RepoResult<Vec<OutboxRow>> {
    let (after_created, after_id) = after.unwrap_or((i64::MIN, i64::MIN));
    let rows = sqlx::query_as::<_, OutboxRow>(
        "SELECT id, kind, user_id, title, message, order_id, payment_id, attempts, created_at FROM notification_outbox \
         WHERE published_at IS NULL AND attempts < ?1 AND (created_at > ?2 OR (created_at = ?2 AND id > ?3)) \
         ORDER BY created_at, id LIMIT ?4",
    )
    .bind(max_attempts)
    .bind(after_created)
    .bind(after_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn mark_published(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE notification_outbox SET published_at = ?1, attempts = attempts + 1 WHERE id = ?2")
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_failed(pool: &SqlitePool, id: i64, error: &str) -> RepoResult<()> {
    sqlx::query("UPDATE notification_outbox SET attempts = attempts + 1, last_error = ?1 WHERE id = ?2")
        .bind(error)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// 投递：写入用户可见通知（以 outbox id 作主键，重复投递幂等）
pub async fn deliver(pool: &SqlitePool, row: &OutboxRow) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO notification (id, user_id, kind, title, message, order_id, payment_id, is_read, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8) \
         ON CONFLICT(id) DO NOTHING",
    )
    .bind(row.id)
    .bind(row.user_id)
    .bind(row.kind)
    .bind(&row.title)
    .bind(&row.message)
    .bind(row.order_id)
    .bind(row.payment_id)
    .bind(row.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// 用户通知列表；`include_staff` 时同时包含员工广播
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: i64,
    include_staff: bool,
    unread_only: bool,
    limit: i64,
) -> RepoResult<Vec<Notification>> {
    let rows = sqlx::query_as::<_, Notification>(
        "SELECT id, user_id, kind, title, message, order_id, payment_id, is_read, created_at FROM notification \
         WHERE (user_id = ?1 OR (?2 AND user_id IS NULL)) AND (?3 = 0 OR is_read = 0) \
         ORDER BY created_at DESC, id DESC LIMIT ?4",
    )
    .bind(user_id)
    .bind(include_staff)
    .bind(unread_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// 标记已读；仅影响调用方可见的通知
pub async fn mark_read(
    pool: &SqlitePool,
    user_id: i64,
    include_staff: bool,
    ids: Option<&[i64]>,
) -> RepoResult<u64> {
    const VISIBLE: &str = "(user_id = ?1 OR (?2 AND user_id IS NULL))";
    match ids {
        None => {
            let sql = format!("UPDATE notification SET is_read = 1 WHERE is_read = 0 AND {VISIBLE}");
            let rows = sqlx::query(&sql)
                .bind(user_id)
                .bind(include_staff)
                .execute(pool)
                .await?;
            Ok(rows.rows_affected())
        }
        Some(ids) => {
            let sql = format!("UPDATE notification SET is_read = 1 WHERE id = ?3 AND {VISIBLE}");
            let mut updated = 0;
            for id in ids {
                let rows = sqlx::query(&sql)
                    .bind(user_id)
                    .bind(include_staff)
                    .bind(id)
                    .execute(pool)
                    .await?;
                updated += rows.rows_affected();
            }
            Ok(updated)
        }
    }
}
