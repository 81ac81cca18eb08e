//! Payment Repository
//!
//! 支付状态只通过条件更新 (`WHERE status = ?`) 迁移，保证同一行上的迁移线性化。

use super::RepoResult;
use shared::models::{Payment, PaymentStatus};
use sqlx::SqliteExecutor;

const PAYMENT_SELECT: &str = "SELECT id, order_id, amount, method, status, payment_proof, proof_key, claimed_amount, submitted_at, verified_at, verifier_id, notes, created_at, updated_at FROM payment";

/// Proof attachment written on submit
pub struct ProofAttachment<'a> {
    pub url: &'a str,
    pub key: &'a str,
    pub claimed_amount: f64,
    pub submitted_at: i64,
}

/// 创建付款记录
pub async fn insert<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    order_id: i64,
    amount: f64,
    method: Option<&str>,
    notes: Option<&str>,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO payment (id, order_id, amount, method, status, notes, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?6, ?6)",
    )
    .bind(id)
    .bind(order_id)
    .bind(amount)
    .bind(method)
    .bind(notes)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

/// 新建一条已附凭证的付款记录（重新付款）
pub async fn insert_submitted<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    order_id: i64,
    amount: f64,
    method: Option<&str>,
    proof: &ProofAttachment<'_>,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO payment (id, order_id, amount, method, status, payment_proof, proof_key, claimed_amount, submitted_at, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'PENDING_VERIFICATION', ?5, ?6, ?7, ?8, ?8, ?8)",
    )
    .bind(id)
    .bind(order_id)
    .bind(amount)
    .bind(method)
    .bind(proof.url)
    .bind(proof.key)
    .bind(proof.claimed_amount)
    .bind(proof.submitted_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Whether the order already has any payment row
pub async fn exists_for_order<'e>(
    executor: impl SqliteExecutor<'e>,
    order_id: i64,
) -> RepoResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM payment WHERE order_id = ?)")
        .bind(order_id)
        .fetch_one(executor)
        .await?;
    Ok(exists)
}

pub async fn find_by_id<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Payment>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn find_by_order<'e>(
    executor: impl SqliteExecutor<'e>,
    order_id: i64,
) -> RepoResult<Vec<Payment>> {
    let sql = format!("{PAYMENT_SELECT} WHERE order_id = ? ORDER BY created_at DESC, id DESC");
    let rows = sqlx::query_as::<_, Payment>(&sql)
        .bind(order_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

/// PENDING -> PENDING_VERIFICATION，附加凭证
pub async fn attach_proof_if_pending<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    method: Option<&str>,
    proof: &ProofAttachment<'_>,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE payment SET status = 'PENDING_VERIFICATION', payment_proof = ?1, proof_key = ?2, claimed_amount = ?3, submitted_at = ?4, method = COALESCE(?5, method), updated_at = ?4 \
         WHERE id = ?6 AND status = 'PENDING'",
    )
    .bind(proof.url)
    .bind(proof.key)
    .bind(proof.claimed_amount)
    .bind(proof.submitted_at)
    .bind(method)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// 审核迁移：仅当当前状态为 `from` 时生效，记录审核人与时间
pub async fn verify_if<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    from: PaymentStatus,
    to: PaymentStatus,
    verifier_id: i64,
    notes: Option<&str>,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE payment SET status = ?1, verified_at = ?2, verifier_id = ?3, notes = COALESCE(?4, notes), updated_at = ?2 WHERE id = ?5 AND status = ?6",
    )
    .bind(to)
    .bind(now)
    .bind(verifier_id)
    .bind(notes)
    .bind(id)
    .bind(from)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// 订单取消时作废未结算的付款
pub async fn void_if_unsettled<'e>(executor: impl SqliteExecutor<'e>, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE payment SET status = 'CANCELLED', updated_at = ?1 WHERE id = ?2 AND status IN ('PENDING', 'PENDING_VERIFICATION')",
    )
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Owners of the orders whose payments reference a stored proof
pub async fn proof_owners<'e>(
    executor: impl SqliteExecutor<'e>,
    proof_key: &str,
) -> RepoResult<Vec<i64>> {
    let owners = sqlx::query_scalar(
        "SELECT DISTINCT o.user_id FROM payment p JOIN orders o ON o.id = p.order_id WHERE p.proof_key = ?",
    )
    .bind(proof_key)
    .fetch_all(executor)
    .await?;
    Ok(owners)
}
