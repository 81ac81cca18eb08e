//! Payment ledger
//!
//! 凭证提交顺序：校验 → 订单归属与付款状态 → 存储（带超时）→ 单个写事务。
//! 写事务失败时尽力删除本次新写入的凭证文件，不会留下半条付款记录。
//!
//! 凭证按内容寻址，多笔付款可能共享同一文件。提交在“存储 → 提交事务”期间
//! 持有 `proof_gate` 读锁；清理持写锁再检查引用，保证不会删掉即将被引用的文件。

use std::sync::Arc;
use std::time::Duration;

use shared::models::{Order, OrderStatus, Payment, PaymentStatus, PaymentSummary, PaymentVerify};
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use super::media;
use super::state::{self, SubmitTarget};
use super::storage::{ProofStorage, ProofUpload, StoredProof};
use crate::auth::{CurrentUser, Operation, Scope};
use crate::db::repository::payment::ProofAttachment;
use crate::db::repository::{RepoError, order, payment};
use crate::error::{CommerceError, CommerceResult};
use crate::notify::{NotificationEmitter, events};
use crate::utils::AppResult;
use crate::utils::validation::{normalize_text, validate_amount};

/// Uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct ProofFile {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// `POST /api/payments/confirm` input
#[derive(Debug, Clone)]
pub struct ProofSubmission {
    pub order_id: i64,
    /// Amount the customer claims to have transferred
    pub amount: f64,
    pub method: Option<String>,
    pub file: ProofFile,
}

#[derive(Clone)]
pub struct PaymentLedger {
    pool: SqlitePool,
    storage: Arc<dyn ProofStorage>,
    emitter: NotificationEmitter,
    upload_timeout: Duration,
    max_proof_size: usize,
    proof_gate: Arc<RwLock<()>>,
}

impl PaymentLedger {
    pub fn new(
        pool: SqlitePool,
        storage: Arc<dyn ProofStorage>,
        emitter: NotificationEmitter,
        upload_timeout: Duration,
        max_proof_size: usize,
    ) -> Self {
        Self {
            pool,
            storage,
            emitter,
            upload_timeout,
            max_proof_size,
            proof_gate: Arc::new(RwLock::new(())),
        }
    }

    /// 客户提交付款凭证
    pub async fn submit_proof(
        &self,
        user: &CurrentUser,
        submission: ProofSubmission,
    ) -> AppResult<PaymentSummary> {
        user.authorize(Operation::SubmitPaymentProof)?;
        Ok(self.submit(user.id, submission).await?)
    }

    async fn submit(&self, user_id: i64, submission: ProofSubmission) -> CommerceResult<PaymentSummary> {
        validate_amount(submission.amount)?;
        let method = normalize_text("method", submission.method)?;
        media::validate_size(submission.file.bytes.len(), self.max_proof_size)?;
        let media = media::detect(
            submission.file.content_type.as_deref(),
            submission.file.file_name.as_deref(),
        )?;

        let order = order::find_by_id(&self.pool, submission.order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound(submission.order_id))?;
        if order.user_id != user_id {
            crate::security_log!(
                "WARN",
                "payment_proof_not_owner",
                user_id = user_id,
                order_id = order.id
            );
            return Err(CommerceError::OrderNotOwned(order.id));
        }
        if order.status != OrderStatus::Pending {
            return Err(CommerceError::OrderNotPayable(order.status));
        }

        let current = match order.current_payment_id {
            Some(id) => payment::find_by_id(&self.pool, id)
                .await?
                .map(|p| (p.id, p.status)),
            None => None,
        };
        let target = state::submit_target(current)?;

        let upload = ProofUpload {
            bytes: submission.file.bytes,
            content_type: media.content_type,
            extension: media.extension,
        };
        let gate = self.proof_gate.read().await;
        let stored = self.store_proof(&upload).await?;

        let result = self
            .record_submission(&order, target, submission.amount, method.as_deref(), &stored)
            .await;
        drop(gate);

        match result {
            Ok(payment_id) => {
                self.emitter.wake();
                tracing::info!(
                    order_id = order.id,
                    order_number = %order.order_number,
                    payment_id,
                    claimed_amount = submission.amount,
                    proof_key = %stored.key,
                    "Payment proof submitted"
                );
                let payment = payment::find_by_id(&self.pool, payment_id)
                    .await?
                    .ok_or(CommerceError::PaymentNotFound(payment_id))?;
                Ok(summarize(&order, &payment))
            }
            Err(e) => {
                // 相同内容可能已被另一笔付款引用，只删除无人引用的文件
                let _exclusive = self.proof_gate.write().await;
                if stored.created && self.is_orphaned(&stored.key).await {
                    if let Err(cleanup) = self.storage.delete(&stored.key).await {
                        tracing::warn!(
                            key = %stored.key,
                            error = %cleanup,
                            "Failed to delete orphaned payment proof"
                        );
                    }
                }
                Err(e)
            }
        }
    }

    /// 存储调用带超时
    async fn store_proof(&self, upload: &ProofUpload) -> CommerceResult<StoredProof> {
        match tokio::time::timeout(self.upload_timeout, self.storage.store(upload)).await {
            Ok(Ok(stored)) => Ok(stored),
            Ok(Err(e)) => Err(CommerceError::Storage(e.to_string())),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.upload_timeout.as_millis() as u64,
                    "Payment proof storage timed out"
                );
                Err(CommerceError::StorageTimeout)
            }
        }
    }

    /// 单事务写入付款行 + outbox
    async fn record_submission(
        &self,
        order: &Order,
        target: SubmitTarget,
        claimed_amount: f64,
        method: Option<&str>,
        stored: &StoredProof,
    ) -> CommerceResult<i64> {
        let proof = ProofAttachment {
            url: &stored.url,
            key: &stored.key,
            claimed_amount,
            submitted_at: shared::util::now_millis(),
        };

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        let payment_id = match target {
            SubmitTarget::Attach(payment_id) => {
                if !payment::attach_proof_if_pending(&mut *tx, payment_id, method, &proof).await? {
                    let latest = payment::find_by_id(&mut *tx, payment_id)
                        .await?
                        .ok_or(CommerceError::PaymentNotFound(payment_id))?;
                    state::submit_target(Some((latest.id, latest.status)))?;
                    return Err(CommerceError::PaymentAlreadySubmitted);
                }
                payment_id
            }
            SubmitTarget::Replace { previous } => {
                let payment_id = shared::util::snowflake_id();
                // 先条件替换当前付款（写锁），再插入新行
                if !order::replace_current_payment_if(&mut *tx, order.id, previous, payment_id).await? {
                    return Err(CommerceError::PaymentAlreadySubmitted);
                }
                let method = method.or(order.payment_method.as_deref());
                payment::insert_submitted(
                    &mut *tx,
                    payment_id,
                    order.id,
                    order.total_amount,
                    method,
                    &proof,
                )
                .await?;
                payment_id
            }
        };

        self.emitter
            .enqueue(&mut tx, &events::payment_uploaded(order, payment_id, claimed_amount))
            .await?;
        tx.commit().await.map_err(RepoError::from)?;
        Ok(payment_id)
    }

    /// 财务审核
    ///
    /// 对已处于目标状态的付款重复审核直接返回成功，不再触发级联与通知。
    pub async fn verify(
        &self,
        user: &CurrentUser,
        payment_id: i64,
        input: PaymentVerify,
    ) -> AppResult<Payment> {
        user.authorize(Operation::VerifyPayment)?;
        let notes = normalize_text("notes", input.notes)?;
        Ok(self.review(user.id, payment_id, input.status, notes.as_deref()).await?)
    }

    async fn review(
        &self,
        verifier_id: i64,
        payment_id: i64,
        to: PaymentStatus,
        notes: Option<&str>,
    ) -> CommerceResult<Payment> {
        let current = self.find(payment_id).await?;
        if current.status == to && state::is_review_target(to) {
            tracing::info!(payment_id, status = %to, "Payment already in requested status");
            return Ok(current);
        }

        let order = order::find_by_id(&self.pool, current.order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound(current.order_id))?;
        state::validate_review(current.status, to, order.status)?;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        if !payment::verify_if(&mut *tx, payment_id, current.status, to, verifier_id, notes).await? {
            // 并发审核：另一请求已先行迁移
            let latest = payment::find_by_id(&mut *tx, payment_id)
                .await?
                .ok_or(CommerceError::PaymentNotFound(payment_id))?;
            if latest.status == to {
                return Ok(latest);
            }
            return Err(CommerceError::InvalidPaymentTransition {
                from: latest.status,
                to,
            });
        }

        let notify = if to == PaymentStatus::Paid {
            let cascaded = order::confirm_payment_once(&mut *tx, order.id, payment_id).await?;
            if cascaded {
                tracing::info!(
                    order_id = order.id,
                    order_number = %order.order_number,
                    payment_id,
                    "Order payment confirmed"
                );
            }
            cascaded
        } else {
            true
        };

        if notify {
            self.emitter
                .enqueue(&mut tx, &events::payment_reviewed(&order, payment_id, to))
                .await?;
        }
        tx.commit().await.map_err(RepoError::from)?;
        if notify {
            self.emitter.wake();
        }

        tracing::info!(
            payment_id,
            order_id = order.id,
            verifier_id,
            from = %current.status,
            to = %to,
            "Payment reviewed"
        );
        self.find(payment_id).await
    }

    /// 付款详情：员工或订单所属用户
    pub async fn get(&self, user: &CurrentUser, payment_id: i64) -> AppResult<Payment> {
        let scope = user.authorize(Operation::ViewPayment)?;
        let payment = self.find(payment_id).await?;
        if scope == Scope::Own {
            let owner = order::find_by_id(&self.pool, payment.order_id)
                .await
                .map_err(CommerceError::from)?
                .ok_or(CommerceError::PaymentNotFound(payment_id))?;
            user.ensure_owns(scope, owner.user_id)?;
        }
        Ok(payment)
    }

    /// 读取已存储的凭证；客户仅能读取自己订单的凭证
    pub async fn open_proof(&self, user: &CurrentUser, key: &str) -> AppResult<(Vec<u8>, &'static str)> {
        let scope = user.authorize(Operation::ViewPayment)?;
        if !super::storage::is_valid_key(key) {
            return Err(crate::utils::AppError::not_found(format!("Payment proof {key}")));
        }
        let owners = payment::proof_owners(&self.pool, key)
            .await
            .map_err(CommerceError::from)?;
        let visible = match scope {
            Scope::All => !owners.is_empty(),
            Scope::Own => owners.contains(&user.id),
        };
        if !visible {
            return Err(crate::utils::AppError::not_found(format!("Payment proof {key}")));
        }

        let bytes = match tokio::time::timeout(self.upload_timeout, self.storage.open(key)).await {
            Ok(Ok(Some(bytes))) => bytes,
            Ok(Ok(None)) => {
                return Err(crate::utils::AppError::not_found(format!("Payment proof {key}")));
            }
            Ok(Err(e)) => return Err(CommerceError::Storage(e.to_string()).into()),
            Err(_) => return Err(CommerceError::StorageTimeout.into()),
        };
        let content_type = key
            .rsplit_once('.')
            .and_then(|(_, ext)| {
                media::ALLOWED_MEDIA
                    .iter()
                    .find(|m| m.extension == ext)
                    .map(|m| m.content_type)
            })
            .unwrap_or("application/octet-stream");
        Ok((bytes, content_type))
    }

    async fn is_orphaned(&self, key: &str) -> bool {
        match payment::proof_owners(&self.pool, key).await {
            Ok(owners) => owners.is_empty(),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to check proof references");
                false
            }
        }
    }

    async fn find(&self, payment_id: i64) -> CommerceResult<Payment> {
        payment::find_by_id(&self.pool, payment_id)
            .await?
            .ok_or(CommerceError::PaymentNotFound(payment_id))
    }
}

fn summarize(order: &Order, payment: &Payment) -> PaymentSummary {
    PaymentSummary {
        payment_id: payment.id,
        order_id: order.id,
        order_number: order.order_number.clone(),
        status: payment.status,
        amount: payment.amount,
        claimed_amount: payment.claimed_amount,
        payment_proof: payment.payment_proof.clone(),
        submitted_at: payment.submitted_at,
    }
}
