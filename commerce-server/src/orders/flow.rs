//! Order flow - 订单查询与状态变更
//!
//! 每次状态变更都是单事务：条件更新 (`WHERE status = from`) → 副作用 → outbox。

use serde::Deserialize;
use shared::models::{Order, OrderDetail, OrderPage, OrderStatus, OrderStatusUpdate, Pagination};
use sqlx::{SqliteConnection, SqlitePool};

use super::state;
use crate::auth::{CurrentUser, Operation, Scope};
use crate::db::repository::order::OrderFilter;
use crate::db::repository::{RepoError, order, payment};
use crate::error::{CommerceError, CommerceResult};
use crate::inventory;
use crate::notify::{NotificationEmitter, events};
use crate::utils::AppResult;
use crate::utils::validation::normalize_text;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Query params for `GET /api/orders`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Clone)]
pub struct OrderFlow {
    pool: SqlitePool,
    emitter: NotificationEmitter,
}

impl OrderFlow {
    pub fn new(pool: SqlitePool, emitter: NotificationEmitter) -> Self {
        Self { pool, emitter }
    }

    /// 订单详情：员工可看全部，客户仅限本人
    pub async fn get(&self, user: &CurrentUser, order_id: i64) -> AppResult<OrderDetail> {
        let scope = user.authorize(Operation::ViewOrder)?;
        let detail = super::load_detail(&self.pool, order_id).await?;
        user.ensure_owns(scope, detail.order.user_id)?;
        Ok(detail)
    }

    pub async fn list(&self, user: &CurrentUser, query: OrderQuery) -> AppResult<OrderPage> {
        let scope = user.authorize(Operation::ViewOrder)?;
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let search = query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let filter = OrderFilter {
            user_id: match scope {
                Scope::All => None,
                Scope::Own => Some(user.id),
            },
            status: query.status,
            search,
            limit,
            offset: (page - 1).saturating_mul(limit),
        };

        let orders = order::list_summaries(&self.pool, &filter)
            .await
            .map_err(CommerceError::from)?;
        let total = order::count_summaries(&self.pool, &filter)
            .await
            .map_err(CommerceError::from)?;

        Ok(OrderPage {
            orders,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// 员工变更订单状态 (`PUT /api/orders/{id}`)
    pub async fn change_status(
        &self,
        user: &CurrentUser,
        order_id: i64,
        update: OrderStatusUpdate,
    ) -> AppResult<OrderDetail> {
        user.authorize(Operation::ChangeOrderStatus)?;
        let notes = normalize_text("notes", update.notes)?;
        let current = self.find(order_id).await?;
        self.transition(current, update.status, notes.as_deref()).await?;
        Ok(super::load_detail(&self.pool, order_id).await?)
    }

    /// 取消订单 (`DELETE /api/orders/{id}`)，仅限 PENDING
    pub async fn cancel(&self, user: &CurrentUser, order_id: i64) -> AppResult<OrderDetail> {
        let scope = user.authorize(Operation::CancelOrder)?;
        let current = self.find(order_id).await?;
        user.ensure_owns(scope, current.user_id)?;

        if current.status != OrderStatus::Pending {
            return Err(CommerceError::InvalidOrderTransition {
                from: current.status,
                to: OrderStatus::Cancelled,
            }
            .into());
        }

        self.transition(current, OrderStatus::Cancelled, None).await?;
        Ok(super::load_detail(&self.pool, order_id).await?)
    }

    async fn find(&self, order_id: i64) -> CommerceResult<Order> {
        order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound(order_id))
    }

    /// 执行一次状态迁移
    pub async fn transition(
        &self,
        current: Order,
        to: OrderStatus,
        notes: Option<&str>,
    ) -> CommerceResult<()> {
        let from = current.status;
        state::validate_transition(from, to)?;

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        let applied = if from == OrderStatus::Pending && to == OrderStatus::Processing {
            order::start_processing_if_paid(&mut *tx, current.id, notes).await?
        } else {
            order::update_status_if(&mut *tx, current.id, from, to, notes).await?
        };

        if !applied {
            // 条件更新未命中：状态已被并发修改，或付款守卫不满足
            let latest = order::find_by_id(&mut *tx, current.id)
                .await?
                .ok_or(CommerceError::OrderNotFound(current.id))?;
            if latest.status != from {
                return Err(CommerceError::InvalidOrderTransition {
                    from: latest.status,
                    to,
                });
            }
            let payment_status = match latest.current_payment_id {
                Some(id) => payment::find_by_id(&mut *tx, id).await?.map(|p| p.status),
                None => None,
            };
            state::payment_guard(from, payment_status, latest.payment_confirmed)?;
            // 守卫通过但未命中：按状态冲突处理
            return Err(CommerceError::InvalidOrderTransition { from, to });
        }

        if to == OrderStatus::Cancelled {
            // 事务内重新读取，拿到最新的当前付款
            let locked = order::find_by_id(&mut *tx, current.id)
                .await?
                .ok_or(CommerceError::OrderNotFound(current.id))?;
            release_order(&mut tx, &locked).await?;
        }

        self.emitter
            .enqueue(&mut tx, &events::order_status_changed(&current, from, to))
            .await?;
        tx.commit().await.map_err(RepoError::from)?;
        self.emitter.wake();

        tracing::info!(
            order_id = current.id,
            order_number = %current.order_number,
            from = %from,
            to = %to,
            "Order status changed"
        );
        Ok(())
    }
}

/// 取消时回补库存并作废未结算的当前付款
async fn release_order(conn: &mut SqliteConnection, order: &Order) -> CommerceResult<()> {
    let items = order::find_items(&mut *conn, order.id).await?;
    for item in items
        .iter()
        .filter(|i| i.item_type == shared::models::ItemKind::Product)
    {
        match inventory::restore(&mut *conn, item.item_id, item.quantity).await {
            Ok(()) => {}
            Err(CommerceError::Repo(RepoError::NotFound(_))) => {
                tracing::warn!(
                    order_id = order.id,
                    product_id = item.item_id,
                    "Product no longer exists, stock not restored"
                );
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(payment_id) = order.current_payment_id {
        if payment::void_if_unsettled(&mut *conn, payment_id).await? {
            tracing::info!(order_id = order.id, payment_id, "Unsettled payment voided");
        }
    }
    Ok(())
}
