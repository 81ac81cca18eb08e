//! Checkout Orchestrator - 结账
//!
//! 把购物车或显式条目列表转换为订单：
//!
//! 1. 合并同一商品的重复条目，解析目录记录（不存在 / 已下架即失败）
//! 2. 产品行做参考性库存检查，给出具体商品名与可用数量
//! 3. 使用服务端目录价格计算总额，与客户端总额比对
//! 4. 生成订单号
//! 5. 单个事务：条件扣减库存 → 订单 → 明细 → 初始付款 → outbox → 清空购物车
//!
//! 1-4 只读，失败时没有任何写入；5 要么全部生效，要么全部回滚。

pub mod order_number;

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::models::{CatalogItem, CheckoutLine, ItemKind, ItemRef, OrderDetail};
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::repository::order::{NewOrder, NewOrderItem};
use crate::db::repository::{RepoError, cart, order, payment};
use crate::error::{CommerceError, CommerceResult};
use crate::inventory;
use crate::money::{self, money_eq, to_decimal, to_f64};
use crate::notify::{NotificationEmitter, events};
use crate::orders;
use crate::utils::validation::{MAX_QUANTITY, normalize_text, validate_quantity};

/// 订单号冲突时最多尝试次数
const MAX_ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Where the checkout lines come from
#[derive(Debug, Clone)]
pub enum CheckoutSource {
    /// Explicit item list
    Items(Vec<CheckoutLine>),
    /// The owner's cart; checked-out lines are removed from it
    Cart,
}

/// Checkout input, already authorized by the caller
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Order owner
    pub user_id: i64,
    pub source: CheckoutSource,
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    /// Client-computed total, verified against the server total
    pub client_total: Option<f64>,
}

/// Validated line with its catalog record
#[derive(Debug, Clone)]
struct PlannedLine {
    entry: CatalogItem,
    quantity: i64,
}

/// Everything the write phase needs
#[derive(Debug)]
struct CheckoutPlan {
    user_id: i64,
    lines: Vec<PlannedLine>,
    total: Decimal,
    payment_method: Option<String>,
    shipping_address: Option<String>,
    notes: Option<String>,
    /// (cart_id, cart_item_ids) to clear on success
    cart: Option<(i64, Vec<i64>)>,
}

#[derive(Clone)]
pub struct CheckoutOrchestrator {
    pool: SqlitePool,
    emitter: NotificationEmitter,
}

impl CheckoutOrchestrator {
    pub fn new(pool: SqlitePool, emitter: NotificationEmitter) -> Self {
        Self { pool, emitter }
    }

    /// 结账，返回新订单详情
    pub async fn checkout(&self, request: CheckoutRequest) -> CommerceResult<OrderDetail> {
        let plan = self.plan(request).await?;

        for attempt in 1..=MAX_ORDER_NUMBER_ATTEMPTS {
            let number = order_number::generate();
            match self.write(&plan, &number).await {
                Ok(order_id) => {
                    self.emitter.wake();
                    tracing::info!(
                        order_id,
                        order_number = %number,
                        user_id = plan.user_id,
                        total = %plan.total,
                        lines = plan.lines.len(),
                        "Order created"
                    );
                    return orders::load_detail(&self.pool, order_id).await;
                }
                Err(CommerceError::Repo(RepoError::Duplicate(msg))) => {
                    tracing::warn!(
                        attempt,
                        order_number = %number,
                        error = %msg,
                        "Order number collision, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(CommerceError::OrderNumberConflict)
    }

    /// 只读校验阶段
    async fn plan(&self, request: CheckoutRequest) -> CommerceResult<CheckoutPlan> {
        let payment_method = normalize_text("payment_method", request.payment_method)?;
        let shipping_address = normalize_text("shipping_address", request.shipping_address)?;
        let notes = normalize_text("notes", request.notes)?;

        let (wanted, cart) = match request.source {
            CheckoutSource::Items(items) => (merge_lines(&items)?, None),
            CheckoutSource::Cart => {
                let Some(cart_id) = cart::find_cart_id(&self.pool, request.user_id).await? else {
                    return Err(CommerceError::EmptyOrder);
                };
                let items = cart::find_items(&self.pool, cart_id).await?;
                let wanted = items
                    .iter()
                    .map(|i| {
                        (
                            ItemRef {
                                item_type: i.item_type,
                                item_id: i.item_id,
                            },
                            i.quantity,
                        )
                    })
                    .collect::<Vec<_>>();
                let ids = items.iter().map(|i| i.id).collect();
                (wanted, Some((cart_id, ids)))
            }
        };

        if wanted.is_empty() {
            return Err(CommerceError::EmptyOrder);
        }

        let mut lines = Vec::with_capacity(wanted.len());
        for (item, quantity) in wanted {
            let entry = inventory::resolve_sellable(&self.pool, item).await?;
            inventory::check_available(&entry, quantity)?;
            lines.push(PlannedLine { entry, quantity });
        }

        let total = money::sum_lines(lines.iter().map(|l| (l.entry.price, l.quantity)));
        if let Some(provided) = request.client_total {
            if !money_eq(total, to_decimal(provided)) {
                return Err(CommerceError::TotalMismatch {
                    calculated: to_f64(total),
                    provided,
                });
            }
        }

        Ok(CheckoutPlan {
            user_id: request.user_id,
            lines,
            total,
            payment_method,
            shipping_address,
            notes,
            cart,
        })
    }

    /// 写入阶段（单事务）
    ///
    /// 第一条语句即为写操作（库存扣减或订单插入），写锁冲突走 busy_timeout 等待。
    async fn write(&self, plan: &CheckoutPlan, order_number: &str) -> CommerceResult<i64> {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        for line in &plan.lines {
            if line.entry.item_type == ItemKind::Product {
                inventory::reserve(&mut tx, line.entry.item_id, line.quantity).await?;
            }
        }

        let order_id = shared::util::snowflake_id();
        let total_amount = to_f64(plan.total);
        order::insert(
            &mut tx,
            &NewOrder {
                id: order_id,
                order_number,
                user_id: plan.user_id,
                total_amount,
                payment_method: plan.payment_method.as_deref(),
                shipping_address: plan.shipping_address.as_deref(),
                notes: plan.notes.as_deref(),
                created_at: shared::util::now_millis(),
            },
        )
        .await?;

        let items: Vec<NewOrderItem<'_>> = plan
            .lines
            .iter()
            .map(|l| NewOrderItem {
                item_type: l.entry.item_type,
                item_id: l.entry.item_id,
                name: &l.entry.name,
                quantity: l.quantity,
                price: to_f64(money::unit_price(l.entry.price)),
            })
            .collect();
        order::insert_items(&mut tx, order_id, &items).await?;

        if let Some(method) = plan.payment_method.as_deref() {
            create_initial_payment(&mut tx, order_id, total_amount, method).await?;
        }

        let created = order::find_by_id(&mut *tx, order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound(order_id))?;
        self.emitter
            .enqueue(&mut tx, &events::order_created(&created))
            .await?;

        if let Some((cart_id, item_ids)) = &plan.cart {
            let removed = cart::delete_items(&mut tx, *cart_id, item_ids).await?;
            tracing::debug!(cart_id, removed, "Cart cleared after checkout");
        }

        tx.commit().await.map_err(RepoError::from)?;
        Ok(order_id)
    }
}

/// 初始付款：每个订单最多一条，由结账创建
async fn create_initial_payment(
    conn: &mut SqliteConnection,
    order_id: i64,
    amount: f64,
    method: &str,
) -> CommerceResult<i64> {
    if payment::exists_for_order(&mut *conn, order_id).await? {
        return Err(RepoError::Duplicate(format!("Order {order_id} already has a payment")).into());
    }
    let payment_id = shared::util::snowflake_id();
    payment::insert(&mut *conn, payment_id, order_id, amount, Some(method), None).await?;
    order::set_current_payment(&mut *conn, order_id, payment_id).await?;
    Ok(payment_id)
}

/// 合并同一商品/服务的重复条目，保持首次出现的顺序
fn merge_lines(items: &[CheckoutLine]) -> CommerceResult<Vec<(ItemRef, i64)>> {
    let mut merged: Vec<(ItemRef, i64)> = Vec::with_capacity(items.len());
    let mut index: HashMap<ItemRef, usize> = HashMap::new();

    for line in items {
        validate_quantity(line.quantity)?;
        let item = ItemRef {
            item_type: line.item_type,
            item_id: line.item_id,
        };
        match index.get(&item) {
            Some(&i) => merged[i].1 += line.quantity,
            None => {
                index.insert(item, merged.len());
                merged.push((item, line.quantity));
            }
        }
    }

    for (_, quantity) in &merged {
        if *quantity > MAX_QUANTITY {
            return Err(CommerceError::InvalidQuantity {
                got: *quantity,
                max: MAX_QUANTITY,
            });
        }
    }
    Ok(merged)
}
