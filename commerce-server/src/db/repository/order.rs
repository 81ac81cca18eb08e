//! Order Repository
//!
//! 订单与订单明细。状态变更一律使用 `WHERE status = ?` 条件更新。

use super::RepoResult;
use shared::models::{ItemKind, Order, OrderItem, OrderStatus, OrderSummary};
use sqlx::{SqliteConnection, SqliteExecutor};

const ORDER_SELECT: &str = "SELECT id, order_number, user_id, total_amount, status, payment_method, shipping_address, notes, current_payment_id, payment_confirmed, created_at, updated_at FROM orders";

const SUMMARY_SELECT: &str = "SELECT o.id, o.order_number, o.user_id, o.total_amount, o.status, o.payment_method, o.shipping_address, o.notes, o.current_payment_id, o.payment_confirmed, o.created_at, o.updated_at, \
    (SELECT COUNT(*) FROM order_item oi WHERE oi.order_id = o.id) AS item_count, \
    (o.current_payment_id IS NOT NULL) AS has_payment, \
    cp.status AS current_payment_status, \
    COALESCE(o.status = 'PENDING' AND cp.status = 'PAID', 0) AS can_process \
    FROM orders o LEFT JOIN payment cp ON cp.id = o.current_payment_id";

const SUMMARY_FILTER: &str = "WHERE (?1 IS NULL OR o.user_id = ?1) AND (?2 IS NULL OR o.status = ?2) AND (?3 IS NULL OR o.order_number LIKE ?3)";

/// New order row
pub struct NewOrder<'a> {
    pub id: i64,
    pub order_number: &'a str,
    pub user_id: i64,
    pub total_amount: f64,
    pub payment_method: Option<&'a str>,
    pub shipping_address: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub created_at: i64,
}

/// New order line
pub struct NewOrderItem<'a> {
    pub item_type: ItemKind,
    pub item_id: i64,
    pub name: &'a str,
    pub quantity: i64,
    pub price: f64,
}

/// List filter
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub user_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

pub async fn insert(conn: &mut SqliteConnection, order: &NewOrder<'_>) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, total_amount, status, payment_method, shipping_address, notes, current_payment_id, payment_confirmed, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?6, ?7, NULL, 0, ?8, ?8)",
    )
    .bind(order.id)
    .bind(order.order_number)
    .bind(order.user_id)
    .bind(order.total_amount)
    .bind(order.payment_method)
    .bind(order.shipping_address)
    .bind(order.notes)
    .bind(order.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_items(
    conn: &mut SqliteConnection,
    order_id: i64,
    items: &[NewOrderItem<'_>],
) -> RepoResult<()> {
    for item in items {
        sqlx::query(
            "INSERT INTO order_item (id, order_id, item_type, item_id, name, quantity, price) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(shared::util::snowflake_id())
        .bind(order_id)
        .bind(item.item_type)
        .bind(item.item_id)
        .bind(item.name)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn find_by_id<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<Order>> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn find_items<'e>(
    executor: impl SqliteExecutor<'e>,
    order_id: i64,
) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, item_type, item_id, name, quantity, price FROM order_item WHERE order_id = ? ORDER BY rowid",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;
    Ok(rows)
}

pub async fn list_summaries<'e>(
    executor: impl SqliteExecutor<'e>,
    filter: &OrderFilter,
) -> RepoResult<Vec<OrderSummary>> {
    let sql = format!(
        "{SUMMARY_SELECT} {SUMMARY_FILTER} ORDER BY o.created_at DESC, o.id DESC LIMIT ?4 OFFSET ?5"
    );
    let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));
    let rows = sqlx::query_as::<_, OrderSummary>(&sql)
        .bind(filter.user_id)
        .bind(filter.status)
        .bind(pattern)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn count_summaries<'e>(
    executor: impl SqliteExecutor<'e>,
    filter: &OrderFilter,
) -> RepoResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM orders o {SUMMARY_FILTER}");
    let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));
    let total: i64 = sqlx::query_scalar(&sql)
        .bind(filter.user_id)
        .bind(filter.status)
        .bind(pattern)
        .fetch_one(executor)
        .await?;
    Ok(total)
}

/// 条件状态更新：仅当当前状态为 `from` 时生效
pub async fn update_status_if<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    from: OrderStatus,
    to: OrderStatus,
    notes: Option<&str>,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET status = ?1, notes = COALESCE(?2, notes), updated_at = ?3 WHERE id = ?4 AND status = ?5",
    )
    .bind(to)
    .bind(notes)
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(from)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// PENDING -> PROCESSING，要求当前支付为 PAID（守卫条件与更新在同一语句）
pub async fn start_processing_if_paid<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    notes: Option<&str>,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET status = 'PROCESSING', notes = COALESCE(?1, notes), updated_at = ?2 \
         WHERE id = ?3 AND status = 'PENDING' AND payment_confirmed = 1 \
         AND EXISTS (SELECT 1 FROM payment p WHERE p.id = orders.current_payment_id AND p.status = 'PAID')",
    )
    .bind(notes)
    .bind(shared::util::now_millis())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

pub async fn set_current_payment<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    payment_id: i64,
) -> RepoResult<()> {
    sqlx::query("UPDATE orders SET current_payment_id = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(payment_id)
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// 收款确认级联：`payment_confirmed` 只会从 0 变为 1 一次
///
/// 返回本次调用是否真正触发了级联。
pub async fn confirm_payment_once<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    payment_id: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET payment_confirmed = 1, updated_at = ?1 WHERE id = ?2 AND current_payment_id = ?3 AND payment_confirmed = 0",
    )
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(payment_id)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// 重新付款：仅当订单仍为 PENDING 且当前付款仍为 `expected` 时替换
///
/// `expected = None` 匹配尚无付款的订单（`IS` 对 NULL 生效）。
pub async fn replace_current_payment_if<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
    expected: Option<i64>,
    payment_id: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET current_payment_id = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'PENDING' AND current_payment_id IS ?4",
    )
    .bind(payment_id)
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(expected)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}
