//! Cart Repository

use super::{RepoError, RepoResult};
use shared::models::{CartItem, ItemRef};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

const CART_ITEM_SELECT: &str = "SELECT ci.id, ci.cart_id, ci.item_type, ci.item_id, COALESCE(p.name, s.name, '') AS name, ci.price, ci.quantity, ci.created_at, ci.updated_at FROM cart_item ci LEFT JOIN product p ON ci.item_type = 'PRODUCT' AND p.id = ci.item_id LEFT JOIN service s ON ci.item_type = 'SERVICE' AND s.id = ci.item_id";

/// 获取用户购物车 ID，不存在时创建（懒初始化）
pub async fn ensure_cart(pool: &SqlitePool, user_id: i64) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO cart (id, user_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?3) ON CONFLICT(user_id) DO NOTHING",
    )
    .bind(shared::util::snowflake_id())
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM cart WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

pub async fn find_cart_id<'e>(
    executor: impl SqliteExecutor<'e>,
    user_id: i64,
) -> RepoResult<Option<i64>> {
    let id = sqlx::query_scalar("SELECT id FROM cart WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(id)
}

pub async fn find_items<'e>(
    executor: impl SqliteExecutor<'e>,
    cart_id: i64,
) -> RepoResult<Vec<CartItem>> {
    let sql = format!("{CART_ITEM_SELECT} WHERE ci.cart_id = ? ORDER BY ci.created_at, ci.id");
    let rows = sqlx::query_as::<_, CartItem>(&sql)
        .bind(cart_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub async fn find_item(pool: &SqlitePool, cart_id: i64, item_id: i64) -> RepoResult<Option<CartItem>> {
    let sql = format!("{CART_ITEM_SELECT} WHERE ci.cart_id = ? AND ci.id = ?");
    let row = sqlx::query_as::<_, CartItem>(&sql)
        .bind(cart_id)
        .bind(item_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Quantity already staged for an item (0 when absent)
pub async fn staged_quantity(pool: &SqlitePool, cart_id: i64, item: ItemRef) -> RepoResult<i64> {
    let qty: Option<i64> = sqlx::query_scalar(
        "SELECT quantity FROM cart_item WHERE cart_id = ? AND item_type = ? AND item_id = ?",
    )
    .bind(cart_id)
    .bind(item.item_type)
    .bind(item.item_id)
    .fetch_optional(pool)
    .await?;
    Ok(qty.unwrap_or(0))
}

/// 新增或合并条目
///
/// 同一 (cart, item) 只有一行：已存在时数量累加，保留首次加入时的价格快照。
pub async fn upsert_item(
    pool: &SqlitePool,
    cart_id: i64,
    item: ItemRef,
    price: f64,
    quantity: i64,
) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO cart_item (id, cart_id, item_type, item_id, price, quantity, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7) \
         ON CONFLICT(cart_id, item_type, item_id) DO UPDATE SET quantity = cart_item.quantity + excluded.quantity, updated_at = excluded.updated_at \
         RETURNING id",
    )
    .bind(shared::util::snowflake_id())
    .bind(cart_id)
    .bind(item.item_type)
    .bind(item.item_id)
    .bind(price)
    .bind(quantity)
    .bind(now)
    .fetch_one(pool)
    .await?;
    touch_cart(pool, cart_id, now).await?;
    Ok(id)
}

pub async fn update_quantity(
    pool: &SqlitePool,
    cart_id: i64,
    item_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE cart_item SET quantity = ?1, updated_at = ?2 WHERE id = ?3 AND cart_id = ?4",
    )
    .bind(quantity)
    .bind(now)
    .bind(item_id)
    .bind(cart_id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Cart item {item_id} not found")));
    }
    touch_cart(pool, cart_id, now).await
}

pub async fn delete_item(pool: &SqlitePool, cart_id: i64, item_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE id = ? AND cart_id = ?")
        .bind(item_id)
        .bind(cart_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() > 0 {
        touch_cart(pool, cart_id, shared::util::now_millis()).await?;
    }
    Ok(rows.rows_affected() > 0)
}

/// 结账后清除已下单的条目（同一事务内）
pub async fn delete_items(
    conn: &mut SqliteConnection,
    cart_id: i64,
    item_ids: &[i64],
) -> RepoResult<u64> {
    let mut removed = 0;
    for item_id in item_ids {
        let rows = sqlx::query("DELETE FROM cart_item WHERE id = ? AND cart_id = ?")
            .bind(item_id)
            .bind(cart_id)
            .execute(&mut *conn)
            .await?;
        removed += rows.rows_affected();
    }
    Ok(removed)
}

async fn touch_cart(pool: &SqlitePool, cart_id: i64, now: i64) -> RepoResult<()> {
    sqlx::query("UPDATE cart SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(cart_id)
        .execute(pool)
        .await?;
    Ok(())
}
