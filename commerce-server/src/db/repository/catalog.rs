//! Catalog Repository
//!
//! 目录本身由外部管理；这里只有读取、库存条件扣减/回补，以及供初始化与测试使用的写入。

use super::{RepoError, RepoResult};
use shared::models::{CatalogItem, ItemKind, ItemRef, Product, Service};
use sqlx::{SqliteExecutor, SqlitePool};

const PRODUCT_ITEM_SELECT: &str = "SELECT 'PRODUCT' AS item_type, id AS item_id, name, price, stock, is_active FROM product WHERE id = ?";
const SERVICE_ITEM_SELECT: &str = "SELECT 'SERVICE' AS item_type, id AS item_id, name, price, NULL AS stock, is_active FROM service WHERE id = ?";

/// Resolve a product or service reference to its catalog entry
pub async fn find_item<'e>(
    executor: impl SqliteExecutor<'e>,
    item: ItemRef,
) -> RepoResult<Option<CatalogItem>> {
    let sql = match item.item_type {
        ItemKind::Product => PRODUCT_ITEM_SELECT,
        ItemKind::Service => SERVICE_ITEM_SELECT,
    };
    let row = sqlx::query_as::<_, CatalogItem>(sql)
        .bind(item.item_id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub async fn find_product<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(
        "SELECT id, name, sku, price, stock, is_active, created_at, updated_at FROM product WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(row)
}

/// 条件扣减库存：仅当 `stock >= quantity` 且商品上架时生效
///
/// 返回是否扣减成功。单条 UPDATE，无读-改-写窗口。
pub async fn decrement_stock_if_available<'e>(
    executor: impl SqliteExecutor<'e>,
    product_id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE product SET stock = stock - ?1, updated_at = ?2 WHERE id = ?3 AND is_active = 1 AND stock >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(executor)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// 回补库存（订单取消）
pub async fn increment_stock<'e>(
    executor: impl SqliteExecutor<'e>,
    product_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE product SET stock = stock + ?1, updated_at = ?2 WHERE id = ?3")
        .bind(quantity)
        .bind(now)
        .bind(product_id)
        .execute(executor)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {product_id} not found")));
    }
    Ok(())
}

/// Insert a product row (catalog seeding)
pub async fn create_product(
    pool: &SqlitePool,
    name: &str,
    price: f64,
    stock: i64,
) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO product (id, name, sku, price, stock, is_active, created_at, updated_at) VALUES (?1, ?2, NULL, ?3, ?4, 1, ?5, ?5)",
    )
    .bind(id)
    .bind(name)
    .bind(price)
    .bind(stock)
    .bind(now)
    .execute(pool)
    .await?;
    find_product(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Insert a service row (catalog seeding)
pub async fn create_service(pool: &SqlitePool, name: &str, price: f64) -> RepoResult<Service> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO service (id, name, price, is_active, created_at, updated_at) VALUES (?1, ?2, ?3, 1, ?4, ?4)",
    )
    .bind(id)
    .bind(name)
    .bind(price)
    .bind(now)
    .execute(pool)
    .await?;
    sqlx::query_as::<_, Service>(
        "SELECT id, name, price, is_active, created_at, updated_at FROM service WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| RepoError::Database("Failed to create service".into()))
}

/// 上下架（目录管理同步）
pub async fn set_active(pool: &SqlitePool, item: ItemRef, is_active: bool) -> RepoResult<()> {
    let sql = match item.item_type {
        ItemKind::Product => "UPDATE product SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
        ItemKind::Service => "UPDATE service SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
    };
    let rows = sqlx::query(sql)
        .bind(is_active)
        .bind(shared::util::now_millis())
        .bind(item.item_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "{} {} not found",
            item.item_type.label(),
            item.item_id
        )));
    }
    Ok(())
}
