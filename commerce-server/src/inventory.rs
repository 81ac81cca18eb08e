//! Inventory Ledger - 库存台账
//!
//! 每个商品的库存计数。对外只有三个操作：
//! - [`check_available`]: 只读检查（购物车阶段，参考性质）
//! - [`reserve`]: 结账事务内的条件扣减，权威检查
//! - [`restore`]: 取消订单时回补

use shared::models::{CatalogItem, ItemKind, ItemRef};
use sqlx::{SqliteConnection, SqliteExecutor};

use crate::db::repository::catalog;
use crate::error::{CommerceError, CommerceResult};

/// Resolve an item and require it to be sellable
pub async fn resolve_sellable<'e>(
    executor: impl SqliteExecutor<'e>,
    item: ItemRef,
) -> CommerceResult<CatalogItem> {
    let entry = catalog::find_item(executor, item)
        .await?
        .ok_or(CommerceError::ItemNotFound {
            kind: item.item_type,
            id: item.item_id,
        })?;
    if !entry.is_active {
        return Err(CommerceError::ItemInactive {
            kind: entry.item_type,
            id: entry.item_id,
            name: entry.name,
        });
    }
    Ok(entry)
}

/// Advisory check: `requested` must not exceed current stock
///
/// Services have no stock and always pass.
pub fn check_available(entry: &CatalogItem, requested: i64) -> CommerceResult<()> {
    match (entry.item_type, entry.stock) {
        (ItemKind::Product, Some(stock)) if requested > stock => {
            Err(CommerceError::InsufficientStock {
                product_id: entry.item_id,
                name: entry.name.clone(),
                available: stock,
                requested,
            })
        }
        _ => Ok(()),
    }
}

/// 条件扣减库存（必须在结账事务内调用）
///
/// 扣减失败时在同一连接上重新读取，给出具体原因。
pub async fn reserve(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> CommerceResult<()> {
    if catalog::decrement_stock_if_available(&mut *conn, product_id, quantity).await? {
        tracing::debug!(product_id, quantity, "Stock reserved");
        return Ok(());
    }

    let entry = resolve_sellable(&mut *conn, ItemRef::product(product_id)).await?;
    let available = entry.stock.unwrap_or(0);
    tracing::info!(
        product_id,
        available,
        requested = quantity,
        "Stock reservation rejected"
    );
    Err(CommerceError::InsufficientStock {
        product_id,
        name: entry.name,
        available,
        requested: quantity,
    })
}

/// 回补库存
pub async fn restore(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
) -> CommerceResult<()> {
    catalog::increment_stock(&mut *conn, product_id, quantity).await?;
    tracing::debug!(product_id, quantity, "Stock restored");
    Ok(())
}
