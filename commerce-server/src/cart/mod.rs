//! Cart Store - 购物车
//!
//! 每个用户一个购物车，首次访问时创建。同一商品/服务只有一行，重复加入时合并数量，
//! 价格在首次加入时快照。
//!
//! 这里的库存检查只是参考性的；权威扣减在结账事务内完成。

use shared::models::{Cart, CartItemAdd, CartItemUpdate, CatalogItem, ItemKind, ItemRef};
use sqlx::SqlitePool;

use crate::db::repository::{cart, catalog};
use crate::error::{CommerceError, CommerceResult};
use crate::inventory;
use crate::money::{self, to_f64};
use crate::utils::validation::{MAX_QUANTITY, validate_quantity};

#[derive(Clone)]
pub struct CartStore {
    pool: SqlitePool,
}

impl CartStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// 获取购物车（不存在时创建空车）
    pub async fn get_cart(&self, user_id: i64) -> CommerceResult<Cart> {
        let cart_id = cart::ensure_cart(&self.pool, user_id).await?;
        self.load(cart_id, user_id).await
    }

    /// 加入商品或服务
    pub async fn add_item(&self, user_id: i64, input: CartItemAdd) -> CommerceResult<Cart> {
        let item = match (input.product_id, input.service_id) {
            (None, None) => return Err(CommerceError::MissingField("product_id or service_id")),
            (product_id, service_id) => ItemRef::from_pair(product_id, service_id).ok_or_else(|| {
                CommerceError::InvalidArgument(
                    "Provide either product_id or service_id, not both".into(),
                )
            })?,
        };
        validate_quantity(input.quantity)?;

        let entry = self.find_listed(item).await?;
        let cart_id = cart::ensure_cart(&self.pool, user_id).await?;

        let staged = cart::staged_quantity(&self.pool, cart_id, item).await?;
        let wanted = staged + input.quantity;
        if wanted > MAX_QUANTITY {
            return Err(CommerceError::InvalidQuantity {
                got: wanted,
                max: MAX_QUANTITY,
            });
        }
        inventory::check_available(&entry, wanted)?;

        let cart_item_id =
            cart::upsert_item(&self.pool, cart_id, item, entry.price, input.quantity).await?;
        tracing::debug!(
            user_id,
            cart_item_id,
            item_type = item.item_type.as_str(),
            item_id = item.item_id,
            quantity = wanted,
            "Cart item added"
        );

        self.load(cart_id, user_id).await
    }

    /// 修改数量
    pub async fn update_quantity(
        &self,
        user_id: i64,
        input: CartItemUpdate,
    ) -> CommerceResult<Cart> {
        validate_quantity(input.quantity)?;
        let cart_id = cart::ensure_cart(&self.pool, user_id).await?;
        let line = cart::find_item(&self.pool, cart_id, input.cart_item_id)
            .await?
            .ok_or(CommerceError::CartItemNotFound(input.cart_item_id))?;

        if line.item_type == ItemKind::Product {
            let entry = self
                .find_listed(ItemRef::product(line.item_id))
                .await?;
            inventory::check_available(&entry, input.quantity)?;
        }

        cart::update_quantity(&self.pool, cart_id, line.id, input.quantity)
            .await
            .map_err(|e| match e {
                crate::db::repository::RepoError::NotFound(_) => {
                    CommerceError::CartItemNotFound(line.id)
                }
                other => other.into(),
            })?;
        tracing::debug!(user_id, cart_item_id = line.id, quantity = input.quantity, "Cart item updated");

        self.load(cart_id, user_id).await
    }

    /// 删除条目；不存在时报 NotFound
    pub async fn remove_item(&self, user_id: i64, cart_item_id: i64) -> CommerceResult<Cart> {
        let cart_id = cart::ensure_cart(&self.pool, user_id).await?;
        if !cart::delete_item(&self.pool, cart_id, cart_item_id).await? {
            return Err(CommerceError::CartItemNotFound(cart_item_id));
        }
        tracing::debug!(user_id, cart_item_id, "Cart item removed");
        self.load(cart_id, user_id).await
    }

    /// 目录中存在且上架；下架的条目对购物车而言视同不存在
    async fn find_listed(&self, item: ItemRef) -> CommerceResult<CatalogItem> {
        catalog::find_item(&self.pool, item)
            .await?
            .filter(|entry| entry.is_active)
            .ok_or(CommerceError::ItemNotFound {
                kind: item.item_type,
                id: item.item_id,
            })
    }

    async fn load(&self, cart_id: i64, user_id: i64) -> CommerceResult<Cart> {
        let items = cart::find_items(&self.pool, cart_id).await?;
        let total = money::sum_lines(items.iter().map(|i| (i.price, i.quantity)));
        Ok(Cart {
            id: cart_id,
            user_id,
            item_count: items.len(),
            items,
            total_amount: to_f64(total),
        })
    }
}
