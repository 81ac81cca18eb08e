//! Order 模块
//!
//! - [`state`] - 订单状态机与付款守卫
//! - [`OrderFlow`] - 查询、状态变更、取消

mod flow;
pub mod state;

pub use flow::{OrderFlow, OrderQuery};

use shared::models::OrderDetail;
use sqlx::SqlitePool;

use crate::db::repository::{order, payment};
use crate::error::{CommerceError, CommerceResult};

/// 加载订单详情（明细 + 全部付款 + 当前付款）
pub async fn load_detail(pool: &SqlitePool, order_id: i64) -> CommerceResult<OrderDetail> {
    let order = order::find_by_id(pool, order_id)
        .await?
        .ok_or(CommerceError::OrderNotFound(order_id))?;
    let items = order::find_items(pool, order_id).await?;
    let payments = payment::find_by_order(pool, order_id).await?;
    let current_payment = order
        .current_payment_id
        .and_then(|id| payments.iter().find(|p| p.id == id).cloned());

    Ok(OrderDetail {
        order,
        items,
        payments,
        current_payment,
    })
}
