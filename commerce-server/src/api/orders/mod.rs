//! Order API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/orders | POST | 下单（条目列表或 `from_cart`），201 |
//! | /api/orders | GET | 订单列表（分页、状态、订单号搜索） |
//! | /api/orders/{id} | GET | 订单详情 |
//! | /api/orders/{id} | PUT | 变更状态（Admin / Owner） |
//! | /api/orders/{id} | DELETE | 取消（仅 PENDING） |
//! | /api/checkout | POST | 购物车结账 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/orders", routes())
        .route("/api/checkout", post(handler::checkout_cart))
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update_status)
                .delete(handler::cancel),
        )
}
