//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查（无需认证）
//! - [`cart`] - 购物车
//! - [`orders`] - 下单、订单查询与状态变更
//! - [`payments`] - 付款凭证上传、审核、凭证文件
//! - [`notifications`] - 用户通知

pub mod cart;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod payments;

use axum::Router;
use axum::middleware;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router(state: &ServerState) -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(payments::router(state.config.max_proof_size))
        .merge(notifications::router())
}

/// Build a fully configured application with all middleware
///
/// HTTP 服务器与测试 (`oneshot`) 共用。
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    build_router(state)
        // JWT 认证 - require_auth 内部跳过非 /api 路径与 OPTIONS
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
