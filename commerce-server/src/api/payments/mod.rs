//! Payment API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/payments/confirm | POST | 上传付款凭证 (multipart) |
//! | /api/payments/{id} | GET | 付款详情 |
//! | /api/payments/{id}/verify | PATCH | 财务审核 |
//! | /api/uploads/payments/{key} | GET | 读取凭证文件 |

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// multipart 表单字段与边界的额外开销
const FORM_OVERHEAD: usize = 64 * 1024;

/// Payment router
pub fn router(max_proof_size: usize) -> Router<ServerState> {
    Router::new()
        .nest("/api/payments", routes(max_proof_size))
        .route("/api/uploads/payments/{key}", get(handler::serve_proof))
}

fn routes(max_proof_size: usize) -> Router<ServerState> {
    Router::new()
        .route(
            "/confirm",
            post(handler::confirm)
                .layer(DefaultBodyLimit::max(max_proof_size + FORM_OVERHEAD)),
        )
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/verify", patch(handler::verify))
}
