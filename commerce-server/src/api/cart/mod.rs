//! Cart API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Cart router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route(
        "/",
        get(handler::get)
            .post(handler::add)
            .put(handler::update)
            .delete(handler::remove),
    )
}
