//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use serde::Deserialize;
use shared::models::{OrderCreate, OrderDetail, OrderPage, OrderStatusUpdate};

use crate::auth::{CurrentUser, Operation};
use crate::checkout::{CheckoutRequest, CheckoutSource};
use crate::core::ServerState;
use crate::orders::OrderQuery;
use crate::utils::AppResult;

/// `POST /api/checkout` body（不含条目，使用购物车）
#[derive(Debug, Default, Deserialize)]
pub struct CartCheckout {
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
    pub total_amount: Option<f64>,
}

/// Create order from an item list or the cart
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    user.authorize(Operation::PlaceOrder)?;

    // 员工代客下单
    let owner = match payload.user_id {
        Some(id) if id != user.id => {
            user.authorize(Operation::PlaceOrderForOthers)?;
            id
        }
        _ => user.id,
    };

    let source = if payload.from_cart {
        CheckoutSource::Cart
    } else {
        CheckoutSource::Items(payload.items)
    };

    let detail = state
        .checkout
        .checkout(CheckoutRequest {
            user_id: owner,
            source,
            payment_method: payload.payment_method,
            shipping_address: payload.shipping_address,
            notes: payload.notes,
            client_total: payload.total_amount,
        })
        .await?;

    if owner != user.id {
        tracing::info!(
            order_id = detail.order.id,
            placed_by = user.id,
            user_id = owner,
            "Order placed on behalf of customer"
        );
    }
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Checkout the caller's cart
pub async fn checkout_cart(
    State(state): State<ServerState>,
    user: CurrentUser,
    payload: Option<Json<CartCheckout>>,
) -> AppResult<(StatusCode, Json<OrderDetail>)> {
    user.authorize(Operation::PlaceOrder)?;
    let Json(payload) = payload.unwrap_or_default();

    let detail = state
        .checkout
        .checkout(CheckoutRequest {
            user_id: user.id,
            source: CheckoutSource::Cart,
            payment_method: payload.payment_method,
            shipping_address: payload.shipping_address,
            notes: payload.notes,
            client_total: payload.total_amount,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<OrderPage>> {
    let page = state.orders.list(&user, query).await?;
    Ok(Json(page))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.orders.get(&user, id).await?;
    Ok(Json(detail))
}

pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.orders.change_status(&user, id, payload).await?;
    Ok(Json(detail))
}

pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let detail = state.orders.cancel(&user, id).await?;
    Ok(Json(detail))
}
