//! Cart API Handlers
//!
//! 所有操作只作用于调用方自己的购物车。

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::models::{Cart, CartItemAdd, CartItemUpdate};

use crate::auth::{CurrentUser, Operation};
use crate::core::ServerState;
use crate::error::CommerceError;
use crate::utils::AppResult;

/// `DELETE /api/cart?itemId=`
#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    #[serde(rename = "itemId", alias = "item_id")]
    pub item_id: Option<i64>,
}

/// Fetch (or lazily create) the caller's cart
pub async fn get(State(state): State<ServerState>, user: CurrentUser) -> AppResult<Json<Cart>> {
    user.authorize(Operation::ManageCart)?;
    let cart = state.cart.get_cart(user.id).await?;
    Ok(Json(cart))
}

/// Add an item; same item merges into one line
pub async fn add(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartItemAdd>,
) -> AppResult<Json<Cart>> {
    user.authorize(Operation::ManageCart)?;
    let cart = state.cart.add_item(user.id, payload).await?;
    Ok(Json(cart))
}

pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CartItemUpdate>,
) -> AppResult<Json<Cart>> {
    user.authorize(Operation::ManageCart)?;
    let cart = state.cart.update_quantity(user.id, payload).await?;
    Ok(Json(cart))
}

pub async fn remove(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<RemoveQuery>,
) -> AppResult<Json<Cart>> {
    user.authorize(Operation::ManageCart)?;
    let item_id = query.item_id.ok_or(CommerceError::MissingField("itemId"))?;
    let cart = state.cart.remove_item(user.id, item_id).await?;
    Ok(Json(cart))
}
