//! Notification API Handlers
//!
//! 客户只看到自己的通知；员工同时看到员工广播 (`user_id IS NULL`)。

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{MarkRead, Notification};

use crate::auth::{CurrentUser, Operation, Scope};
use crate::core::ServerState;
use crate::db::repository::notification;
use crate::error::CommerceError;
use crate::utils::AppResult;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let scope = user.authorize(Operation::ReadNotifications)?;
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let rows = notification::list_for_user(
        &state.pool,
        user.id,
        scope == Scope::All,
        query.unread_only,
        limit,
    )
    .await?;
    Ok(Json(rows))
}

pub async fn mark_read(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<MarkRead>,
) -> AppResult<Json<MarkReadResponse>> {
    let scope = user.authorize(Operation::ReadNotifications)?;
    if !payload.mark_all && payload.ids.is_empty() {
        return Err(CommerceError::MissingField("ids or mark_all").into());
    }
    let ids = (!payload.mark_all).then_some(payload.ids.as_slice());
    let updated = notification::mark_read(&state.pool, user.id, scope == Scope::All, ids)
        .await?;
    Ok(Json(MarkReadResponse { updated }))
}
