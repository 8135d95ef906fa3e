// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! Admin-only user management.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::AdminOnly,
    error::ApiError,
    models::{MessageResponse, UserSummary},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/auth/users",
    tag = "Admin",
    responses((status = 200, body = [UserSummary]))
)]
pub async fn list_users(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let store = state.store.read().await;
    let users = store.list_users().iter().map(UserSummary::from).collect();
    Ok(Json(users))
}

#[utoipa::path(
    delete,
    path = "/api/auth/users/{user_id}",
    params(("user_id" = String, Path, description = "User to delete")),
    tag = "Admin",
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, body = crate::error::ErrorResponse, description = "User not found")
    )
)]
pub async fn delete_user(
    AdminOnly(_admin): AdminOnly,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut store = state.store.write().await;
    store.delete_user(&user_id)?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully".into(),
    }))
}
