// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Goaltrack

//! Goal CRUD. All routes require a valid access token; the `/admin/*`
//! variants additionally require the admin role.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    models::{CreateGoalRequest, DeletedGoalResponse, Goal, UpdateGoalRequest},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/goals",
    tag = "Goals",
    responses((status = 200, body = [Goal]))
)]
pub async fn list_goals(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Goal>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.goals_for_user(&user.user_id)))
}

#[utoipa::path(
    post,
    path = "/api/goals",
    request_body = CreateGoalRequest,
    tag = "Goals",
    responses(
        (status = 201, body = Goal),
        (status = 400, body = crate::error::ErrorResponse, description = "Missing text field")
    )
)]
pub async fn create_goal(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let text = request
        .text
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::bad_request("Please add a text field"))?;

    let mut store = state.store.write().await;
    let goal = store.create_goal(&user.user_id, text);
    Ok((StatusCode::CREATED, Json(goal)))
}

#[utoipa::path(
    put,
    path = "/api/goals/{goal_id}",
    request_body = UpdateGoalRequest,
    params(("goal_id" = String, Path, description = "Goal to update")),
    tag = "Goals",
    responses(
        (status = 200, body = Goal),
        (status = 401, description = "Goal belongs to another user"),
        (status = 404, description = "Goal not found")
    )
)]
pub async fn update_goal(
    Auth(user): Auth,
    Path(goal_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdateGoalRequest>,
) -> Result<Json<Goal>, ApiError> {
    let text = request
        .text
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::bad_request("Please add a text field"))?;

    let mut store = state.store.write().await;
    let goal = store.goal_by_id(&goal_id)?;
    if goal.user_id != user.user_id {
        return Err(ApiError::unauthorized("User not authorized"));
    }

    let updated = store.update_goal_text(&goal_id, text)?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/goals/{goal_id}",
    params(("goal_id" = String, Path, description = "Goal to delete")),
    tag = "Goals",
    responses(
        (status = 200, body = DeletedGoalResponse),
        (status = 401, description = "Goal belongs to another user"),
        (status = 404, description = "Goal not found")
    )
)]
pub async fn delete_goal(
    Auth(user): Auth,
    Path(goal_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeletedGoalResponse>, ApiError> {
    let mut store = state.store.write().await;
    let goal = store.goal_by_id(&goal_id)?;
    if goal.user_id != user.user_id {
        return Err(ApiError::unauthorized("User not authorized"));
    }

    store.delete_goal(&goal_id)?;
    Ok(Json(DeletedGoalResponse { id: goal_id }))
}

#[utoipa::path(
    get,
    path = "/api/goals/admin/all",
    tag = "Goals",
    responses((status = 200, body = [Goal]))
)]
pub async fn all_goals(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<Vec<Goal>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.all_goals()))
}

#[utoipa::path(
    get,
    path = "/api/goals/admin/user/{user_id}",
    params(("user_id" = String, Path, description = "Owner of the goals")),
    tag = "Goals",
    responses((status = 200, body = [Goal]))
)]
pub async fn user_goals(
    AdminOnly(_admin): AdminOnly,
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Goal>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(store.goals_for_user(&user_id)))
}

#[utoipa::path(
    delete,
    path = "/api/goals/admin/{goal_id}",
    params(("goal_id" = String, Path, description = "Goal to delete")),
    tag = "Goals",
    responses(
        (status = 200, body = DeletedGoalResponse),
        (status = 404, description = "Goal not found")
    )
)]
pub async fn delete_any_goal(
    AdminOnly(_admin): AdminOnly,
    Path(goal_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeletedGoalResponse>, ApiError> {
    let mut store = state.store.write().await;
    store.goal_by_id(&goal_id)?;
    store.delete_goal(&goal_id)?;
    Ok(Json(DeletedGoalResponse { id: goal_id }))
}
