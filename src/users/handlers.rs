//! HTTP handlers for the user directory

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use super::service::{RegisterRequest, UpdateProfileRequest};
use crate::core::{AppResult, Caller, IdPath, Validated};
use crate::model::{DirectoryStats, User};
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RoleFilter {
    pub role: Option<String>,
}

/// POST /api/users
pub async fn register(
    State(state): State<AppState>,
    Validated(request): Validated<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/users/profile
pub async fn profile(State(state): State<AppState>, caller: Caller) -> AppResult<Json<User>> {
    Ok(Json(state.users.profile(&caller).await?))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    caller: Caller,
    Validated(request): Validated<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.update_profile(&caller, request).await?))
}

/// GET /api/users?role=
pub async fn list(
    State(state): State<AppState>,
    caller: Caller,
    Query(filter): Query<RoleFilter>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.list(&caller, filter.role.as_deref()).await?))
}

/// GET /api/users/stats
pub async fn stats(
    State(state): State<AppState>,
    caller: Caller,
) -> AppResult<Json<DirectoryStats>> {
    Ok(Json(state.users.stats(&caller).await?))
}

/// DELETE /api/users/{id}
pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    IdPath(id): IdPath,
) -> AppResult<StatusCode> {
    state.users.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
