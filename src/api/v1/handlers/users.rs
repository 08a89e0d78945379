/*
 * Responsibility
 * - /users 系 CRUD handler
 * - Path/Json/Query を extractor で受け、DTO validation → repo 呼び出し
 * - POST /users 以外は access middleware を通過済み
 */
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    api::v1::dto::users::{
        CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserResponse, UsersListResponse,
    },
    api::v1::extractors::ApiJson,
    error::AppError,
    state::AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UsersListResponse>, AppError> {
    query.validate().map_err(AppError::validation)?;

    let (rows, total) = state.users.list(query.to_filter()).await?;

    Ok(Json(UsersListResponse {
        page: query.page(),
        limit: query.limit(),
        total,
        users: rows.into_iter().map(UserResponse::from).collect(),
    }))
}

pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let password_hash = state
        .credentials
        .hash_on_blocking_pool(&req.password)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AppError::Internal
        })?;

    let row = state
        .users
        .create(req.name.trim(), req.email.trim(), req.age, &password_hash)
        .await?;

    tracing::info!(user_id = row.id, "user created");
    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let row = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    req.validate().map_err(AppError::validation)?;

    let row = state
        .users
        .update(user_id, req.into_patch())
        .await?
        .ok_or(AppError::not_found("user"))?;

    Ok(Json(row.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if state.users.delete(user_id).await? {
        tracing::info!(user_id, "user deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("user"))
    }
}
