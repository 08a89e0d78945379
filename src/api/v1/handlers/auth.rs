/*
 * Responsibility
 * - POST /auth/login
 * - (email, password) → AuthenticationService → token
 */
use axum::Json;
use axum::extract::State;

use crate::api::v1::dto::auth::{LoginRequest, LoginResponse};
use crate::api::v1::extractors::ApiJson;
use crate::error::AppError;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let issued = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(issued.into()))
}
