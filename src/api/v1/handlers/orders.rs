/*
 * Responsibility
 * - /users/{user_id}/orders handler
 * - 対象ユーザーは AuthCtx から取る (middleware が path と照合済み)
 */
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    api::v1::{
        dto::orders::{CreateOrderRequest, OrderResponse},
        extractors::{ApiJson, AuthCtxExtractor},
    },
    error::AppError,
    state::AppState,
};

pub async fn list_orders(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let rows = state.orders.list_by_user(ctx.user_id).await?;
    Ok(Json(rows.into_iter().map(OrderResponse::from).collect()))
}

pub async fn create_order(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    req.validate().map_err(AppError::validation)?;

    let row = state
        .orders
        .create(ctx.user_id, req.product.trim(), req.quantity, req.price)
        .await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}
