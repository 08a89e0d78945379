/*
 * Responsibility
 * - axum::Json の薄いラッパー
 * - body の parse 失敗 (構文 / 型 / Content-Type) を AppError (VALIDATION_ERROR) で返す
 */
use axum::Json;
use axum::extract::{FromRequest, Request, rejection::JsonRejection};

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
