//! access token (HS256 JWT) 検証 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <jwt>` を AuthorizationGate に渡す
//! - `{user_id}` を持つ route では path と token の subject を照合する
//! - 失敗はすべて同じ 401 (理由はログにのみ残す)
//! - handler は gate を通過したリクエストでしか呼ばれない

use axum::{
    Router,
    body::Body,
    extract::{FromRequestParts, RawPathParams, State, rejection::RawPathParamsRejection},
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

const USER_ID_PARAM: &str = "user_id";

/// 保護対象の router に認証を掛ける。
///
/// `route_layer` なので、マッチした route にだけ適用され path params が読める。
/// 未マッチ (404/405) は gate を通らない。
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let path_user_id = path_user_id(&mut parts, &state).await;

    let authorization = match parts.headers.get(header::AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| {
            tracing::warn!("authorization header is not visible ascii");
            AppError::Unauthorized
        })?),
        None => None,
    };

    let user_id = state
        .gate
        .authorize(authorization, path_user_id.as_deref())
        .await?;

    // middleware → extractor への受け渡し
    parts.extensions.insert(AuthCtx::new(user_id));

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// `{user_id}` の生の文字列。
///
/// - param を持たない route: None (照合しない)
/// - UTF-8 として読めない: 空文字列 (どの subject とも一致しない)
async fn path_user_id(parts: &mut axum::http::request::Parts, state: &AppState) -> Option<String> {
    match RawPathParams::from_request_parts(parts, state).await {
        Ok(params) => params
            .iter()
            .find(|(key, _)| *key == USER_ID_PARAM)
            .map(|(_, value)| value.to_owned()),
        Err(RawPathParamsRejection::MissingPathParams(_)) => None,
        Err(err) => {
            tracing::warn!(error = %err, "path parameters could not be decoded");
            Some(String::new())
        }
    }
}
