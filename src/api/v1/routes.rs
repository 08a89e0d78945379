/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 公開 route と保護 route を分けて組み立て、merge する
 *   - 公開: /health, /auth/login, POST /users
 *   - 保護: それ以外 (access middleware を route_layer で適用)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    auth::login,
    health::health,
    orders::{create_order, list_orders},
    users::{create_user, delete_user, get_user, list_users, update_user},
};
use crate::middleware::auth::access;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/users", post(create_user));

    let protected = Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route(
            "/users/{user_id}/orders",
            get(list_orders).post(create_order),
        );
    let protected = access::apply(protected, state);

    public.merge(protected)
}
