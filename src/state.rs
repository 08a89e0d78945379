/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - users/orders repo, CredentialVerifier, AuthenticationService, AuthorizationGate
 * - Clone 前提で持つ (内部は Arc で Clone cheap)
 * - 起動後は読み取り専用 (リクエスト間で共有する可変状態は持たない)
 */
use std::sync::Arc;

use crate::repos::{OrderRepo, UserRepo};
use crate::services::auth::{
    AuthenticationService, AuthorizationGate, CredentialVerifier, TokenCodec,
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
    pub orders: Arc<dyn OrderRepo>,
    pub credentials: Arc<CredentialVerifier>,
    pub auth: Arc<AuthenticationService>,
    pub gate: Arc<AuthorizationGate>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("auth", &self.auth)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepo>,
        orders: Arc<dyn OrderRepo>,
        tokens: Arc<TokenCodec>,
        credentials: Arc<CredentialVerifier>,
    ) -> Self {
        let auth = Arc::new(AuthenticationService::new(
            users.clone(),
            credentials.clone(),
            tokens.clone(),
        ));
        let gate = Arc::new(AuthorizationGate::new(tokens, users.clone()));

        Self {
            users,
            orders,
            credentials,
            auth,
            gate,
        }
    }
}
