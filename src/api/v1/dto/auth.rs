/*
 * Responsibility
 * - POST /auth/login の request/response DTO
 */
use serde::{Deserialize, Serialize};

use crate::services::auth::IssuedToken;

/// 欠けたフィールドは空文字列として受け、service 側で MISSING_CREDENTIALS にする
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

impl From<IssuedToken> for LoginResponse {
    fn from(t: IssuedToken) -> Self {
        Self {
            token: t.token,
            token_type: t.token_type,
            expires_in: t.expires_in,
        }
    }
}
