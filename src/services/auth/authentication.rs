use std::sync::Arc;

use tracing::{debug, error};

use crate::repos::user_repo::UserRepo;
use crate::services::auth::credentials::{CredentialError, CredentialVerifier};
use crate::services::auth::error::AuthError;
use crate::services::auth::token_codec::TokenCodec;

/// Service-level return type to keep handlers thin.
#[derive(Clone, Debug)]
pub struct IssuedToken {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

/// Login flow: (email, password) -> signed identity token.
///
/// Unknown email and wrong password produce the same `InvalidCredentials`.
#[derive(Clone)]
pub struct AuthenticationService {
    users: Arc<dyn UserRepo>,
    credentials: Arc<CredentialVerifier>,
    tokens: Arc<TokenCodec>,
}

impl std::fmt::Debug for AuthenticationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationService")
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl AuthenticationService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        credentials: Arc<CredentialVerifier>,
        tokens: Arc<TokenCodec>,
    ) -> Self {
        Self {
            users,
            credentials,
            tokens,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user = self.users.find_by_email(email).await.map_err(|e| {
            error!(error = ?e, "user lookup failed during login");
            AuthError::Storage(e)
        })?;

        let user = match user {
            Some(user) => user,
            None => {
                self.credentials
                    .verify_dummy_on_blocking_pool(password)
                    .await
                    .map_err(credential_fault)?;
                debug!("login rejected: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let matches = self
            .credentials
            .verify_on_blocking_pool(password, &user.password_hash)
            .await
            .map_err(credential_fault)?;
        if !matches {
            debug!(user_id = user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        debug!(user_id = user.id, "login succeeded");

        Ok(IssuedToken {
            token,
            token_type: "Bearer",
            expires_in: self.tokens.ttl().as_secs(),
        })
    }
}

// Logged by the verifier; the caller only sees an opaque server error.
fn credential_fault(_: CredentialError) -> AuthError {
    AuthError::TokenIssuanceFailed
}
