use std::sync::Arc;

use tracing::{error, warn};

use crate::repos::user_repo::UserRepo;
use crate::services::auth::error::AuthError;
use crate::services::auth::token_codec::TokenCodec;

const BEARER: &str = "Bearer";

/// Per-request authorization decision.
///
/// ExtractToken -> ValidateToken -> PathIdentityCheck -> IdentityExistenceCheck -> Allow.
/// The first failing step ends the request; nothing later runs.
#[derive(Clone)]
pub struct AuthorizationGate {
    tokens: Arc<TokenCodec>,
    users: Arc<dyn UserRepo>,
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl AuthorizationGate {
    pub fn new(tokens: Arc<TokenCodec>, users: Arc<dyn UserRepo>) -> Self {
        Self { tokens, users }
    }

    /// Returns the resolved user id on success.
    ///
    /// - `authorization`: raw `Authorization` header value, if any
    /// - `path_user_id`: raw `{user_id}` path segment on user-scoped routes
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        path_user_id: Option<&str>,
    ) -> Result<i64, AuthError> {
        let token = extract_bearer(authorization)?;

        let user_id = self.tokens.validate(token).inspect_err(|err| {
            warn!(error = %err, "access token verification failed");
        })?;

        if let Some(path_id) = path_user_id
            && path_id != user_id.to_string()
        {
            warn!(user_id, path_user_id = %path_id, "token subject does not match path");
            return Err(AuthError::IdentityMismatch);
        }

        match self.users.find_by_id(user_id).await {
            Ok(Some(_)) => Ok(user_id),
            Ok(None) => {
                warn!(user_id, "token subject no longer exists");
                Err(AuthError::IdentityNotFound)
            }
            Err(e) => {
                error!(user_id, error = ?e, "identity lookup failed");
                Err(AuthError::Storage(e))
            }
        }
    }
}

/// `Authorization: Bearer <token>` exactly: two space-separated parts,
/// the first literally `Bearer`, the second non-empty.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::TokenRequired)?;

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(BEARER), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::TokenRequired),
    }
}
