use thiserror::Error;

use crate::repos::error::RepoError;

/// Failures of the authentication / authorization core.
///
/// The variants are kept distinct for logging; `AppError::from` collapses
/// every token/identity failure into the same 401 response.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header missing or not in `Bearer <token>` form")]
    TokenRequired,

    #[error("token is malformed or its signature does not verify")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("token is missing a required claim: {0}")]
    MissingClaim(&'static str),

    #[error("token subject does not match the requested resource")]
    IdentityMismatch,

    #[error("token subject no longer exists")]
    IdentityNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email and password are required")]
    MissingCredentials,

    #[error("failed to issue token")]
    TokenIssuanceFailed,

    #[error("storage error: {0}")]
    Storage(#[from] RepoError),
}
