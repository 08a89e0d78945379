use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::services::auth::error::AuthError;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Upper bound for the token ttl (one year).
pub const MAX_TTL: Duration = Duration::from_secs(366 * 24 * 60 * 60);

/// Startup-time misconfiguration of the codec. Never produced per request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenCodecError {
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("token ttl must be between one second and one year")]
    InvalidTtl,
}

#[derive(Debug, Serialize)]
struct IssuedClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Claims as presented by a caller.
///
/// `sub` is kept as a raw JSON value so that both `"42"` and `42` are accepted;
/// anything that is not a positive integer is rejected in `subject_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct PresentedClaims {
    #[serde(default)]
    pub sub: serde_json::Value,
    #[serde(default)]
    pub iat: Option<i64>,
    // Optional here so that a missing `exp` surfaces as MissingRequiredClaim
    // from jsonwebtoken instead of a serde error.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl PresentedClaims {
    pub fn subject_id(&self) -> Option<i64> {
        let id = match &self.sub {
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            serde_json::Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f < 9_007_199_254_740_992.0)
                    .map(|f| f as i64)
            }),
            _ => None,
        };
        id.filter(|id| *id > 0)
    }
}

/// HS256 identity-token codec.
///
/// - The secret and ttl are read once at startup and never change.
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &ALGORITHM)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenCodecError> {
        if secret.is_empty() {
            return Err(TokenCodecError::EmptySecret);
        }
        if ttl.as_secs() == 0 || ttl > MAX_TTL {
            return Err(TokenCodecError::InvalidTtl);
        }

        // Pinning a single algorithm rejects `none` and every other HMAC size.
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, subject_id: i64) -> Result<String, AuthError> {
        self.issue_at(subject_id, Utc::now())
    }

    /// Issue a token as if `now` were the current time.
    pub fn issue_at(&self, subject_id: i64, now: DateTime<Utc>) -> Result<String, AuthError> {
        if subject_id <= 0 {
            error!(subject_id, "refusing to issue token for non-positive subject");
            return Err(AuthError::TokenIssuanceFailed);
        }

        let iat = now.timestamp();
        let exp = i64::try_from(self.ttl.as_secs())
            .ok()
            .and_then(|ttl| iat.checked_add(ttl))
            .ok_or_else(|| {
                error!(iat, ttl = ?self.ttl, "token expiry overflows");
                AuthError::TokenIssuanceFailed
            })?;
        let claims = IssuedClaims {
            sub: subject_id.to_string(),
            iat,
            exp,
        };

        let mut header = Header::new(ALGORITHM);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            AuthError::TokenIssuanceFailed
        })
    }

    /// Verify algorithm, expiry and signature, then resolve the subject id.
    ///
    /// Order: a header not pinned to HS256 is `InvalidToken`; a past `exp`
    /// is `ExpiredToken` whether or not the signature verifies; then the
    /// signature and the remaining claims are checked.
    pub fn validate(&self, token: &str) -> Result<i64, AuthError> {
        let header = jsonwebtoken::decode_header(token).map_err(|e| {
            debug!(error = %e, "token header decode failed");
            AuthError::InvalidToken
        })?;
        if header.alg != ALGORITHM {
            debug!(alg = ?header.alg, "unexpected token algorithm");
            return Err(AuthError::InvalidToken);
        }

        let now = Utc::now().timestamp();
        if let Some(exp) = peek_expiry(token)
            && exp <= now
        {
            return Err(AuthError::ExpiredToken);
        }

        let claims = self.decode(token)?;
        let exp = claims.exp.ok_or(AuthError::MissingClaim("exp"))?;

        // jsonwebtoken accepts `exp == now`; a token is only valid while `now < exp`.
        if exp <= Utc::now().timestamp() {
            return Err(AuthError::ExpiredToken);
        }

        claims.subject_id().ok_or(AuthError::MissingClaim("sub"))
    }

    fn decode(&self, token: &str) -> Result<PresentedClaims, AuthError> {
        jsonwebtoken::decode::<PresentedClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token decode failed");
                match e.kind() {
                    ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    ErrorKind::MissingRequiredClaim(_) => AuthError::MissingClaim("exp"),
                    _ => AuthError::InvalidToken,
                }
            })
    }
}

/// Unverified read of `exp` from the payload segment. Never trusted for anything but rejection.
fn peek_expiry(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice::<PresentedClaims>(&bytes).ok()?.exp
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    use super::*;

    const SECRET: &[u8] = b"test_secret_key_for_testing_purposes_only";

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::from_secs(3600)).unwrap()
    }

    fn sign_raw(alg: Algorithm, secret: &[u8], claims: serde_json::Value) -> String {
        jsonwebtoken::encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret))
            .unwrap()
    }

    fn far_future() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[test]
    fn issue_then_validate_roundtrip() {
        let codec = codec();
        let token = codec.issue(42).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.validate(&token).unwrap(), 42);
    }

    #[test]
    fn issued_claims_carry_iat_and_exp() {
        let codec = codec();
        let now = Utc::now();
        let token = codec.issue_at(7, now).unwrap();

        let payload = token.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(claims["sub"], "7");
        assert_eq!(claims["iat"], now.timestamp());
        assert_eq!(claims["exp"], now.timestamp() + 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let token = codec
            .issue_at(42, Utc::now() - ChronoDuration::hours(2))
            .unwrap();

        assert!(matches!(codec.validate(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn token_expiring_now_is_rejected() {
        let codec = codec();
        let now = Utc::now().timestamp();
        let token = sign_raw(ALGORITHM, SECRET, json!({ "sub": "1", "exp": now }));

        assert!(matches!(codec.validate(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn expired_token_is_expired_even_with_a_foreign_signature() {
        let token = sign_raw(
            ALGORITHM,
            b"another-secret",
            json!({ "sub": "42", "exp": Utc::now().timestamp() - 60 }),
        );

        assert!(matches!(codec().validate(&token), Err(AuthError::ExpiredToken)));
    }

    #[test]
    fn expired_unsigned_token_is_still_invalid() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            json!({ "sub": "42", "exp": Utc::now().timestamp() - 60 })
                .to_string()
                .as_bytes(),
        );

        let token = format!("{header}.{claims}.");
        assert!(matches!(codec().validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = TokenCodec::new(b"another-secret", Duration::from_secs(3600)).unwrap();
        let token = other.issue(42).unwrap();

        assert!(matches!(codec().validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn unsigned_none_algorithm_is_invalid() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            json!({ "sub": "42", "exp": far_future() })
                .to_string()
                .as_bytes(),
        );

        for token in [
            format!("{header}.{claims}."),
            format!("{header}.{claims}"),
        ] {
            assert!(matches!(codec().validate(&token), Err(AuthError::InvalidToken)));
        }
    }

    #[test]
    fn other_hmac_algorithm_is_invalid() {
        let token = sign_raw(
            Algorithm::HS512,
            SECRET,
            json!({ "sub": "42", "exp": far_future() }),
        );

        assert!(matches!(codec().validate(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn missing_signature_segment_is_invalid() {
        assert!(matches!(codec().validate("abc.def"), Err(AuthError::InvalidToken)));
        assert!(matches!(codec().validate(""), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn tampered_signature_is_invalid() {
        let codec = codec();
        let token = codec.issue(42).unwrap();
        let last = token.chars().last().unwrap();
        let swapped = if last == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}{}", &token[..token.len() - 1], swapped);

        assert!(matches!(codec.validate(&tampered), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn subject_must_be_a_positive_integer() {
        let codec = codec();
        for sub in [json!(null), json!("abc"), json!("0"), json!("-3"), json!(-3), json!(1.5), json!([1])] {
            let token = sign_raw(ALGORITHM, SECRET, json!({ "sub": sub, "exp": far_future() }));
            assert!(
                matches!(codec.validate(&token), Err(AuthError::MissingClaim("sub"))),
                "sub = {sub}"
            );
        }

        let token = sign_raw(ALGORITHM, SECRET, json!({ "exp": far_future() }));
        assert!(matches!(codec.validate(&token), Err(AuthError::MissingClaim("sub"))));
    }

    #[test]
    fn numeric_subject_is_accepted() {
        let token = sign_raw(ALGORITHM, SECRET, json!({ "sub": 42, "exp": far_future() }));
        assert_eq!(codec().validate(&token).unwrap(), 42);

        let token = sign_raw(ALGORITHM, SECRET, json!({ "sub": 42.0, "exp": far_future() }));
        assert_eq!(codec().validate(&token).unwrap(), 42);
    }

    #[test]
    fn missing_exp_is_a_missing_claim() {
        let token = sign_raw(ALGORITHM, SECRET, json!({ "sub": "42" }));
        assert!(matches!(codec().validate(&token), Err(AuthError::MissingClaim("exp"))));
    }

    #[test]
    fn misconfiguration_fails_at_construction() {
        assert_eq!(
            TokenCodec::new(b"", Duration::from_secs(60)).unwrap_err(),
            TokenCodecError::EmptySecret
        );
        assert_eq!(
            TokenCodec::new(SECRET, Duration::from_millis(500)).unwrap_err(),
            TokenCodecError::InvalidTtl
        );
    }

    #[test]
    fn oversized_ttl_fails_at_construction() {
        for ttl in [
            MAX_TTL + Duration::from_secs(1),
            Duration::from_secs(i64::MAX as u64 - 100),
            Duration::from_secs(u64::MAX / 2 + 10),
            Duration::from_secs(u64::MAX),
        ] {
            assert_eq!(
                TokenCodec::new(SECRET, ttl).unwrap_err(),
                TokenCodecError::InvalidTtl,
                "ttl = {ttl:?}"
            );
        }
    }

    #[test]
    fn longest_allowed_ttl_still_issues_valid_tokens() {
        let codec = TokenCodec::new(SECRET, MAX_TTL).unwrap();
        let token = codec.issue(42).unwrap();

        assert_eq!(codec.validate(&token).unwrap(), 42);
    }

    #[test]
    fn non_positive_subject_is_not_issued() {
        assert!(matches!(codec().issue(0), Err(AuthError::TokenIssuanceFailed)));
    }

    #[tokio::test]
    async fn one_second_ttl_expires_after_two_seconds() {
        let codec = TokenCodec::new(SECRET, Duration::from_secs(1)).unwrap();
        let token = codec.issue(42).unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(matches!(codec.validate(&token), Err(AuthError::ExpiredToken)));
    }
}
