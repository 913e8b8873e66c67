use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{config::AppConfig, errors::ApiError, roles::Role};

/// Identity tokens expire a fixed three days after issuance. Expiry is the
/// only invalidation mechanism: there is no server-side session or
/// revocation store, so a leaked token stays valid until this window closes.
pub const TOKEN_TTL_DAYS: i64 = 3;

/// Claims
///
/// The signed payload of an identity token: who the bearer is and which role
/// they held when the token was issued. Validated on every protected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's UUID.
    pub sub: Uuid,
    /// Username at issuance time, carried for display and log enrichment.
    pub username: String,
    /// Role tag at issuance time. Role changes only take effect on the next
    /// login; that is an accepted property of the stateless scheme.
    pub role: Role,
    /// Issued-at (seconds since epoch).
    pub iat: usize,
    /// Expiration (seconds since epoch). Tokens past this instant are
    /// rejected outright.
    pub exp: usize,
}

/// Why a presented token was rejected. Logged server-side only — clients get
/// a single generic 403 regardless of the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    SignatureMismatch,
    #[error("token expired")]
    Expired,
}

/// issue_token
///
/// Signs a new identity token for the given identity. Always succeeds for
/// valid identity fields; a signing failure is an internal error (it can only
/// happen on serialization problems).
pub fn issue_token(
    user_id: Uuid,
    username: &str,
    role: Role,
    secret: &str,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("failed to sign identity token: {e}");
        ApiError::Internal
    })
}

/// verify_token
///
/// Pure verification: a function of the token and the shared secret only, no
/// store access. On any failure the caller must treat the request as
/// unauthenticated — claims from a failed verification are never used.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;

    match decode::<Claims>(token, &decoding_key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => Err(match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
            _ => TokenError::Malformed,
        }),
    }
}

/// AuthUser
///
/// The resolved identity of an authenticated request — the output of the
/// Authentication Gate. Handlers receive it as a plain extractor argument and
/// use it for ownership scoping; the route guards use it for role checks.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's `FromRequestParts`, making `AuthUser` usable as a
/// function argument in any protected handler or middleware:
/// 1. Extract the bearer credential from the `Authorization` header.
/// 2. Verify signature and expiry against the server-held secret.
/// 3. Attach the verified identity; nothing is read from or written to any
///    store.
///
/// Rejection: 403 with a generic message for every failure mode. The precise
/// reason is logged at debug level only.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthenticated)?;

        let claims = verify_token(token, &config.jwt_secret).map_err(|e| {
            tracing::debug!("rejected identity token: {e}");
            ApiError::Unauthenticated
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}
