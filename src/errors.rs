use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// ApiError
///
/// The full failure taxonomy for the API. Every handler returns
/// `Result<_, ApiError>`, and the `IntoResponse` implementation below maps
/// each variant onto the uniform `{"errors": [...]}` envelope with the
/// matching HTTP status code.
///
/// Authentication and authorization failures short-circuit before any
/// business logic or data-store mutation runs (they are raised by the
/// extractor / route guards, never inside handlers).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad input shape or content. Carries every failed rule so the caller
    /// can fix all issues in one round trip.
    #[error("validation failed")]
    Validation(Vec<String>),

    /// Login with an unknown email or a wrong password. Deliberately a single
    /// variant: the two cases must be indistinguishable to the caller.
    #[error("invalid credentials")]
    BadCredentials,

    /// Missing, malformed, expired, or forged identity token.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Valid identity, insufficient role or a hard-coded protection rule.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Resource absent — or present but not owned by the caller. The two are
    /// reported identically on purpose.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation (duplicate email). Surfaced as 400 like any
    /// other input problem.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected failure. Details are logged server-side; the client only
    /// ever sees a generic message.
    #[error("internal failure")]
    Internal,
}

/// Uniform failure envelope: `{"errors": [...]}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}

/// Uniform success envelope: `{"message": [...]}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: Vec<String>,
}

impl MessageResponse {
    pub fn of(msg: &str) -> Self {
        Self {
            message: vec![msg.to_string()],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, errors),
            ApiError::BadCredentials => (
                StatusCode::UNAUTHORIZED,
                vec!["Invalid credentials".to_string()],
            ),
            // 403 for both missing and invalid tokens; the diagnostic reason
            // is logged where the failure occurred, never sent to the client.
            ApiError::Unauthenticated => (
                StatusCode::FORBIDDEN,
                vec!["You are not Authorized".to_string()],
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, vec![msg.to_string()]),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, vec![msg]),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, vec![msg]),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                vec!["Something went wrong. Please try again later.".to_string()],
            ),
        };

        (status, Json(ErrorResponse { errors })).into_response()
    }
}
