use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. These are the entry points of the
/// identity flow plus image retrieval: everything else on the API requires a
/// bearer token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness probe for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /users/register
        // Creates an account and immediately issues a token in the
        // Authorization response header.
        .route("/users/register", post(handlers::users::register))
        // POST /users/login
        // Exchanges credentials for a token. Unknown email and wrong
        // password are indistinguishable (both 401).
        .route("/users/login", post(handlers::users::login))
        // POST /users/userPasswordResetRequest
        // Step one of the reset flow: emails a reset link. Always 200 so the
        // endpoint cannot probe for registered addresses.
        .route(
            "/users/userPasswordResetRequest",
            post(handlers::users::password_reset_request),
        )
        // POST /users/userPasswordReset/{userId}
        // Step two: sets the new password for the linked user.
        .route(
            "/users/userPasswordReset/{userId}",
            post(handlers::users::password_update),
        )
        // GET /questions/getImage/{imageLink}
        // Serves stored question images by their opaque link.
        .route(
            "/questions/getImage/{imageLink}",
            get(handlers::questions::get_image),
        )
}
