use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch},
};

/// Staff Router Module
///
/// User-administration endpoints restricted to the admin, subAdmin and
/// superAdmin roles. `create_router` wraps this router in the staff gate,
/// which verifies the token's role against the allow-list before any handler
/// runs; a plain user gets 403 with no handler or repository work done.
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        // PATCH /users/userRole/{userId}
        // Reassigns a user's role. The superAdmin tier is not assignable.
        .route("/users/userRole/{userId}", patch(handlers::users::update_role))
        // PATCH /users/userProfileUpdate/{userId}
        // Partial profile edit for any account.
        .route(
            "/users/userProfileUpdate/{userId}",
            patch(handlers::users::update_profile),
        )
        // DELETE /users/userProfileDelete/{userId}
        // Deletes an account. Admin-role profiles are protected and return
        // 403 regardless of the caller.
        .route(
            "/users/userProfileDelete/{userId}",
            delete(handlers::users::delete_profile),
        )
        // GET /users/getSingleUser/{userId}
        // Single account lookup.
        .route(
            "/users/getSingleUser/{userId}",
            get(handlers::users::get_single_user),
        )
        // GET /users/allUsers
        // Every account on the platform.
        .route("/users/allUsers", get(handlers::users::all_users))
}
