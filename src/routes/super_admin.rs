use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// SuperAdmin Router Module
///
/// Holds the single most destructive endpoint on the API, behind the
/// superAdmin-only gate layered on in `create_router`.
pub fn super_admin_routes() -> Router<AppState> {
    Router::new()
        // GET /superAdmin/superAdmCleanUp
        // Wipes every non-superAdmin account and all content, including
        // stored images.
        .route(
            "/superAdmin/superAdmCleanUp",
            get(handlers::super_admin::cleanup),
        )
}
