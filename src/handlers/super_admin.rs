use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::AuthUser,
    errors::{ApiError, MessageResponse},
};

/// Wipes every non-superAdmin account and all question/answer content,
/// including stored images. SuperAdmin only; guarded at the router.
#[utoipa::path(
    get,
    path = "/superAdmin/superAdmCleanUp",
    responses(
        (status = 200, description = "Database cleaned up", body = MessageResponse),
        (status = 403, description = "Insufficient permissions", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "superAdmin"
)]
pub async fn cleanup(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.repo.purge_non_super_admin_data().await?;

    state.storage.purge().await.map_err(|e| {
        tracing::error!("image purge failed: {e}");
        ApiError::Internal
    })?;

    tracing::warn!(user_id = %auth.user_id, "database cleanup executed");
    Ok(Json(MessageResponse::of("Database cleaned up successfully.")))
}
