use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::issue_token,
    errors::{ApiError, MessageResponse},
    models::{
        LoginRequest, PasswordResetRequest, PasswordUpdateRequest, ProfileUpdateRequest,
        RegisterRequest, RoleUpdateRequest, UserResponse, UsersResponse, parse_assignable_role,
    },
    password::{hash_password, verify_password},
    repository::{NewUser, ProfileChanges},
    roles::Role,
};

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Registers a new account and logs it in: the response carries a fresh
/// bearer token in the `Authorization` header.
#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User created, token in Authorization header", body = MessageResponse),
        (status = 400, description = "Validation failed or email already exists", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let password_hash = hash_password(payload.password.as_deref().unwrap_or_default()).await?;
    let user = NewUser {
        username: payload.username.unwrap_or_default().trim().to_string(),
        firstname: payload.firstname.unwrap_or_default().trim().to_string(),
        lastname: payload.lastname.unwrap_or_default().trim().to_string(),
        email: payload.email.unwrap_or_default().trim().to_string(),
        gender: payload.gender.unwrap_or_default().trim().to_string(),
        country: payload.country.unwrap_or_default().trim().to_string(),
        agreed_to_terms: true,
        role: Role::User,
        password_hash,
    };

    let record = state.repo.create_user(user).await?;
    tracing::info!(user_id = %record.user_id, "user registered");

    let token = issue_token(
        record.user_id,
        &record.username,
        record.role(),
        &state.config.jwt_secret,
    )?;

    Ok((
        [(header::AUTHORIZATION, format!("Bearer {token}"))],
        Json(MessageResponse::of("User created successfully")),
    ))
}

/// Exchanges email and password for a bearer token. Unknown email and wrong
/// password produce the same 401.
#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, token in Authorization header", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let email = payload.email.unwrap_or_default();
    let record = state
        .repo
        .find_user_by_email(email.trim())
        .await?
        .ok_or(ApiError::BadCredentials)?;

    let password = payload.password.unwrap_or_default();
    if !verify_password(&password, &record.password).await? {
        return Err(ApiError::BadCredentials);
    }

    let token = issue_token(
        record.user_id,
        &record.username,
        record.role(),
        &state.config.jwt_secret,
    )?;
    tracing::debug!(user_id = %record.user_id, "login succeeded");

    Ok((
        [(header::AUTHORIZATION, format!("Bearer {token}"))],
        Json(MessageResponse::of("User logged in successfully")),
    ))
}

/// Starts the password-reset flow. The response is the same whether or not
/// the email belongs to an account, so the endpoint cannot be used to probe
/// for registered addresses.
#[utoipa::path(
    post,
    path = "/users/userPasswordResetRequest",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = MessageResponse),
    ),
    tag = "users"
)]
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = match non_empty(&payload.email) {
        Some(email) => email,
        None => return Err(ApiError::Validation(vec!["Email is required.".to_string()])),
    };

    if let Some(record) = state.repo.find_user_by_email(&email).await? {
        let reset_link = format!(
            "{}/api/userPasswordReset/{}",
            state.config.frontend_url, record.user_id
        );
        if let Err(e) = state.mailer.send_password_reset(&record.email, &reset_link).await {
            tracing::error!(user_id = %record.user_id, "failed to send reset mail: {e}");
        }
    }

    Ok(Json(MessageResponse::of(
        "Password updating email has been sent to your email.",
    )))
}

/// Completes the password-reset flow for the user the emailed link points to.
#[utoipa::path(
    post,
    path = "/users/userPasswordReset/{userId}",
    params(("userId" = Uuid, Path, description = "User to reset")),
    request_body = PasswordUpdateRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn password_update(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<PasswordUpdateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let password_hash = hash_password(payload.new_password.as_deref().unwrap_or_default()).await?;
    if !state.repo.update_password(user_id, &password_hash).await? {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }

    tracing::info!(%user_id, "password updated");
    Ok(Json(MessageResponse::of("Password updated successfully.")))
}

/// Reassigns a user's role. Staff only; the superAdmin tier is never
/// assignable through this endpoint.
#[utoipa::path(
    patch,
    path = "/users/userRole/{userId}",
    params(("userId" = Uuid, Path, description = "User to reassign")),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role updated", body = MessageResponse),
        (status = 403, description = "Insufficient permissions", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn update_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RoleUpdateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let role = payload.validate().map_err(ApiError::Validation)?;

    if !state.repo.update_role(user_id, role).await? {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }

    tracing::info!(%user_id, role = role.as_tag(), "role updated");
    Ok(Json(MessageResponse::of("User role updated successfully.")))
}

/// Staff-gated partial profile update.
#[utoipa::path(
    patch,
    path = "/users/userProfileUpdate/{userId}",
    params(("userId" = Uuid, Path, description = "User to update")),
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Profile updated", body = MessageResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let changes = ProfileChanges {
        username: non_empty(&payload.username),
        firstname: non_empty(&payload.firstname),
        lastname: non_empty(&payload.lastname),
        role: non_empty(&payload.role).and_then(|tag| parse_assignable_role(&tag)),
    };

    if !state.repo.update_profile(user_id, changes).await? {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }

    Ok(Json(MessageResponse::of("Profile updated successfully.")))
}

/// Deletes a user profile. Accounts holding the admin role are protected
/// from deletion regardless of who asks.
#[utoipa::path(
    delete,
    path = "/users/userProfileDelete/{userId}",
    params(("userId" = Uuid, Path, description = "User to delete")),
    responses(
        (status = 200, description = "Profile deleted", body = MessageResponse),
        (status = 403, description = "Admin profiles cannot be deleted", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn delete_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let record = state
        .repo
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    if record.role() == Role::Admin {
        return Err(ApiError::Forbidden("Admin profiles cannot be deleted."));
    }

    // The guard and the delete are two statements; a role change landing in
    // between is tolerated because role updates go through the same staff
    // gate as this endpoint.
    if !state.repo.delete_user(user_id).await? {
        return Err(ApiError::NotFound("User not found.".to_string()));
    }

    tracing::info!(%user_id, "user profile deleted");
    Ok(Json(MessageResponse::of("User profile deleted successfully.")))
}

/// Fetches a single user by id.
#[utoipa::path(
    get,
    path = "/users/getSingleUser/{userId}",
    params(("userId" = Uuid, Path, description = "User to fetch")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
    ),
    tag = "users"
)]
pub async fn get_single_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let record = state
        .repo
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    Ok(Json(UserResponse {
        user: record.into(),
    }))
}

/// Lists every account.
#[utoipa::path(
    get,
    path = "/users/allUsers",
    responses(
        (status = 200, description = "All users, or a message when there are none", body = UsersResponse),
    ),
    tag = "users"
)]
pub async fn all_users(
    State(state): State<AppState>,
) -> Result<axum::response::Response, ApiError> {
    let users = state.repo.list_users().await?;

    if users.is_empty() {
        return Ok((StatusCode::OK, Json(MessageResponse::of("No users found."))).into_response());
    }

    let users = users.into_iter().map(Into::into).collect();
    Ok(Json(UsersResponse { users }).into_response())
}
