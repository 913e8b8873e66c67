use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod password;
pub mod repository;
pub mod roles;
pub mod routes;
pub mod storage;

use auth::AuthUser;
use routes::{authenticated, public, staff, super_admin};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use errors::ApiError;
pub use mailer::{LogMailer, MailerState, MockMailer};
pub use repository::{PostgresRepository, RepositoryState};
pub use roles::{Role, STAFF_ROLES, SUPER_ADMIN_ROLES};
pub use storage::{LocalImageStore, MockImageStore, StorageState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the
/// OpenAPI document served at `/api-docs/openapi.json` and rendered by the
/// Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::users::register, handlers::users::login,
        handlers::users::password_reset_request, handlers::users::password_update,
        handlers::users::update_role, handlers::users::update_profile,
        handlers::users::delete_profile, handlers::users::get_single_user,
        handlers::users::all_users,
        handlers::questions::create_question, handlers::questions::upload_image,
        handlers::questions::update_question, handlers::questions::delete_question,
        handlers::questions::get_question, handlers::questions::questions_by_user,
        handlers::questions::all_questions, handlers::questions::questions_by_tag,
        handlers::questions::all_tags, handlers::questions::get_image,
        handlers::answers::create_answer, handlers::answers::answers_for_question,
        handlers::answers::update_answer, handlers::answers::delete_answer,
        handlers::answers::answers_by_user,
        handlers::super_admin::cleanup,
    ),
    components(
        schemas(
            models::UserView, models::UserResponse, models::UsersResponse,
            models::RegisterRequest, models::LoginRequest, models::ProfileUpdateRequest,
            models::RoleUpdateRequest, models::PasswordResetRequest,
            models::PasswordUpdateRequest,
            models::Question, models::QuestionWithAuthor, models::QuestionResponse,
            models::QuestionsResponse, models::CreateQuestionRequest,
            models::UpdateQuestionRequest, models::TagsResponse,
            models::UploadImageResponse,
            models::Answer, models::AnswerWithAuthor, models::CreateAnswerRequest,
            models::UpdateAnswerRequest,
            errors::ErrorResponse, errors::MessageResponse,
            roles::Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Accounts, sessions and administration"),
        (name = "questions", description = "Questions and their images"),
        (name = "answers", description = "Answers to questions"),
        (name = "superAdmin", description = "Destructive maintenance operations")
    )
)]
struct ApiDoc;

/// Registers the bearer-token scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Single immutable container for the application's shared services, cloned
/// cheaply per request. Handlers pull individual pieces out via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: all Postgres access behind the trait object.
    pub repo: RepositoryState,
    /// Image store for question attachments.
    pub storage: StorageState,
    /// Outbound mail for the password-reset flow.
    pub mailer: MailerState,
    /// Loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for MailerState {
    fn from_ref(app_state: &AppState) -> MailerState {
        app_state.mailer.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Bearer-token gate for the authenticated tier. Extracting `AuthUser`
/// performs the full token verification; a failure rejects the request with
/// 403 before the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// staff_middleware
///
/// Role gate for user administration: the verified identity must hold one of
/// the staff roles. Purely set membership against the allow-list; there is
/// no role ordering.
async fn staff_middleware(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    roles::ensure_role(&auth_user, STAFF_ROLES)?;
    Ok(next.run(request).await)
}

/// super_admin_middleware
///
/// Role gate for the cleanup endpoint: superAdmin only.
async fn super_admin_middleware(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    roles::ensure_role(&auth_user, SUPER_ADMIN_ROLES)?;
    Ok(next.run(request).await)
}

/// create_router
///
/// Assembles the routing tiers, applies the gates per tier, registers the
/// shared state, and wraps everything in the observability and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any)
        // The login/register token travels back in this header; browsers
        // need it listed to read it cross-origin.
        .expose_headers([axum::http::header::AUTHORIZATION]);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public tier: no gate.
        .merge(public::public_routes())
        // Authenticated tier: bearer-token gate.
        .merge(authenticated::authenticated_routes().route_layer(
            middleware::from_fn_with_state(state.clone(), auth_middleware),
        ))
        // Staff tier: token gate is implied by the role gate, which runs the
        // same extractor first.
        .merge(staff::staff_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            staff_middleware,
        )))
        // SuperAdmin tier.
        .merge(
            super_admin::super_admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                super_admin_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Give every request a correlation id before anything logs.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// Span factory for `TraceLayer`: method, URI and the request correlation id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
