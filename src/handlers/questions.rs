use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    errors::{ApiError, MessageResponse},
    models::{
        CreateQuestionRequest, QuestionResponse, QuestionsResponse, TagsResponse,
        UpdateQuestionRequest, UploadImageResponse,
    },
    repository::{NewQuestion, QuestionChanges},
};

/// Placeholder stored when a question has no image.
pub const NO_IMAGE: &str = "not available";

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn has_real_image(link: &Option<String>) -> bool {
    link.as_deref().is_some_and(|l| !l.is_empty() && l != NO_IMAGE)
}

/// Creates a question owned by the caller.
#[utoipa::path(
    post,
    path = "/questions/createQuestion",
    request_body = CreateQuestionRequest,
    responses(
        (status = 201, description = "Question created", body = MessageResponse),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn create_question(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let question = NewQuestion {
        user_id: auth.user_id,
        title: payload.title.unwrap_or_default().trim().to_string(),
        description: payload.description.unwrap_or_default().trim().to_string(),
        tag: payload.tag.unwrap_or_default().trim().to_string(),
        image_link: non_empty(&payload.image_link),
    };

    let created = state.repo.create_question(question).await?;
    tracing::info!(question_id = %created.question_id, user_id = %auth.user_id, "question created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::of("Question created successfully")),
    ))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadImageParams {
    /// Original file name; the stored link is derived from it.
    pub filename: Option<String>,
}

/// Accepts raw image bytes and returns the link to reference from question
/// payloads. The link is stored separately so the question endpoints never
/// carry binary bodies.
#[utoipa::path(
    post,
    path = "/questions/uploadImage",
    params(UploadImageParams),
    request_body(content = Vec<u8>, content_type = "image/png", description = "Raw image bytes"),
    responses(
        (status = 200, description = "Image stored", body = UploadImageResponse),
        (status = 400, description = "Unsupported format", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn upload_image(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<UploadImageParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadImageResponse>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != "image/png" && content_type != "image/jpeg" {
        return Err(ApiError::Validation(vec![
            "Only .png and .jpeg format allowed!".to_string(),
        ]));
    }

    let filename = non_empty(&params.filename)
        .ok_or_else(|| ApiError::Validation(vec!["Filename is required.".to_string()]))?;

    let image_link = state.storage.save(&filename, &body).await.map_err(|e| {
        tracing::error!("image save failed: {e}");
        ApiError::Internal
    })?;

    Ok(Json(UploadImageResponse { image_link }))
}

/// Updates a question the caller owns. Someone else's question is reported
/// as absent, never as forbidden.
#[utoipa::path(
    patch,
    path = "/questions/updateQuestion/{questionId}",
    params(("questionId" = Uuid, Path, description = "Question to update")),
    request_body = UpdateQuestionRequest,
    responses(
        (status = 200, description = "Question updated", body = MessageResponse),
        (status = 404, description = "Question not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn update_question(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let changes = QuestionChanges {
        title: non_empty(&payload.title),
        description: non_empty(&payload.description),
        tag: non_empty(&payload.tag),
        image_link: non_empty(&payload.image_link),
    };

    if changes.title.is_none()
        && changes.description.is_none()
        && changes.tag.is_none()
        && changes.image_link.is_none()
    {
        return Err(ApiError::Validation(vec![
            "At least one field must be provided for update.".to_string(),
        ]));
    }

    // When the image is being replaced, the old link is fetched first so the
    // superseded file can be removed after the write lands.
    let old_link = if changes.image_link.is_some() {
        state
            .repo
            .find_owned_question(question_id, auth.user_id)
            .await?
            .and_then(|q| q.image_link)
    } else {
        None
    };

    let updated = state
        .repo
        .update_question(question_id, auth.user_id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if let Some(old) = old_link.filter(|l| !l.is_empty() && l != NO_IMAGE) {
        if updated.image_link.as_deref() != Some(old.as_str()) {
            if let Err(e) = state.storage.delete(&old).await {
                tracing::warn!(question_id = %question_id, "stale image cleanup failed: {e}");
            }
        }
    }

    Ok(Json(MessageResponse::of("Question updated successfully")))
}

/// Deletes a question the caller owns, along with its stored image.
#[utoipa::path(
    delete,
    path = "/questions/deleteQuestion/{questionId}",
    params(("questionId" = Uuid, Path, description = "Question to delete")),
    responses(
        (status = 200, description = "Question deleted", body = MessageResponse),
        (status = 404, description = "Question not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn delete_question(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state
        .repo
        .delete_question(question_id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if has_real_image(&deleted.image_link) {
        let link = deleted.image_link.unwrap_or_default();
        if let Err(e) = state.storage.delete(&link).await {
            tracing::warn!(question_id = %question_id, "image cleanup failed: {e}");
        }
    }

    tracing::info!(question_id = %question_id, user_id = %auth.user_id, "question deleted");
    Ok(Json(MessageResponse::of(
        "Question and associated image deleted successfully.",
    )))
}

/// Fetches one question with its author. Readable by any signed-in user.
#[utoipa::path(
    get,
    path = "/questions/getQuestion/{questionId}",
    params(("questionId" = Uuid, Path, description = "Question to fetch")),
    responses(
        (status = 200, description = "The question", body = QuestionResponse),
        (status = 404, description = "Question not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn get_question(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = state
        .repo
        .get_question(question_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Question not found.".to_string()))?;

    Ok(Json(QuestionResponse { question }))
}

/// Lists the caller's own questions.
#[utoipa::path(
    get,
    path = "/questions/getQuestionByUser",
    responses(
        (status = 200, description = "The caller's questions", body = QuestionsResponse),
        (status = 404, description = "No questions found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn questions_by_user(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let questions = state.repo.questions_by_user(auth.user_id).await?;

    if questions.is_empty() {
        return Err(ApiError::NotFound(format!(
            "No questions found uploaded by {}",
            auth.username
        )));
    }

    Ok(Json(QuestionsResponse { questions }))
}

/// Lists every question, newest first.
#[utoipa::path(
    get,
    path = "/questions/getAllQuestion",
    responses(
        (status = 200, description = "All questions", body = QuestionsResponse),
        (status = 404, description = "No questions found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn all_questions(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let questions = state.repo.all_questions().await?;

    if questions.is_empty() {
        return Err(ApiError::NotFound("No questions found.".to_string()));
    }

    Ok(Json(QuestionsResponse { questions }))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TagParams {
    pub tag: Option<String>,
}

/// Lists questions carrying an exact tag.
#[utoipa::path(
    get,
    path = "/questions/getQuestionByTag",
    params(TagParams),
    responses(
        (status = 200, description = "Matching questions", body = QuestionsResponse),
        (status = 404, description = "No questions for this tag", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn questions_by_tag(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TagParams>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let tag = non_empty(&params.tag)
        .ok_or_else(|| ApiError::Validation(vec!["Tag is required.".to_string()]))?;

    let questions = state.repo.questions_by_tag(&tag).await?;

    if questions.is_empty() {
        return Err(ApiError::NotFound(
            "No questions found for this tag.".to_string(),
        ));
    }

    Ok(Json(QuestionsResponse { questions }))
}

/// Lists every distinct tag in use.
#[utoipa::path(
    get,
    path = "/questions/getAllTags",
    responses(
        (status = 200, description = "All tags", body = TagsResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "questions"
)]
pub async fn all_tags(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<TagsResponse>, ApiError> {
    let tags = state.repo.all_tags().await?;
    Ok(Json(TagsResponse { tags }))
}

/// Serves a stored question image. Public: image links are unguessable and
/// embedded in pages that already required a token to obtain.
#[utoipa::path(
    get,
    path = "/questions/getImage/{imageLink}",
    params(("imageLink" = String, Path, description = "Stored image link")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "File not found", body = crate::errors::ErrorResponse),
    ),
    tag = "questions"
)]
pub async fn get_image(
    State(state): State<AppState>,
    Path(image_link): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.storage.read(&image_link).await.map_err(|e| {
        tracing::debug!(%image_link, "image read failed: {e}");
        ApiError::NotFound("File not found".to_string())
    })?;

    let content_type = if image_link.ends_with(".jpg") || image_link.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "image/png"
    };

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
