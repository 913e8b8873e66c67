use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    errors::{ApiError, MessageResponse},
    models::{Answer, AnswerWithAuthor, CreateAnswerRequest, UpdateAnswerRequest},
    repository::{AnswerChanges, NewAnswer},
};

fn non_empty(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Posts an answer to a question. Answering a nonexistent question is a 404.
#[utoipa::path(
    post,
    path = "/answers/createAnswer/{questionId}",
    params(("questionId" = Uuid, Path, description = "Question being answered")),
    request_body = CreateAnswerRequest,
    responses(
        (status = 201, description = "Answer created", body = MessageResponse),
        (status = 404, description = "Question not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "answers"
)]
pub async fn create_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Json(payload): Json<CreateAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let answer = NewAnswer {
        user_id: auth.user_id,
        question_id,
        answer: payload.answer.unwrap_or_default().trim().to_string(),
        url: non_empty(&payload.url),
    };

    let created = state.repo.create_answer(answer).await?;
    tracing::info!(answer_id = %created.answer_id, %question_id, "answer created");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::of("Answer created successfully")),
    ))
}

/// Lists every answer on a question, with author identities, oldest first.
#[utoipa::path(
    get,
    path = "/answers/getAnswer/{questionId}",
    params(("questionId" = Uuid, Path, description = "Question whose answers to list")),
    responses(
        (status = 200, description = "The answers", body = [AnswerWithAuthor]),
    ),
    security(("bearer_auth" = [])),
    tag = "answers"
)]
pub async fn answers_for_question(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<Json<Vec<AnswerWithAuthor>>, ApiError> {
    let answers = state.repo.answers_for_question(question_id).await?;
    Ok(Json(answers))
}

/// Updates an answer the caller owns on the given question. Someone else's
/// answer is reported as absent.
#[utoipa::path(
    patch,
    path = "/answers/updateAnswer/{answerId}/{questionId}",
    params(
        ("answerId" = Uuid, Path, description = "Answer to update"),
        ("questionId" = Uuid, Path, description = "Question the answer belongs to"),
    ),
    request_body = UpdateAnswerRequest,
    responses(
        (status = 200, description = "The updated answer", body = Answer),
        (status = 404, description = "Answer not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "answers"
)]
pub async fn update_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((answer_id, question_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateAnswerRequest>,
) -> Result<Json<Answer>, ApiError> {
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let changes = AnswerChanges {
        answer: non_empty(&payload.answer),
        url: non_empty(&payload.url),
    };

    let updated = state
        .repo
        .update_answer(answer_id, question_id, auth.user_id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Answer not found".to_string()))?;

    Ok(Json(updated))
}

/// Deletes an answer the caller owns.
#[utoipa::path(
    delete,
    path = "/answers/deleteAnswer/{answerId}",
    params(("answerId" = Uuid, Path, description = "Answer to delete")),
    responses(
        (status = 200, description = "Answer deleted", body = MessageResponse),
        (status = 404, description = "Answer not found", body = crate::errors::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "answers"
)]
pub async fn delete_answer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(answer_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.repo.delete_answer(answer_id, auth.user_id).await? {
        return Err(ApiError::NotFound("Answer not found".to_string()));
    }

    tracing::info!(%answer_id, user_id = %auth.user_id, "answer deleted");
    Ok(Json(MessageResponse::of("Answer deleted successfully")))
}

/// Lists the caller's own answers on one question.
#[utoipa::path(
    get,
    path = "/answers/answerByUser/{questionId}",
    params(("questionId" = Uuid, Path, description = "Question whose answers to list")),
    responses(
        (status = 200, description = "The caller's answers", body = [Answer]),
    ),
    security(("bearer_auth" = [])),
    tag = "answers"
)]
pub async fn answers_by_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<Json<Vec<Answer>>, ApiError> {
    let answers = state.repo.answers_by_user(question_id, auth.user_id).await?;
    Ok(Json(answers))
}
