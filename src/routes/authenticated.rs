use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

/// Authenticated Router Module
///
/// Question and answer endpoints for any signed-in user. The bearer-token
/// gate is layered on in `create_router`; handlers here receive a verified
/// `AuthUser` and enforce ownership through the repository's conditional
/// writes, where a miss is reported as 404 — never 403.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // --- Questions ---
        // POST /questions/createQuestion
        // Submits a new question owned by the caller.
        .route(
            "/questions/createQuestion",
            post(handlers::questions::create_question),
        )
        // POST /questions/uploadImage?filename=...
        // Stores raw image bytes and returns the link to reference from
        // question payloads. Only image/png and image/jpeg are accepted.
        .route(
            "/questions/uploadImage",
            post(handlers::questions::upload_image),
        )
        // PATCH/DELETE /questions/...Question/{questionId}
        // Owner-only writes: the repository statement is scoped to the
        // caller's user id, so someone else's question looks absent.
        .route(
            "/questions/updateQuestion/{questionId}",
            patch(handlers::questions::update_question),
        )
        .route(
            "/questions/deleteQuestion/{questionId}",
            delete(handlers::questions::delete_question),
        )
        // GET /questions/getQuestion/{questionId}
        // Single question with its author; readable by any signed-in user.
        .route(
            "/questions/getQuestion/{questionId}",
            get(handlers::questions::get_question),
        )
        // GET /questions/getQuestionByUser
        // The caller's own questions.
        .route(
            "/questions/getQuestionByUser",
            get(handlers::questions::questions_by_user),
        )
        // GET /questions/getAllQuestion
        // Every question, newest first.
        .route(
            "/questions/getAllQuestion",
            get(handlers::questions::all_questions),
        )
        // GET /questions/getQuestionByTag?tag=...
        // Exact-match tag filter.
        .route(
            "/questions/getQuestionByTag",
            get(handlers::questions::questions_by_tag),
        )
        // GET /questions/getAllTags
        // Distinct tags in use.
        .route("/questions/getAllTags", get(handlers::questions::all_tags))
        // --- Answers ---
        // POST /answers/createAnswer/{questionId}
        // Posts an answer; a missing parent question is a 404.
        .route(
            "/answers/createAnswer/{questionId}",
            post(handlers::answers::create_answer),
        )
        // GET /answers/getAnswer/{questionId}
        // All answers on a question, with author identities.
        .route(
            "/answers/getAnswer/{questionId}",
            get(handlers::answers::answers_for_question),
        )
        // PATCH /answers/updateAnswer/{answerId}/{questionId}
        // Owner-only, additionally scoped to the question.
        .route(
            "/answers/updateAnswer/{answerId}/{questionId}",
            patch(handlers::answers::update_answer),
        )
        // DELETE /answers/deleteAnswer/{answerId}
        // Owner-only delete.
        .route(
            "/answers/deleteAnswer/{answerId}",
            delete(handlers::answers::delete_answer),
        )
        // GET /answers/answerByUser/{questionId}
        // The caller's own answers on one question.
        .route(
            "/answers/answerByUser/{questionId}",
            get(handlers::answers::answers_by_user),
        )
}
