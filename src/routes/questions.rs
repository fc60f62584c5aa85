use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::question::{CreateQuestionRequest, QuestionResponse},
    error::AppError,
    services::question_service,
    state::SharedState,
};

#[utoipa::path(
    post,
    path = "/add_question",
    tag = "questions",
    request_body = CreateQuestionRequest,
    responses(
        (status = 200, description = "Question stored", body = QuestionResponse),
        (status = 503, description = "Question store unavailable")
    )
)]
/// Add a single question to the bank.
pub async fn add_question(
    State(state): State<SharedState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<Json<QuestionResponse>, AppError> {
    let stored = question_service::add_question(&state, payload).await?;
    Ok(Json(stored))
}

#[utoipa::path(
    post,
    path = "/upload_questions",
    tag = "questions",
    request_body = Vec<CreateQuestionRequest>,
    responses(
        (status = 200, description = "Questions stored", body = [QuestionResponse]),
        (status = 503, description = "Question store unavailable")
    )
)]
/// Add a batch of questions to the bank.
pub async fn upload_questions(
    State(state): State<SharedState>,
    Json(payload): Json<Vec<CreateQuestionRequest>>,
) -> Result<Json<Vec<QuestionResponse>>, AppError> {
    let stored = question_service::upload_questions(&state, payload).await?;
    Ok(Json(stored))
}

#[utoipa::path(
    get,
    path = "/current_question",
    tag = "questions",
    responses(
        (status = 200, description = "Question currently open for answers", body = QuestionResponse)
    )
)]
/// Return the question currently open, or a placeholder with id 0.
pub async fn current_question(State(state): State<SharedState>) -> Json<QuestionResponse> {
    Json(question_service::current_question(&state).await)
}

/// Configure the question administration routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/add_question", post(add_question))
        .route("/upload_questions", post(upload_questions))
        .route("/current_question", get(current_question))
}
