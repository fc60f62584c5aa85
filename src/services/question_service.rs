use tracing::info;

use crate::{
    dao::models::NewQuestionEntity,
    dto::question::{CreateQuestionRequest, QuestionResponse},
    error::ServiceError,
    services::round_service,
    state::SharedState,
};

/// Store a single question and open a round if the game was idle.
pub async fn add_question(
    state: &SharedState,
    request: CreateQuestionRequest,
) -> Result<QuestionResponse, ServiceError> {
    let store = state.require_question_store().await?;
    let stored = store
        .insert_question(NewQuestionEntity::from(request))
        .await?;
    info!(question = stored.id, "question added");

    round_service::resume_if_idle(state).await;
    Ok(stored.into())
}

/// Store a batch of questions and open a round if the game was idle.
pub async fn upload_questions(
    state: &SharedState,
    requests: Vec<CreateQuestionRequest>,
) -> Result<Vec<QuestionResponse>, ServiceError> {
    let store = state.require_question_store().await?;
    let stored = store
        .insert_questions(requests.into_iter().map(Into::into).collect())
        .await?;
    info!(count = stored.len(), "questions uploaded");

    round_service::resume_if_idle(state).await;
    Ok(stored.into_iter().map(Into::into).collect())
}

/// Question currently open for answers, or the "no active question" placeholder.
pub async fn current_question(state: &SharedState) -> QuestionResponse {
    state
        .round()
        .current()
        .await
        .map(QuestionResponse::from)
        .unwrap_or_else(QuestionResponse::no_active_question)
}
