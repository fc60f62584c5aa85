use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the trivia round server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::questions::add_question,
        crate::routes::questions::upload_questions,
        crate::routes::questions::current_question,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::question::CreateQuestionRequest,
            crate::dto::question::QuestionResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "questions", description = "Question bank administration"),
        (name = "players", description = "WebSocket quiz sessions"),
    )
)]
pub struct ApiDoc;
