/// First-correct-answer arbitration.
pub mod arbitration;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Question bank administration.
pub mod question_service;
/// Round lifecycle: start, advance, resume and player replies.
pub mod round_service;
/// Question store connection supervisor with backoff.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
