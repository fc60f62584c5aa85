use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping both backends and report whether the service is fully operational.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let mut question_store_ok = false;
    match state.require_question_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => question_store_ok = true,
            Err(err) => warn!(error = %err, "question store health check failed"),
        },
        Err(_) => warn!("question store unavailable (degraded mode)"),
    }

    let lock_store_ok = match state.lock_store().health_check().await {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "lock store health check failed");
            false
        }
    };

    let players = state.connections().len();
    let rounds = state.round().snapshot().await.generation;
    if question_store_ok && lock_store_ok && !state.is_degraded() {
        HealthResponse::ok(players, rounds)
    } else {
        HealthResponse::degraded(lock_store_ok, players, rounds)
    }
}
