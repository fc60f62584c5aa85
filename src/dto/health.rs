use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether the shared lock store answered its ping.
    pub lock_store: bool,
    /// Number of players currently connected.
    pub players: usize,
    /// Rounds opened or closed since startup.
    pub rounds_published: u64,
}

impl HealthResponse {
    /// Both backends reachable.
    pub fn ok(players: usize, rounds_published: u64) -> Self {
        Self {
            status: "ok".to_string(),
            lock_store: true,
            players,
            rounds_published,
        }
    }

    /// At least one backend is missing or failing.
    pub fn degraded(lock_store: bool, players: usize, rounds_published: u64) -> Self {
        Self {
            status: "degraded".to_string(),
            lock_store,
            players,
            rounds_published,
        }
    }
}
