//! Trivia race binary entrypoint wiring REST, WebSocket, the question bank and the lock store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_race_back::{
    config::AppConfig,
    dao::{
        lock_store::{InMemoryLockStore, LockStore},
        question_store::InMemoryQuestionStore,
    },
    routes,
    services::round_service,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::load();
    let lock_store = build_lock_store().await?;
    let app_state = AppState::new(config, lock_store);

    install_question_store(&app_state).await;
    round_service::start_round(&app_state).await;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone());

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(app_state.clone()))
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the shared Redis lock store when configured, otherwise keep claims in process memory.
async fn build_lock_store() -> anyhow::Result<Arc<dyn LockStore>> {
    #[cfg(feature = "redis-lock")]
    if let Ok(url) = env::var("REDIS_URL") {
        let store = trivia_race_back::dao::lock_store::redis::RedisLockStore::connect(&url)
            .await
            .context("connecting to Redis lock store")?;
        info!("using Redis lock store");
        return Ok(Arc::new(store));
    }

    let store = InMemoryLockStore::new();
    store.spawn_sweeper();
    info!("using in-memory lock store; claims are not shared between replicas");
    Ok(Arc::new(store))
}

/// Install the MongoDB question store under supervision when configured, or the in-memory bank.
async fn install_question_store(state: &SharedState) {
    #[cfg(feature = "mongo-store")]
    if let Ok(uri) = env::var("MONGO_URI") {
        use trivia_race_back::{
            dao::{
                question_store::{
                    QuestionStore,
                    mongodb::{MongoConfig, MongoQuestionStore},
                },
                storage::StorageError,
            },
            services::storage_supervisor,
        };

        let db_name = env::var("MONGO_DB").ok();
        let app_config = state.config();
        info!("using MongoDB question store");
        tokio::spawn(storage_supervisor::run(state.clone(), move || {
            let uri = uri.clone();
            let db_name = db_name.clone();
            let app_config = app_config.clone();
            async move {
                let config =
                    MongoConfig::resolve(&uri, db_name.as_deref(), &app_config).await?;
                let store = MongoQuestionStore::connect(config).await?;
                Ok::<_, StorageError>(Arc::new(store) as Arc<dyn QuestionStore>)
            }
        }));
        return;
    }

    let seeds = state.config().seed_questions().to_vec();
    if seeds.is_empty() {
        warn!("in-memory question bank starts empty; add questions through the API");
    }
    let store = InMemoryQuestionStore::seeded(seeds);
    info!(questions = store.len().await, "using in-memory question store");
    state.install_question_store(Arc::new(store)).await;
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM, then close every player socket so the server can drain.
async fn shutdown_signal(state: SharedState) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown requested");
    round_service::shutdown(&state);
}
