pub mod registry;
pub mod round;

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock, watch};

use crate::{
    config::AppConfig,
    dao::{lock_store::LockStore, question_store::QuestionStore},
    error::ServiceError,
};

pub use self::registry::{ConnectionId, ConnectionRegistry, PlayerConnection};
pub use self::round::{Question, RoundSnapshot, RoundState};

pub type SharedState = Arc<AppState>;

/// Central application state: player connections, the round pointer and backend handles.
///
/// Each instance is an isolated coordinator; nothing here is process-global.
pub struct AppState {
    config: Arc<AppConfig>,
    question_store: RwLock<Option<Arc<dyn QuestionStore>>>,
    lock_store: Arc<dyn LockStore>,
    connections: ConnectionRegistry,
    round: RoundState,
    degraded: watch::Sender<bool>,
    transition_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a question store is installed.
    pub fn new(config: AppConfig, lock_store: Arc<dyn LockStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config: Arc::new(config),
            question_store: RwLock::new(None),
            lock_store,
            connections: ConnectionRegistry::new(),
            round: RoundState::new(),
            degraded: degraded_tx,
            transition_gate: Mutex::new(()),
        })
    }

    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Obtain a handle to the current question store, if one is installed.
    pub async fn question_store(&self) -> Option<Arc<dyn QuestionStore>> {
        let guard = self.question_store.read().await;
        guard.as_ref().cloned()
    }

    /// Like [`Self::question_store`] but reports a missing store as degraded mode.
    pub async fn require_question_store(&self) -> Result<Arc<dyn QuestionStore>, ServiceError> {
        self.question_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new question store implementation and leave degraded mode.
    pub async fn install_question_store(&self, store: Arc<dyn QuestionStore>) {
        {
            let mut guard = self.question_store.write().await;
            *guard = Some(store);
        }
        self.set_degraded(false);
    }

    /// Remove the current question store and enter degraded mode.
    pub async fn clear_question_store(&self) {
        {
            let mut guard = self.question_store.write().await;
            guard.take();
        }
        self.set_degraded(true);
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn set_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    pub fn lock_store(&self) -> Arc<dyn LockStore> {
        self.lock_store.clone()
    }

    /// Registry of active player sockets.
    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Serializes round transitions so only one writer publishes at a time.
    pub async fn transition_gate(&self) -> MutexGuard<'_, ()> {
        self.transition_gate.lock().await
    }
}
