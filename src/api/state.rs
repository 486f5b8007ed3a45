use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{InteractionSink, MemorySink, TrackerState};

/// Tracker of one session; requests against the same session are serialized
pub type SessionHandle = Arc<Mutex<TrackerState>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub sink: Arc<dyn InteractionSink>,
    pub config: Arc<Config>,
}

/// Inner state that can be modified
#[derive(Default)]
pub struct AppStateInner {
    pub sessions: HashMap<Uuid, SessionHandle>,
}

impl AppState {
    /// Creates application state with no sessions
    pub fn new(sink: Arc<dyn InteractionSink>, config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(AppStateInner::default())),
            sink,
            config: Arc::new(config),
        }
    }

    /// State backed by an in-memory sink and default configuration
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySink::new()), Config::default())
    }

    pub async fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .insert(id, Arc::new(Mutex::new(TrackerState::new())));
        tracing::info!(session_id = %id, sessions = inner.sessions.len(), "Created session");
        id
    }

    pub async fn session(&self, id: Uuid) -> AppResult<SessionHandle> {
        let inner = self.inner.read().await;
        inner
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
    }

    pub async fn remove_session(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .remove(&id)
            .map(|_| tracing::info!(session_id = %id, "Removed session"))
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
    }
}
