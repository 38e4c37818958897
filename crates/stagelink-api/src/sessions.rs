//! One chain per session. Each chain sits behind its own mutex, so a
//! navigation step (read index, propagate, move) is a single critical section.
use chrono::{DateTime, Utc};
use stagelink_core::Chain;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use crate::error::ApiError;

/// Sessions kept before `create` starts refusing new ones
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    chain: Mutex<Chain>,
}

impl Session {
    fn new(chain: Chain) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            chain: Mutex::new(chain),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Chain> {
        self.chain.lock().await
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    pub fn limit(&self) -> usize {
        self.max_sessions
    }

    /// Store a new session, or refuse once the limit is reached
    pub async fn create(&self, chain: Chain) -> Result<Arc<Session>, ApiError> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions {
            return Err(ApiError::SessionLimit(self.max_sessions));
        }
        let session = Arc::new(Session::new(chain));
        sessions.insert(session.id, Arc::clone(&session));
        Ok(session)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Session>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn ids(&self) -> Vec<Uuid> {
        self.sessions.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
