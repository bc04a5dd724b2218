//! In-process session store.

use super::SessionStore;
use portier_core::{BoxError, Session, SessionToken};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// A session store backed by a shared in-memory map.
///
/// Clones share the same map. The pipeline only reads from it; `insert` and
/// `remove` are for whoever owns session creation (a login endpoint, tests).
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionToken, Session>>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a session under its own token, returning the one it replaced.
    pub fn insert(&self, session: Session) -> Option<Session> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(session.token().clone(), session)
    }

    /// Forget a session.
    pub fn remove(&self, token: &SessionToken) -> Option<Session> {
        self.sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(token)
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    async fn lookup(&self, token: &SessionToken) -> Result<Option<Session>, BoxError> {
        Ok(self
            .sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(token)
            .cloned())
    }
}
