//! Testing utilities for Portier.
//!
//! - [`RecordingHandler`]: a handler that keeps every connection it receives
//! - [`CountingSessionStore`]: an in-memory store that counts lookups

use crate::session::{MemorySessionStore, SessionStore};
use portier_core::{BoxError, Connection, Handler, Session, SessionToken};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Recording Handler
// ============================================================================

/// A handler that records every connection handed to it.
///
/// # Example
///
/// ```rust,ignore
/// let recorder = RecordingHandler::new();
/// let gateway = Gateway::builder(&config)?
///     .request_handler(recorder.clone())
///     .build();
///
/// gateway.serve(conn).await?;
/// assert_eq!(recorder.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    connections: Arc<Mutex<Vec<Connection>>>,
}

impl RecordingHandler {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every connection received so far.
    pub fn connections(&self) -> Vec<Connection> {
        self.connections.lock().unwrap().clone()
    }

    /// The most recent connection, if any.
    pub fn last(&self) -> Option<Connection> {
        self.connections.lock().unwrap().last().cloned()
    }

    /// Number of connections received.
    pub fn count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }
}

impl Handler<Connection> for RecordingHandler {
    type Output = ();

    async fn call(&self, conn: Connection) {
        self.connections.lock().unwrap().push(conn);
    }
}

// ============================================================================
// Counting Session Store
// ============================================================================

/// An in-memory session store that counts how often it is consulted.
#[derive(Debug, Clone, Default)]
pub struct CountingSessionStore {
    inner: MemorySessionStore,
    lookups: Arc<AtomicUsize>,
}

impl CountingSessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh session for `token` and return it.
    pub fn create(&self, token: &str) -> Session {
        let session = Session::new(SessionToken::new(token));
        self.inner.insert(session.clone());
        session
    }

    /// Store a prepared session.
    pub fn insert(&self, session: Session) {
        self.inner.insert(session);
    }

    /// Number of lookups performed.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl SessionStore for CountingSessionStore {
    async fn lookup(&self, token: &SessionToken) -> Result<Option<Session>, BoxError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(token).await
    }
}
