//! Session identity carried across the request-to-upgrade transition.

use serde_json::{Map, Value};
use std::{fmt, sync::Arc};

/// Opaque session token as sent by the client.
///
/// The token is a credential, so its `Debug` output is redacted and it has
/// no `Display` impl.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token. Do not log it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

struct SessionInner {
    token: SessionToken,
    data: Map<String, Value>,
}

/// A resolved server-side session.
///
/// Cloning is O(1) and clones share identity, so every part of a connection
/// that reads the session sees the same object the session stage attached.
/// Sessions are read-only here; creating and saving them belongs to the
/// store's owner.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// A session with no stored data.
    pub fn new(token: SessionToken) -> Self {
        Self::with_data(token, Map::new())
    }

    /// A session with stored key/value data.
    pub fn with_data(token: SessionToken, data: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(SessionInner { token, data }),
        }
    }

    /// The token this session was resolved from.
    pub fn token(&self) -> &SessionToken {
        &self.inner.token
    }

    /// A stored value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.data.get(key)
    }

    /// All stored values.
    pub fn data(&self) -> &Map<String, Value> {
        &self.inner.data
    }

    /// Whether `other` is the very same session object (not merely equal data).
    pub fn same_identity(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for Session {}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.inner.token)
            .field("keys", &self.inner.data.len())
            .finish()
    }
}
