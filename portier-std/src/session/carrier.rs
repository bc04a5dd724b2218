use super::{DynSessionStore, MemorySessionStore, SessionStore};
use portier_core::{Connection, DispatchError, SessionToken, Stage};
use std::sync::Arc;

/// Cookie that carries the session token unless configured otherwise.
pub const DEFAULT_COOKIE_NAME: &str = "sessionid";

/// Extract the value of cookie `name` from one `Cookie` header value.
///
/// Pairs are `;`-separated; surrounding whitespace and double quotes are
/// stripped. Empty values count as absent.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// Stage that attaches the caller's session to the connection.
///
/// This stage never fails on session grounds: a missing cookie, an unknown
/// token or a store error all let the connection through without a session,
/// and handlers decide whether that is fatal for them. A connection that
/// already carries a session keeps it and is not looked up again.
#[derive(Clone)]
pub struct SessionCarrier {
    store: Arc<dyn DynSessionStore>,
    cookie_name: String,
}

impl SessionCarrier {
    /// Resolve sessions from `store` using the default cookie name.
    pub fn new<S: SessionStore>(store: S) -> Self {
        Self::shared(Arc::new(store))
    }

    /// Resolve sessions from a store shared with other components.
    pub fn shared(store: Arc<dyn DynSessionStore>) -> Self {
        Self {
            store,
            cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
        }
    }

    /// Read the token from a different cookie.
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// The cookie the token is read from.
    pub fn cookie(&self) -> &str {
        &self.cookie_name
    }

    fn token(&self, conn: &Connection) -> Option<SessionToken> {
        conn.headers()
            .get_all("cookie")
            .find_map(|header| cookie_value(header, &self.cookie_name))
            .map(SessionToken::new)
    }
}

impl Default for SessionCarrier {
    fn default() -> Self {
        Self::new(MemorySessionStore::new())
    }
}

impl std::fmt::Debug for SessionCarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCarrier")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl Stage<Connection> for SessionCarrier {
    type Output = Connection;

    async fn process(&self, conn: Connection) -> Result<Connection, DispatchError> {
        if conn.is_closed() {
            return Err(DispatchError::Closed);
        }
        if conn.has_session() {
            return Ok(conn);
        }
        let Some(token) = self.token(&conn) else {
            tracing::trace!(conn = %conn.id(), "no session cookie");
            return Ok(conn);
        };

        match self.store.lookup_dyn(&token).await {
            Ok(Some(session)) => Ok(conn.with_session(session)),
            Ok(None) => {
                tracing::debug!(conn = %conn.id(), "session token did not resolve");
                Ok(conn)
            }
            Err(error) => {
                tracing::warn!(conn = %conn.id(), %error, "session store lookup failed");
                Ok(conn)
            }
        }
    }
}
