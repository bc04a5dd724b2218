//! # Connection Model
//!
//! A [`Connection`] is the single value that travels through the dispatch
//! pipeline. It is created when a connection is accepted, owned by the
//! pipeline while stages enrich it, and moved into the application handler
//! at hand-off.
//!
//! What a connection carries:
//!
//! - the declared scheme string, classified on demand into a [`Scheme`]
//! - the target path and optional query string
//! - case-insensitive [`Headers`]
//! - an optional [`Session`], attached by the session stage
//! - [`RouteParams`] captured by the path router
//! - a [`CloseSignal`] fired when the underlying transport goes away

use crate::{error::DispatchError, message::Message, session::Session};
use std::{
    fmt,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio_util::sync::CancellationToken;

/// The two kinds of connection the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// A plain request/response exchange.
    Request,
    /// A request that asks to become a persistent WebSocket channel.
    Upgrade,
}

impl Scheme {
    /// Classify a declared scheme string, ignoring ASCII case.
    ///
    /// `http`, `https` and `request` are plain requests; `websocket`, `ws`,
    /// `wss` and `upgrade` are upgrades. Anything else is unrecognised.
    pub fn parse(declared: &str) -> Option<Self> {
        const REQUEST: [&str; 3] = ["http", "https", "request"];
        const UPGRADE: [&str; 4] = ["websocket", "ws", "wss", "upgrade"];

        if REQUEST.iter().any(|s| declared.eq_ignore_ascii_case(s)) {
            Some(Scheme::Request)
        } else if UPGRADE.iter().any(|s| declared.eq_ignore_ascii_case(s)) {
            Some(Scheme::Upgrade)
        } else {
            None
        }
    }

    /// Canonical lowercase name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Scheme::Request => "request",
            Scheme::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scheme::parse(s).ok_or_else(|| DispatchError::UnsupportedProtocol(s.to_owned()))
    }
}

/// Process-unique connection identifier, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Header names whose values are never printed.
const REDACTED: [&str; 4] = ["cookie", "set-cookie", "authorization", "proxy-authorization"];

/// Case-insensitive, multi-valued header mapping.
///
/// Names are stored lowercased. Insertion order is preserved so that
/// repeated headers keep the order the client sent them in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty header mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header value. Existing values for the same name are kept.
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.entries
            .push((name.as_ref().to_ascii_lowercase(), value.into()));
    }

    /// The first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether any value is present for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of header values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no headers at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.entries {
            if REDACTED.contains(&name.as_str()) {
                map.entry(name, &"<redacted>");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// Named parameters captured from the matched path pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: Vec<(String, String)>,
}

impl RouteParams {
    /// Value of the parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(name, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of captured parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

/// Fired when the underlying transport closes.
///
/// Clones share the same signal. The accept loop keeps one clone and calls
/// [`CloseSignal::close`] when the socket goes away; the pipeline watches
/// the other.
#[derive(Debug, Clone)]
pub struct CloseSignal {
    token: CancellationToken,
}

impl CloseSignal {
    /// Create an open signal.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Mark the connection as closed.
    pub fn close(&self) {
        self.token.cancel();
    }

    /// Whether the connection has closed.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the connection has closed.
    pub fn closed(&self) -> impl std::future::Future<Output = ()> + Send + '_ {
        self.token.cancelled()
    }
}

impl Default for CloseSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// One inbound network connection.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    scheme: String,
    path: String,
    query: Option<String>,
    headers: Headers,
    session: Option<Session>,
    params: RouteParams,
    close: CloseSignal,
}

impl Message for Connection {}

impl Connection {
    /// Start building a connection with a declared scheme and target path.
    pub fn builder(scheme: impl Into<String>, path: impl Into<String>) -> ConnectionBuilder {
        ConnectionBuilder {
            scheme: scheme.into(),
            path: path.into(),
            query: None,
            headers: Headers::new(),
            close: None,
        }
    }

    /// Shorthand for a plain `http` request.
    pub fn request(path: impl Into<String>) -> ConnectionBuilder {
        Self::builder("http", path)
    }

    /// Shorthand for a `websocket` upgrade request.
    pub fn upgrade(path: impl Into<String>) -> ConnectionBuilder {
        Self::builder("websocket", path)
    }

    /// Process-unique identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The scheme string exactly as declared by the transport.
    pub fn declared_scheme(&self) -> &str {
        &self.scheme
    }

    /// The classified scheme, or `None` if unrecognised.
    pub fn scheme(&self) -> Option<Scheme> {
        Scheme::parse(&self.scheme)
    }

    /// Target path, including the leading `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// All headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The first value of header `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// The declared `Origin` header.
    pub fn origin(&self) -> Option<&str> {
        self.headers.get("origin")
    }

    /// The session attached by the session stage, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether a session is attached.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Attach a session. An already attached session is kept.
    pub fn with_session(mut self, session: Session) -> Self {
        if self.session.is_none() {
            self.session = Some(session);
        }
        self
    }

    /// Parameters captured by the path router.
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    /// Shorthand for `params().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Replace the captured route parameters.
    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params;
        self
    }

    /// The close signal shared with the transport.
    pub fn close_signal(&self) -> &CloseSignal {
        &self.close
    }

    /// Whether the underlying transport has closed.
    pub fn is_closed(&self) -> bool {
        self.close.is_closed()
    }
}

/// Equality over the observable fields; the close signal is bookkeeping and
/// sessions compare by identity.
impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.scheme == other.scheme
            && self.path == other.path
            && self.query == other.query
            && self.headers == other.headers
            && self.session == other.session
            && self.params == other.params
    }
}

/// Builder for [`Connection`].
#[derive(Debug)]
pub struct ConnectionBuilder {
    scheme: String,
    path: String,
    query: Option<String>,
    headers: Headers,
    close: Option<CloseSignal>,
}

impl ConnectionBuilder {
    /// Set the raw query string.
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Append a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Set the `Origin` header.
    pub fn origin(self, origin: impl Into<String>) -> Self {
        self.header("origin", origin)
    }

    /// Append a `Cookie` header.
    pub fn cookie(self, cookie: impl Into<String>) -> Self {
        self.header("cookie", cookie)
    }

    /// Share a close signal with the transport. A fresh one is used otherwise.
    pub fn close_signal(mut self, signal: CloseSignal) -> Self {
        self.close = Some(signal);
        self
    }

    /// Finish the connection and assign it an identifier.
    pub fn build(self) -> Connection {
        Connection {
            id: ConnectionId::next(),
            scheme: self.scheme,
            path: self.path,
            query: self.query,
            headers: self.headers,
            session: None,
            params: RouteParams::default(),
            close: self.close.unwrap_or_default(),
        }
    }
}
