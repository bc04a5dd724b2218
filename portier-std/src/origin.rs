//! # Origin Validation
//!
//! Refuses WebSocket upgrades whose declared `Origin` is not on the
//! allow-list, before any session lookup or application code runs.
//!
//! # Pattern Syntax
//!
//! | pattern | matches |
//! |---------|---------|
//! | `*` | any origin that carries a host |
//! | `example.com` | exactly `example.com` |
//! | `.example.com`, `*.example.com` | `example.com` and every subdomain |
//! | `https://example.com:8443` | that host, only over `https` on port 8443 |
//!
//! Hosts compare case-insensitively. Whether suffix patterns may match
//! subdomains is governed by [`MatchPolicy`].

use portier_core::{Connection, DispatchError, Scheme, Stage};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};
use thiserror::Error;
use url::Url;

/// Hosts allowed when running in debug mode with an empty allow-list.
pub const DEBUG_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

/// How suffix patterns are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Exact hosts match exactly; suffix patterns also match subdomains.
    #[default]
    ExactOrSuffix,
    /// Every pattern matches its bare host only.
    ExactOnly,
}

/// A malformed allow-list pattern.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid allowed origin pattern: {0:?}")]
pub struct InvalidOrigin(pub String);

/// The host part of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// Exactly this host.
    Exact(String),
    /// This domain and its subdomains.
    Suffix(String),
}

impl HostPattern {
    fn parse(raw: &str) -> Result<Self, InvalidOrigin> {
        let host = normalize_host(raw);
        let (suffix, base) = match host.strip_prefix("*.").or_else(|| host.strip_prefix('.')) {
            Some(base) => (true, base),
            None => (false, host.as_str()),
        };
        if base.is_empty() || base.contains(['*', '/', ' ']) {
            return Err(InvalidOrigin(raw.to_owned()));
        }
        Ok(if suffix {
            HostPattern::Suffix(base.to_owned())
        } else {
            HostPattern::Exact(base.to_owned())
        })
    }

    /// Whether `host` (already normalized) matches under `policy`.
    pub fn matches(&self, host: &str, policy: MatchPolicy) -> bool {
        match self {
            HostPattern::Exact(pattern) => host == pattern,
            HostPattern::Suffix(base) => {
                host == base
                    || (policy == MatchPolicy::ExactOrSuffix
                        && host
                            .strip_suffix(base.as_str())
                            .is_some_and(|rest| rest.ends_with('.')))
            }
        }
    }
}

/// One allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigin {
    /// `*`: any origin with a host.
    Any,
    /// A bare host pattern; scheme and port are not checked.
    Host(HostPattern),
    /// A scheme-qualified pattern; scheme and effective port must also match.
    Qualified {
        /// Lowercased URL scheme.
        scheme: String,
        /// Host pattern.
        host: HostPattern,
        /// Effective port (explicit, or the scheme default).
        port: u16,
    },
}

impl AllowedOrigin {
    /// Whether a parsed origin matches this entry.
    pub fn permits(&self, origin: &ParsedOrigin, policy: MatchPolicy) -> bool {
        match self {
            AllowedOrigin::Any => true,
            AllowedOrigin::Host(host) => host.matches(&origin.host, policy),
            AllowedOrigin::Qualified { scheme, host, port } => {
                *scheme == origin.scheme
                    && Some(*port) == origin.port
                    && host.matches(&origin.host, policy)
            }
        }
    }
}

impl FromStr for AllowedOrigin {
    type Err = InvalidOrigin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let pattern = s.trim().to_ascii_lowercase();
        if pattern.is_empty() {
            return Err(InvalidOrigin(s.to_owned()));
        }
        if pattern == "*" {
            return Ok(AllowedOrigin::Any);
        }

        let Some((scheme, rest)) = pattern.split_once("://") else {
            // Without a scheme the port carries no meaning; only the host is matched.
            let (host, port) = split_host_port(&pattern);
            if port.is_some_and(|port| port.parse::<u16>().is_err()) {
                return Err(InvalidOrigin(s.to_owned()));
            }
            return HostPattern::parse(host).map(AllowedOrigin::Host);
        };

        let authority = rest.trim_end_matches('/');
        let (host, port) = split_host_port(authority);
        let port = match port {
            Some(port) => port.parse().map_err(|_| InvalidOrigin(s.to_owned()))?,
            None => default_port(scheme).ok_or_else(|| InvalidOrigin(s.to_owned()))?,
        };
        Ok(AllowedOrigin::Qualified {
            scheme: scheme.to_owned(),
            host: HostPattern::parse(host)?,
            port,
        })
    }
}

impl fmt::Display for AllowedOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = |h: &HostPattern| match h {
            HostPattern::Exact(h) => h.clone(),
            HostPattern::Suffix(h) => format!(".{h}"),
        };
        match self {
            AllowedOrigin::Any => f.write_str("*"),
            AllowedOrigin::Host(h) => f.write_str(&host(h)),
            AllowedOrigin::Qualified { scheme, host: h, port } => {
                write!(f, "{scheme}://{}:{port}", host(h))
            }
        }
    }
}

/// The parts of an `Origin` header the allow-list looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOrigin {
    /// Lowercased scheme.
    pub scheme: String,
    /// Lowercased host, IPv6 brackets removed.
    pub host: String,
    /// Explicit port, or the scheme default when known.
    pub port: Option<u16>,
}

impl ParsedOrigin {
    /// Parse an `Origin` header value. `null`, relative and host-less values
    /// yield `None`.
    pub fn parse(origin: &str) -> Option<Self> {
        let url = Url::parse(origin.trim()).ok()?;
        let host = url.host_str().filter(|h| !h.is_empty())?;
        Some(Self {
            scheme: url.scheme().to_owned(),
            host: normalize_host(host),
            port: url.port_or_known_default(),
        })
    }
}

/// The configured set of permitted upgrade origins.
///
/// Built once at start-up and shared read-only between all connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    entries: Vec<AllowedOrigin>,
    policy: MatchPolicy,
}

impl AllowList {
    /// An allow-list over parsed entries with the default policy.
    pub fn new(entries: Vec<AllowedOrigin>) -> Self {
        Self {
            entries,
            policy: MatchPolicy::default(),
        }
    }

    /// Parse every pattern.
    pub fn parse<I, S>(patterns: I) -> Result<Self, InvalidOrigin>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = patterns
            .into_iter()
            .map(|p| p.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(entries))
    }

    /// Parse the allowed hosts, falling back to [`DEBUG_HOSTS`] when the list
    /// is empty and `debug` is set.
    pub fn from_allowed_hosts<I, S>(hosts: I, debug: bool) -> Result<Self, InvalidOrigin>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let list = Self::parse(hosts)?;
        if list.is_empty() && debug {
            Self::parse(DEBUG_HOSTS)
        } else {
            Ok(list)
        }
    }

    /// Replace the match policy.
    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The active match policy.
    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// The entries, in configuration order.
    pub fn entries(&self) -> &[AllowedOrigin] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty (and so permits nothing).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the raw `Origin` header value is permitted.
    pub fn permits(&self, origin: &str) -> bool {
        ParsedOrigin::parse(origin).is_some_and(|parsed| self.permits_parsed(&parsed))
    }

    /// Whether an already parsed origin is permitted. Any match permits.
    pub fn permits_parsed(&self, origin: &ParsedOrigin) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.permits(origin, self.policy))
    }
}

/// Stage that refuses upgrades from origins outside the allow-list.
///
/// On success the connection is returned untouched. A missing, malformed or
/// unlisted origin fails with [`DispatchError::OriginRejected`]. Header
/// values are never logged.
#[derive(Debug, Clone)]
pub struct OriginValidator {
    allow_list: Arc<AllowList>,
}

impl OriginValidator {
    /// Validate against the given allow-list.
    pub fn new(allow_list: AllowList) -> Self {
        Self::shared(Arc::new(allow_list))
    }

    /// Validate against an allow-list shared with other components.
    pub fn shared(allow_list: Arc<AllowList>) -> Self {
        Self { allow_list }
    }

    /// The allow-list in use.
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}

impl Stage<Connection> for OriginValidator {
    type Output = Connection;

    async fn process(&self, conn: Connection) -> Result<Connection, DispatchError> {
        if conn.is_closed() {
            return Err(DispatchError::Closed);
        }
        if conn.scheme() != Some(Scheme::Upgrade) {
            return Err(DispatchError::UnsupportedProtocol(
                conn.declared_scheme().to_owned(),
            ));
        }

        match conn.origin().map(|origin| self.allow_list.permits(origin)) {
            Some(true) => Ok(conn),
            Some(false) => {
                tracing::debug!(conn = %conn.id(), "upgrade origin not in allow-list");
                Err(DispatchError::OriginRejected)
            }
            None => {
                tracing::debug!(conn = %conn.id(), "upgrade without origin header");
                Err(DispatchError::OriginRejected)
            }
        }
    }
}

fn normalize_host(host: &str) -> String {
    host.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_end_matches('.')
        .to_ascii_lowercase()
}

fn split_host_port(authority: &str) -> (&str, Option<&str>) {
    if let Some(rest) = authority.strip_prefix('[') {
        // [v6]:port
        return match rest.split_once(']') {
            Some((host, tail)) => (host, tail.strip_prefix(':')),
            None => (authority, None),
        };
    }
    match authority.rsplit_once(':') {
        // bare IPv6 literals have no port
        Some((host, port)) if !host.contains(':') => (host, Some(port)),
        _ => (authority, None),
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" | "ws" => Some(80),
        "https" | "wss" => Some(443),
        _ => None,
    }
}
