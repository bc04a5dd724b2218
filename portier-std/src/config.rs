//! Start-up configuration.
//!
//! Read once, validated, then turned into immutable values that every
//! connection task shares. The routing table is code, not configuration:
//! handlers are registered on [`GatewayBuilder`](crate::gateway::GatewayBuilder).
//!
//! ```toml
//! allowed_origins = [".example.com", "https://admin.example.com:8443"]
//! match_policy = "exact_or_suffix"
//! debug = false
//! session_cookie = "sessionid"
//! handshake_timeout_ms = 5000
//! ```

use crate::{
    origin::{AllowList, InvalidOrigin, MatchPolicy},
    session::DEFAULT_COOKIE_NAME,
};
use portier_core::RouterBuildError;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Errors raised while loading configuration or building the gateway.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}")]
    Io {
        /// The file that was being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has the wrong shape.
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    /// An allow-list pattern is malformed.
    #[error(transparent)]
    Origin(#[from] InvalidOrigin),

    /// The session cookie name is empty.
    #[error("session cookie name must not be empty")]
    EmptyCookieName,

    /// A route pattern could not be registered.
    #[error(transparent)]
    Routing(#[from] RouterBuildError),
}

/// Process-wide gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Origin patterns permitted to open upgrade connections.
    pub allowed_origins: Vec<String>,
    /// How suffix patterns are matched.
    pub match_policy: MatchPolicy,
    /// Debug mode: an empty allow-list falls back to local hosts.
    pub debug: bool,
    /// Cookie that carries the session token.
    pub session_cookie: String,
    /// Upper bound for the handshake stages, in milliseconds.
    pub handshake_timeout_ms: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            match_policy: MatchPolicy::default(),
            debug: false,
            session_cookie: DEFAULT_COOKIE_NAME.to_owned(),
            handshake_timeout_ms: None,
        }
    }
}

impl GatewayConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_cookie.trim().is_empty() {
            return Err(ConfigError::EmptyCookieName);
        }
        self.allow_list()?;
        Ok(())
    }

    /// Build the allow-list, applying the debug fallback and match policy.
    pub fn allow_list(&self) -> Result<AllowList, ConfigError> {
        Ok(
            AllowList::from_allowed_hosts(&self.allowed_origins, self.debug)?
                .with_policy(self.match_policy),
        )
    }

    /// The handshake time limit, if any.
    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.handshake_timeout_ms.map(Duration::from_millis)
    }
}
