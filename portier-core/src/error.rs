//! Error types for Portier.
//!
//! - [`DispatchError`] - Failures while a single connection is being dispatched
//! - [`RouterBuildError`] - Failures while building a routing table at start-up
//!
//! An absent or unresolvable session is deliberately *not* an error: the
//! connection simply continues without one.

use std::time::Duration;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that end the dispatch of one connection.
///
/// Every variant is terminal for its connection and for nothing else. The
/// rejection variants carry no client-supplied header values, so they are
/// safe to log and reveal nothing to an origin-probing client.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The declared scheme is not recognised, or no chain is configured for it.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// An upgrade was attempted from an origin outside the allow-list.
    #[error("upgrade origin rejected")]
    OriginRejected,

    /// No route pattern matched the connection path.
    #[error("no route found for path: {0}")]
    NoRoute(String),

    /// The handshake stages did not finish in time.
    #[error("dispatch timed out after {0:?}")]
    Timeout(Duration),

    /// The underlying connection closed before dispatch completed.
    #[error("connection closed during dispatch")]
    Closed,

    /// The application handler failed.
    #[error("handler error")]
    Handler(#[source] BoxError),
}

impl DispatchError {
    /// Returns `true` for refusals decided by the dispatch core itself.
    ///
    /// Handler failures, timeouts and closes are not refusals.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            DispatchError::UnsupportedProtocol(_)
                | DispatchError::OriginRejected
                | DispatchError::NoRoute(_)
        )
    }
}

impl From<BoxError> for DispatchError {
    fn from(err: BoxError) -> Self {
        DispatchError::Handler(err)
    }
}

/// Errors that can occur while building a routing table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouterBuildError {
    /// The pattern overlaps with an already registered one.
    #[error("conflicting route: {0}")]
    Conflict(String),

    /// The pattern is malformed.
    #[error("invalid route pattern: {0}")]
    InvalidPattern(String),
}
