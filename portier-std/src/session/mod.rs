//! # Session Continuity
//!
//! Carries the HTTP session over to the upgraded connection: the session
//! token is read from the handshake's cookies, resolved once against a
//! [`SessionStore`], and the resulting [`Session`] stays attached to the
//! connection for its whole lifetime.
//!
//! The store is a capability, so the backend (in-process map, Redis, a
//! database) can be swapped without touching the pipeline.

mod carrier;
mod memory;

pub use carrier::{DEFAULT_COOKIE_NAME, SessionCarrier, cookie_value};
pub use memory::MemorySessionStore;

use portier_core::{BoxError, Session, SessionToken};
use std::{future::Future, pin::Pin};

/// Read-only session lookup.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `SessionStore`",
    label = "missing `SessionStore` implementation",
    note = "Session stores must implement `lookup`."
)]
pub trait SessionStore: Send + Sync + 'static {
    /// Resolve a token. `Ok(None)` means the token is unknown or expired.
    fn lookup(
        &self,
        token: &SessionToken,
    ) -> impl Future<Output = Result<Option<Session>, BoxError>> + Send;
}

/// Dynamic object-safe version of [`SessionStore`].
pub trait DynSessionStore: Send + Sync + 'static {
    /// Resolve a token (dynamic dispatch version).
    fn lookup_dyn<'a>(
        &'a self,
        token: &'a SessionToken,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Session>, BoxError>> + Send + 'a>>;
}

impl<S: SessionStore> DynSessionStore for S {
    fn lookup_dyn<'a>(
        &'a self,
        token: &'a SessionToken,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Session>, BoxError>> + Send + 'a>> {
        Box::pin(self.lookup(token))
    }
}
