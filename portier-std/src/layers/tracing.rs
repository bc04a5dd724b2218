use portier_core::{Connection, DispatchError, Endpoint};
use tracing::Instrument;

/// An endpoint wrapper that runs each connection inside a `tracing` span.
///
/// The span records the connection id, declared scheme and path. Header
/// values are never recorded. Refusals are logged at `debug` and other
/// failures at `warn`.
pub struct Traced<E> {
    inner: E,
    name: &'static str,
}

impl<E> Traced<E> {
    /// Wrap `inner`; `name` identifies the wrapped chain in the span.
    pub const fn new(inner: E, name: &'static str) -> Self {
        Self { inner, name }
    }

    /// The wrapped endpoint.
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Endpoint<Connection>> Endpoint<Connection> for Traced<E> {
    async fn dispatch(&self, conn: Connection) -> Result<(), DispatchError> {
        let span = tracing::info_span!(
            "connection",
            chain = %self.name,
            id = %conn.id(),
            scheme = %conn.declared_scheme(),
            path = %conn.path(),
        );

        async move {
            let result = self.inner.dispatch(conn).await;
            match &result {
                Ok(()) => tracing::debug!("connection handed off"),
                Err(error) if error.is_rejection() => {
                    tracing::debug!(%error, "connection refused")
                }
                Err(error) => tracing::warn!(%error, "connection failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}
