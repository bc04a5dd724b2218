use portier_core::{Connection, DispatchError, Endpoint};

/// An endpoint wrapper that abandons dispatch once the connection closes.
///
/// The inner future is raced against the connection's close signal. When
/// the signal fires first the inner future is dropped, so whichever stage
/// was in flight stops and no later stage runs.
pub struct CloseAware<E> {
    inner: E,
}

impl<E> CloseAware<E> {
    /// Wrap `inner`.
    pub const fn new(inner: E) -> Self {
        Self { inner }
    }

    /// The wrapped endpoint.
    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Endpoint<Connection>> Endpoint<Connection> for CloseAware<E> {
    async fn dispatch(&self, conn: Connection) -> Result<(), DispatchError> {
        let signal = conn.close_signal().clone();
        if signal.is_closed() {
            return Err(DispatchError::Closed);
        }

        tokio::select! {
            biased;
            _ = signal.closed() => Err(DispatchError::Closed),
            result = self.inner.dispatch(conn) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingHandler;
    use portier_core::{CloseSignal, Direct, Stage};
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        time::Duration,
    };

    /// Closes the transport mid-stage, then waits.
    struct ClosesTransport {
        finished: Arc<AtomicBool>,
    }

    impl Stage<Connection> for ClosesTransport {
        type Output = Connection;

        async fn process(&self, conn: Connection) -> Result<Connection, DispatchError> {
            conn.close_signal().close();
            tokio::time::sleep(Duration::from_secs(5)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(conn)
        }
    }

    #[tokio::test]
    async fn test_close_aborts_in_flight_stage() {
        let finished = Arc::new(AtomicBool::new(false));
        let recorder = RecordingHandler::new();
        let endpoint = CloseAware::new(
            ClosesTransport {
                finished: finished.clone(),
            }
            .handler(recorder.clone()),
        );

        let err = endpoint
            .dispatch(Connection::upgrade("/ws").build())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Closed));
        assert!(!finished.load(Ordering::SeqCst));
        assert_eq!(recorder.count(), 0);
    }

    #[tokio::test]
    async fn test_already_closed_connection_is_not_dispatched() {
        let recorder = RecordingHandler::new();
        let endpoint = CloseAware::new(Direct::new(recorder.clone()));

        let signal = CloseSignal::new();
        signal.close();
        let conn = Connection::request("/").close_signal(signal).build();

        assert!(matches!(
            endpoint.dispatch(conn).await,
            Err(DispatchError::Closed)
        ));
        assert_eq!(recorder.count(), 0);
    }
}
