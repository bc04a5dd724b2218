//! Time limit for handshake stages.

use portier_core::{DispatchError, Message, Stage};
use std::time::Duration;
use tokio::time::timeout;

/// A stage wrapper that bounds how long the inner stage may take.
///
/// Wrap the handshake stages (origin check, session lookup) with this, not
/// the application handler: an upgraded connection legitimately lives far
/// longer than its handshake.
///
/// Requires a tokio runtime with the time driver enabled.
pub struct TimeoutStage<S> {
    inner: S,
    duration: Duration,
}

impl<S> TimeoutStage<S> {
    /// Bound `inner` by `duration`.
    pub fn new(inner: S, duration: Duration) -> Self {
        Self { inner, duration }
    }

    /// The configured limit.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl<In: Message, S: Stage<In>> Stage<In> for TimeoutStage<S> {
    type Output = S::Output;

    async fn process(&self, input: In) -> Result<Self::Output, DispatchError> {
        match timeout(self.duration, self.inner.process(input)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(self.duration)),
        }
    }
}
