//! # Endpoint Layer
//!
//! The kernel of the dispatcher. An endpoint takes ownership of a value
//! (normally a [`Connection`]) and either hands it off or fails with a
//! [`DispatchError`].
//!
//! Every higher abstraction ends up here: a [`Pipeline`] of stages is an
//! endpoint, the protocol and path routers are endpoints, and the tracing,
//! timeout and close wrappers in `portier-std` wrap endpoints.
//!
//! # Static vs Dynamic Dispatch
//!
//! [`Endpoint`] uses native `async fn` for zero-cost static dispatch. Routing
//! tables that mix different chains store [`BoxEndpoint`] instead.
//!
//! [`Connection`]: crate::Connection
//! [`Pipeline`]: crate::Pipeline

use crate::{error::DispatchError, handler::Handler, message::Message, response::IntoOutcome};
use std::{future::Future, pin::Pin, sync::Arc};

/// Takes ownership of an input and finishes its dispatch.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Endpoint<{In}>`",
    label = "missing `Endpoint` implementation",
    note = "Endpoints must implement `dispatch` for the input type `{In}`."
)]
pub trait Endpoint<In: Message>: Send + Sync + 'static {
    /// Dispatch the input.
    fn dispatch(&self, input: In) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// Dynamic object-safe version of [`Endpoint`].
pub trait DynEndpoint<In: Message>: Send + Sync + 'static {
    /// Dispatch the input (dynamic dispatch version).
    fn dispatch_dyn<'a>(
        &'a self,
        input: In,
    ) -> Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + 'a>>;
}

// Blanket implementation: Any type implementing Endpoint implements DynEndpoint automatically.
impl<In: Message, T: Endpoint<In>> DynEndpoint<In> for T {
    fn dispatch_dyn<'a>(
        &'a self,
        input: In,
    ) -> Pin<Box<dyn Future<Output = Result<(), DispatchError>> + Send + 'a>> {
        Box::pin(self.dispatch(input))
    }
}

/// A boxed, type-erased endpoint.
pub type BoxEndpoint<In> = Box<dyn DynEndpoint<In>>;

// Allow Box<dyn DynEndpoint> to be used where Endpoint is expected.
// Dispatch goes through the trait object; `self.dispatch_dyn` would resolve
// to the blanket impl for the box itself and recurse.
impl<In: Message> Endpoint<In> for Box<dyn DynEndpoint<In>> {
    async fn dispatch(&self, input: In) -> Result<(), DispatchError> {
        (**self).dispatch_dyn(input).await
    }
}

impl<In: Message> Endpoint<In> for Arc<dyn DynEndpoint<In>> {
    async fn dispatch(&self, input: In) -> Result<(), DispatchError> {
        (**self).dispatch_dyn(input).await
    }
}

/// Adapts a [`Handler`] into an [`Endpoint`] with no stages in front of it.
///
/// Plain requests use this: they reach the application untouched.
pub struct Direct<H> {
    handler: H,
}

impl<H> Direct<H> {
    /// Wrap a handler.
    pub const fn new(handler: H) -> Self {
        Self { handler }
    }

    /// The wrapped handler.
    pub fn inner(&self) -> &H {
        &self.handler
    }
}

impl<In, H> Endpoint<In> for Direct<H>
where
    In: Message,
    H: Handler<In>,
{
    async fn dispatch(&self, input: In) -> Result<(), DispatchError> {
        self.handler
            .call(input)
            .await
            .into_outcome()
            .map_err(DispatchError::Handler)
    }
}
