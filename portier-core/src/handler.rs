//! # Handler Layer
//!
//! The application sink. A handler receives the fully enriched connection by
//! value and owns it from then on; nothing in the dispatch core runs after
//! it.
//!
//! # Usage Patterns
//!
//! 1. **Direct closure**: `|conn: Connection| async move { ... }`
//! 2. **Struct implementation**: `impl Handler<Connection> for ChatConsumer`

use crate::{error::BoxError, message::Message, response::IntoOutcome};
use std::{future::Future, pin::Pin, sync::Arc};

/// The terminal endpoint of a dispatch pipeline.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot handle input of type `{In}`",
    label = "missing `Handler<{In}>` implementation",
    note = "Handlers must implement the `call` method for the input type `{In}`."
)]
pub trait Handler<In: Message>: Send + Sync + 'static {
    /// The output type of the handler, usually `()` or a `Result`.
    type Output: IntoOutcome;

    /// Executes the handler logic.
    fn call(&self, input: In) -> impl Future<Output = Self::Output> + Send;
}

// Blanket impl for closures
impl<F, In, Out, Fut> Handler<In> for F
where
    In: Message,
    Out: IntoOutcome,
    F: Fn(In) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Out> + Send,
{
    type Output = Out;

    fn call(&self, input: In) -> impl Future<Output = Self::Output> + Send {
        (self)(input)
    }
}

/// Object-safe version of [`Handler`], used by routing tables.
pub trait DynHandler<In>: Send + Sync + 'static {
    /// Execute the handler and convert its output (dynamic dispatch version).
    fn call_dyn<'a>(
        &'a self,
        input: In,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;
}

// Blanket implementation: Any type implementing Handler implements DynHandler automatically.
impl<In: Message, H: Handler<In>> DynHandler<In> for H {
    fn call_dyn<'a>(
        &'a self,
        input: In,
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>> {
        Box::pin(async move { self.call(input).await.into_outcome() })
    }
}

/// A shared, type-erased handler.
pub type BoxHandler<In> = Arc<dyn DynHandler<In>>;
