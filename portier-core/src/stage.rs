//! # Stage Layer
//!
//! A stage is one step of the ordered dispatch pipeline. It receives the
//! value by ownership and either returns it (possibly enriched) or refuses
//! it with a [`DispatchError`].
//!
//! # Responsibilities
//!
//! 1. **Gatekeeping**: refuse connections early (origin checks).
//! 2. **Enrichment**: attach context (a resolved session).
//! 3. **Ordering**: [`Stage::and_then`] runs stages strictly in sequence; a
//!    failure short-circuits every later stage.
//! 4. **Hand-off**: [`Stage::endpoint`] and [`Stage::handler`] terminate the
//!    chain, producing a [`Pipeline`] that is itself an [`Endpoint`].

use crate::{
    endpoint::{Direct, Endpoint},
    error::DispatchError,
    handler::Handler,
    message::Message,
};
use std::{future::Future, pin::Pin};

/// A transformation step over an owned value.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Stage` for `{In}`",
    label = "missing `Stage` implementation",
    note = "Stages must implement the `process` method to transform `{In}`."
)]
pub trait Stage<In: Message>: Send + Sync + 'static {
    /// The value handed to the next stage.
    type Output: Message;

    /// Run the stage.
    fn process(&self, input: In)
    -> impl Future<Output = Result<Self::Output, DispatchError>> + Send;

    /// Runs `next` after this stage, only if this stage succeeded.
    fn and_then<Next>(self, next: Next) -> AndThen<Self, Next>
    where
        Self: Sized,
        Next: Stage<Self::Output>,
    {
        AndThen {
            first: self,
            second: next,
        }
    }

    /// Terminates the chain in an endpoint.
    fn endpoint<E>(self, endpoint: E) -> Pipeline<Self, E>
    where
        Self: Sized,
        E: Endpoint<Self::Output>,
    {
        Pipeline {
            stage: self,
            endpoint,
        }
    }

    /// Terminates the chain in an application handler.
    fn handler<H>(self, handler: H) -> Pipeline<Self, Direct<H>>
    where
        Self: Sized,
        H: Handler<Self::Output>,
    {
        self.endpoint(Direct::new(handler))
    }

    /// Boxes the stage.
    fn boxed(self) -> BoxStage<In, Self::Output>
    where
        Self: Sized,
    {
        BoxStage::new(self)
    }
}

/// Two stages run in sequence.
pub struct AndThen<A, B> {
    first: A,
    second: B,
}

impl<A, B> AndThen<A, B> {
    /// The stage that runs first.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The stage that runs second.
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A, B, In> Stage<In> for AndThen<A, B>
where
    In: Message,
    A: Stage<In>,
    B: Stage<A::Output>,
{
    type Output = B::Output;

    async fn process(&self, input: In) -> Result<Self::Output, DispatchError> {
        let intermediate = self.first.process(input).await?;
        self.second.process(intermediate).await
    }
}

/// A stage chain terminated by an endpoint.
pub struct Pipeline<S, E> {
    stage: S,
    endpoint: E,
}

impl<S, E> Pipeline<S, E> {
    /// The stage chain in front of the endpoint.
    pub fn stage(&self) -> &S {
        &self.stage
    }

    /// The terminal endpoint.
    pub fn terminal(&self) -> &E {
        &self.endpoint
    }
}

impl<S, E, In> Endpoint<In> for Pipeline<S, E>
where
    In: Message,
    S: Stage<In>,
    E: Endpoint<S::Output>,
{
    async fn dispatch(&self, input: In) -> Result<(), DispatchError> {
        // Phase 1: stages (refuse or enrich)
        let enriched = self.stage.process(input).await?;
        // Phase 2: hand off ownership
        self.endpoint.dispatch(enriched).await
    }
}

/// Dynamic object-safe version of [`Stage`].
pub trait DynStage<In>: Send + Sync + 'static {
    /// The value handed to the next stage.
    type Output: Message;

    /// Run the stage (dynamic dispatch version).
    fn process_dyn<'a>(
        &'a self,
        input: In,
    ) -> Pin<Box<dyn Future<Output = Result<Self::Output, DispatchError>> + Send + 'a>>;
}

impl<S, In> DynStage<In> for S
where
    S: Stage<In>,
    In: Message,
{
    type Output = S::Output;

    fn process_dyn<'a>(
        &'a self,
        input: In,
    ) -> Pin<Box<dyn Future<Output = Result<Self::Output, DispatchError>> + Send + 'a>> {
        Box::pin(self.process(input))
    }
}

/// A boxed stage, for chains whose shape is decided at start-up.
pub struct BoxStage<In, Out> {
    inner: Box<dyn DynStage<In, Output = Out>>,
}

impl<In, Out> BoxStage<In, Out>
where
    In: Message,
    Out: Message,
{
    /// Box a stage.
    pub fn new<S>(stage: S) -> Self
    where
        S: Stage<In, Output = Out>,
    {
        Self {
            inner: Box::new(stage),
        }
    }
}

impl<In, Out> Stage<In> for BoxStage<In, Out>
where
    In: Message,
    Out: Message,
{
    type Output = Out;

    async fn process(&self, input: In) -> Result<Self::Output, DispatchError> {
        self.inner.process_dyn(input).await
    }
}
