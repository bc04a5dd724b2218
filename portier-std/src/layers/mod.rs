//! Wrappers that add cross-cutting behaviour around stages and endpoints.

mod close;
mod timeout;
mod tracing;

pub use close::CloseAware;
pub use timeout::TimeoutStage;
pub use self::tracing::Traced;
