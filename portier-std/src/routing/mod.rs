//! # Routing Implementations
//!
//! - [`ProtocolRouter`]: picks a chain by declared scheme (request or upgrade).
//! - [`PathRouter`]: picks an application handler by path pattern.
//!
//! Both are built once at start-up and shared read-only afterwards.

pub mod path;
pub mod protocol;

pub use path::{PathRouter, PathRouterBuilder};
pub use protocol::{ProtocolRouter, ProtocolRouterBuilder};
