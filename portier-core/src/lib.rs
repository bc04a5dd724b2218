//! # portier-core
//!
//! Core traits and the connection model for the Portier protocol dispatcher.
//!
//! This crate has minimal dependencies and is meant to be imported by
//! application handlers and storage backends that don't need the full
//! `portier-std` implementation.
//!
//! # Layered Architecture
//!
//! Every inbound connection travels down the same four layers:
//!
//! ## Layer 1: Endpoint ([`Endpoint`])
//!
//! The kernel. An endpoint takes ownership of a [`Connection`] and either
//! hands it off or fails with a [`DispatchError`]. Routers, pipelines and
//! wrappers are all endpoints, so they nest freely.
//!
//! ## Layer 2: Stage ([`Stage`])
//!
//! An ordered transformation step. A stage receives the connection, may
//! enrich it (attach a session, record route parameters) and returns it, or
//! refuses it with a tagged failure. Stages compose with
//! [`Stage::and_then`] and terminate in an endpoint via [`Stage::endpoint`].
//!
//! ## Layer 3: Routing ([`Router`])
//!
//! Lookup tables that pick the next endpoint: by declared scheme, or by
//! path pattern.
//!
//! ## Layer 4: Handler ([`Handler`])
//!
//! The application sink. Handlers receive the enriched connection by value
//! and own it from then on.
//!
//! # Error Types
//!
//! - [`DispatchError`] - per-connection failures, terminal for that connection
//! - [`RouterBuildError`] - routing table construction failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod connection;
mod endpoint;
mod error;
mod handler;
#[cfg(feature = "http")]
mod http_request;
mod message;
mod response;
mod router;
mod session;
mod stage;

// Re-exports
pub use connection::{
    CloseSignal, Connection, ConnectionBuilder, ConnectionId, Headers, RouteParams, Scheme,
};
pub use endpoint::{BoxEndpoint, Direct, DynEndpoint, Endpoint};
pub use error::{BoxError, DispatchError, RouterBuildError};
pub use handler::{BoxHandler, DynHandler, Handler};
pub use message::Message;
pub use response::IntoOutcome;
pub use router::{RouteResult, Router};
pub use session::{Session, SessionToken};
pub use stage::{AndThen, BoxStage, DynStage, Pipeline, Stage};
