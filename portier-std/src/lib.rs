//! # portier-std
//!
//! Standard stages, routers and gateway assembly for the Portier protocol
//! dispatcher.
//!
//! This crate provides:
//! - **Origin validation**: [`origin::AllowList`], [`origin::OriginValidator`]
//! - **Session continuity**: [`session::SessionCarrier`], [`session::SessionStore`]
//! - **Routing**: [`routing::ProtocolRouter`], [`routing::PathRouter`]
//! - **Standard layers**: Tracing, Timeout, Close awareness
//! - **Assembly**: [`gateway::Gateway`] built from [`config::GatewayConfig`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use portier_core;

// Modules
pub mod config;
pub mod gateway;
pub mod layers;
pub mod origin;
pub mod routing;
pub mod session;
pub mod testing;
