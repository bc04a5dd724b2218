//! # portier - Protocol Dispatch Front Door
//!
//! `portier` sits between a server's transport and its application code.
//! Every inbound connection is routed by its declared scheme: plain requests
//! go straight to the application, while upgrade requests must first pass
//! an origin allow-list and have their HTTP session carried over before a
//! path router hands them to a handler.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use portier::prelude::*;
//!
//! let config = GatewayConfig::from_toml_str(r#"allowed_origins = [".example.com"]"#)?;
//! let gateway = Gateway::builder(&config)?
//!     .request_handler(|conn: Connection| async move { /* plain app */ })
//!     .route("/ws/chat/{room}", ChatConsumer::default())?
//!     .build();
//!
//! // one task per connection
//! gateway.spawn(Connection::from_http_request(&request));
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use portier_core::{
    // Stage combinators
    AndThen,
    // Error types
    BoxError,
    BoxEndpoint,
    // Handler
    BoxHandler,
    BoxStage,
    // Connection model
    CloseSignal,
    Connection,
    ConnectionBuilder,
    ConnectionId,
    Direct,
    DispatchError,
    DynEndpoint,
    DynHandler,
    DynStage,
    // Endpoint
    Endpoint,
    Handler,
    Headers,
    // Response
    IntoOutcome,
    // Message
    Message,
    Pipeline,
    RouteParams,
    // Router trait
    RouteResult,
    Router,
    RouterBuildError,
    Scheme,
    // Session
    Session,
    SessionToken,
    // Stage
    Stage,
};

// Assembly
pub use portier_std::{
    config::{ConfigError, GatewayConfig},
    gateway::{Gateway, GatewayBuilder},
};

/// Origin allow-list and the upgrade origin check.
pub mod origin {
    pub use portier_std::origin::{
        AllowList, AllowedOrigin, DEBUG_HOSTS, HostPattern, InvalidOrigin, MatchPolicy,
        OriginValidator, ParsedOrigin,
    };
}

/// Session stores and the session carry-over stage.
pub mod session {
    pub use portier_std::session::{
        DEFAULT_COOKIE_NAME, DynSessionStore, MemorySessionStore, SessionCarrier, SessionStore,
        cookie_value,
    };
}

/// Scheme and path routers.
pub mod routing {
    pub use portier_std::routing::{
        PathRouter, PathRouterBuilder, ProtocolRouter, ProtocolRouterBuilder,
    };
}

/// Standard wrappers for stages and endpoints.
pub mod layers {
    pub use portier_std::layers::{CloseAware, TimeoutStage, Traced};
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use portier_std::testing::*;
}

/// Prelude module - common imports for Portier.
///
/// # Usage
///
/// ```rust,ignore
/// use portier::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Errors
        BoxError,
        ConfigError,
        // Connection model
        Connection,
        DispatchError,
        // Core traits
        Endpoint,
        // Assembly
        Gateway,
        GatewayConfig,
        Handler,
        Scheme,
        Session,
        Stage,
        session::SessionStore,
    };
}
