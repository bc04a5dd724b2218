//! # Gateway Assembly
//!
//! Wires the standard chains together from a [`GatewayConfig`]:
//!
//! ```text
//! Connection ─► Traced ─► CloseAware ─► ProtocolRouter
//!                                         ├─ request ─► application handler
//!                                         └─ upgrade ─► OriginValidator
//!                                                        ─► SessionCarrier
//!                                                        ─► PathRouter ─► handler
//! ```
//!
//! The optional handshake timeout bounds the origin and session stages
//! only. Once a handler owns the connection it may run for as long as the
//! connection lives.

use crate::{
    config::{ConfigError, GatewayConfig},
    layers::{CloseAware, TimeoutStage, Traced},
    origin::{AllowList, OriginValidator},
    routing::{PathRouterBuilder, ProtocolRouter, ProtocolRouterBuilder},
    session::{DynSessionStore, MemorySessionStore, SessionCarrier, SessionStore},
};
use portier_core::{BoxStage, Connection, Direct, DispatchError, Endpoint, Handler, Stage};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;

type Chain = Traced<CloseAware<ProtocolRouter>>;

/// The assembled dispatcher.
///
/// Cheap to clone; every clone shares the same immutable chains, so one
/// gateway can serve any number of concurrent connections.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<Chain>,
}

impl Gateway {
    /// Start assembling a gateway from validated configuration.
    pub fn builder(config: &GatewayConfig) -> Result<GatewayBuilder, ConfigError> {
        GatewayBuilder::new(config)
    }

    /// Dispatch one connection to completion.
    ///
    /// Every failure is terminal for the connection, so its close signal
    /// fires before the error is returned. Transports watching a clone of
    /// the signal tear the socket down without inspecting the error.
    pub async fn serve(&self, conn: Connection) -> Result<(), DispatchError> {
        let signal = conn.close_signal().clone();
        let result = self.inner.dispatch(conn).await;
        if result.is_err() {
            signal.close();
        }
        result
    }

    /// Dispatch one connection on its own task.
    pub fn spawn(&self, conn: Connection) -> JoinHandle<Result<(), DispatchError>> {
        let gateway = self.clone();
        tokio::spawn(async move { gateway.serve(conn).await })
    }

    /// The protocol router at the root of the chain.
    pub fn protocol_router(&self) -> &ProtocolRouter {
        self.inner.inner().inner()
    }
}

impl Endpoint<Connection> for Gateway {
    async fn dispatch(&self, conn: Connection) -> Result<(), DispatchError> {
        self.serve(conn).await
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}

/// Builder for [`Gateway`].
pub struct GatewayBuilder {
    allow_list: AllowList,
    cookie_name: String,
    handshake_timeout: Option<Duration>,
    store: Arc<dyn DynSessionStore>,
    protocols: ProtocolRouterBuilder,
    paths: PathRouterBuilder,
}

impl GatewayBuilder {
    /// A builder with no handlers and an empty in-memory session store.
    pub fn new(config: &GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            allow_list: config.allow_list()?,
            cookie_name: config.session_cookie.clone(),
            handshake_timeout: config.handshake_timeout(),
            store: Arc::new(MemorySessionStore::new()),
            protocols: ProtocolRouter::builder(),
            paths: PathRouterBuilder::default(),
        })
    }

    /// The application that receives plain requests.
    ///
    /// Without one, plain requests fail with `UnsupportedProtocol`.
    pub fn request_handler<H: Handler<Connection>>(mut self, handler: H) -> Self {
        self.protocols = self.protocols.request(Direct::new(handler));
        self
    }

    /// Resolve sessions from `store`.
    pub fn session_store<S: SessionStore>(self, store: S) -> Self {
        self.shared_session_store(Arc::new(store))
    }

    /// Resolve sessions from a store shared with the rest of the process.
    pub fn shared_session_store(mut self, store: Arc<dyn DynSessionStore>) -> Self {
        self.store = store;
        self
    }

    /// Register an upgrade handler for a path pattern.
    pub fn route<H: Handler<Connection>>(
        mut self,
        pattern: &str,
        handler: H,
    ) -> Result<Self, ConfigError> {
        self.paths.insert(pattern, Arc::new(handler))?;
        Ok(self)
    }

    /// Freeze everything into a [`Gateway`].
    pub fn build(self) -> Gateway {
        let handshake = OriginValidator::new(self.allow_list)
            .and_then(SessionCarrier::shared(self.store).cookie_name(self.cookie_name));
        let handshake: BoxStage<Connection, Connection> = match self.handshake_timeout {
            Some(limit) => TimeoutStage::new(handshake, limit).boxed(),
            None => handshake.boxed(),
        };

        let protocols = self
            .protocols
            .upgrade(handshake.endpoint(self.paths.build()));

        Gateway {
            inner: Arc::new(Traced::new(CloseAware::new(protocols.build()), "gateway")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingSessionStore, RecordingHandler};
    use portier_core::{CloseSignal, Scheme, SessionToken};

    fn config() -> GatewayConfig {
        GatewayConfig::from_toml_str(r#"allowed_origins = ["example.com"]"#).unwrap()
    }

    #[tokio::test]
    async fn test_upgrade_reaches_routed_handler_with_session() {
        let store = CountingSessionStore::new();
        let session = store.create("tok");
        let chat = RecordingHandler::new();

        let gateway = Gateway::builder(&config())
            .unwrap()
            .session_store(store.clone())
            .route("/ws/chat/{room}", chat.clone())
            .unwrap()
            .build();

        let conn = Connection::upgrade("/ws/chat/lobby")
            .origin("https://example.com")
            .cookie("sessionid=tok")
            .build();
        gateway.serve(conn).await.unwrap();

        let received = chat.last().unwrap();
        assert_eq!(received.param("room"), Some("lobby"));
        assert!(received.session().unwrap().same_identity(&session));
        assert_eq!(store.lookups(), 1);
    }

    #[tokio::test]
    async fn test_request_bypasses_handshake() {
        let app = RecordingHandler::new();
        let store = CountingSessionStore::new();
        let gateway = Gateway::builder(&config())
            .unwrap()
            .session_store(store.clone())
            .request_handler(app.clone())
            .build();

        let conn = Connection::request("/accounts/login")
            .origin("https://evil.test")
            .cookie("sessionid=tok")
            .build();
        gateway.serve(conn).await.unwrap();

        assert_eq!(app.count(), 1);
        assert!(!app.last().unwrap().has_session());
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn test_failure_fires_close_signal() {
        let chat = RecordingHandler::new();
        let gateway = Gateway::builder(&config())
            .unwrap()
            .route("/ws", chat.clone())
            .unwrap()
            .build();

        let rejected = CloseSignal::new();
        let conn = Connection::upgrade("/ws")
            .origin("https://evil.test")
            .close_signal(rejected.clone())
            .build();
        assert!(gateway.serve(conn).await.is_err());
        assert!(rejected.is_closed());

        let unsupported = CloseSignal::new();
        let conn = Connection::builder("lifespan", "/")
            .close_signal(unsupported.clone())
            .build();
        assert!(gateway.serve(conn).await.is_err());
        assert!(unsupported.is_closed());

        let accepted = CloseSignal::new();
        let conn = Connection::upgrade("/ws")
            .origin("https://example.com")
            .close_signal(accepted.clone())
            .build();
        gateway.serve(conn).await.unwrap();
        assert!(!accepted.is_closed());
    }

    #[tokio::test]
    async fn test_missing_request_handler_is_unsupported() {
        let gateway = Gateway::builder(&config()).unwrap().build();
        let err = gateway
            .serve(Connection::request("/").build())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedProtocol(_)));
        assert!(gateway.protocol_router().chain(Scheme::Request).is_none());
        assert!(gateway.protocol_router().chain(Scheme::Upgrade).is_some());
    }

    #[tokio::test]
    async fn test_rejected_origin_never_touches_store() {
        let store = CountingSessionStore::new();
        store.create("tok");
        let chat = RecordingHandler::new();
        let gateway = Gateway::builder(&config())
            .unwrap()
            .session_store(store.clone())
            .route("/ws", chat.clone())
            .unwrap()
            .build();

        let conn = Connection::upgrade("/ws")
            .origin("https://evil.test")
            .cookie("sessionid=tok")
            .build();
        let err = gateway.serve(conn).await.unwrap_err();

        assert!(matches!(err, DispatchError::OriginRejected));
        assert_eq!(store.lookups(), 0);
        assert_eq!(chat.count(), 0);
    }

    #[tokio::test]
    async fn test_custom_cookie_name() {
        let store = CountingSessionStore::new();
        store.create("tok");
        let chat = RecordingHandler::new();
        let config = GatewayConfig {
            session_cookie: "app_session".into(),
            ..config()
        };
        let gateway = Gateway::builder(&config)
            .unwrap()
            .session_store(store)
            .route("/ws", chat.clone())
            .unwrap()
            .build();

        let conn = Connection::upgrade("/ws")
            .origin("https://example.com")
            .cookie("sessionid=other; app_session=tok")
            .build();
        gateway.serve(conn).await.unwrap();

        let session = chat.last().unwrap().session().cloned().unwrap();
        assert_eq!(session.token(), &SessionToken::new("tok"));
    }

    #[test]
    fn test_conflicting_routes_fail_the_build() {
        let result = Gateway::builder(&config())
            .unwrap()
            .route("/ws/{room}", RecordingHandler::new())
            .unwrap()
            .route("/ws/{other}", RecordingHandler::new());
        assert!(matches!(result, Err(ConfigError::Routing(_))));
    }

    #[tokio::test]
    async fn test_spawned_dispatch() {
        let chat = RecordingHandler::new();
        let gateway = Gateway::builder(&config())
            .unwrap()
            .route("/ws", chat.clone())
            .unwrap()
            .build();

        let handle = gateway.spawn(
            Connection::upgrade("/ws")
                .origin("http://example.com")
                .build(),
        );
        handle.await.unwrap().unwrap();
        assert_eq!(chat.count(), 1);
    }
}
