//! Scheme-based protocol router.

use portier_core::{
    BoxEndpoint, Connection, DispatchError, DynEndpoint, Endpoint, RouteResult, Router, Scheme,
};

/// Picks the handler chain for a connection by its declared scheme.
///
/// The mapping is fixed when the router is built; routing reads it without
/// locking and never touches the connection. A scheme that is not
/// recognised, or that has no chain configured, fails with
/// [`DispatchError::UnsupportedProtocol`] and no chain runs.
pub struct ProtocolRouter {
    request: Option<BoxEndpoint<Connection>>,
    upgrade: Option<BoxEndpoint<Connection>>,
}

impl ProtocolRouter {
    /// Start an empty mapping.
    pub fn builder() -> ProtocolRouterBuilder {
        ProtocolRouterBuilder::default()
    }

    /// The chain configured for `scheme`.
    pub fn chain(&self, scheme: Scheme) -> Option<&dyn DynEndpoint<Connection>> {
        self.slot(scheme).as_deref()
    }

    /// Select the chain for `conn` without running it.
    pub fn route(&self, conn: &Connection) -> Result<&dyn DynEndpoint<Connection>, DispatchError> {
        let scheme = conn
            .scheme()
            .ok_or_else(|| DispatchError::UnsupportedProtocol(conn.declared_scheme().to_owned()))?;
        self.chain(scheme)
            .ok_or_else(|| DispatchError::UnsupportedProtocol(scheme.to_string()))
    }

    fn slot(&self, scheme: Scheme) -> &Option<BoxEndpoint<Connection>> {
        match scheme {
            Scheme::Request => &self.request,
            Scheme::Upgrade => &self.upgrade,
        }
    }
}

impl Router<Scheme, BoxEndpoint<Connection>> for ProtocolRouter {
    fn lookup(&self, key: &Scheme) -> RouteResult<'_, BoxEndpoint<Connection>> {
        self.slot(*key).as_ref().into()
    }
}

impl Endpoint<Connection> for ProtocolRouter {
    async fn dispatch(&self, conn: Connection) -> Result<(), DispatchError> {
        let chain = self.route(&conn)?;
        chain.dispatch_dyn(conn).await
    }
}

/// Builder for [`ProtocolRouter`].
#[derive(Default)]
pub struct ProtocolRouterBuilder {
    request: Option<BoxEndpoint<Connection>>,
    upgrade: Option<BoxEndpoint<Connection>>,
}

impl ProtocolRouterBuilder {
    /// Chain for plain requests.
    pub fn request<E: Endpoint<Connection>>(mut self, chain: E) -> Self {
        self.request = Some(Box::new(chain));
        self
    }

    /// Chain for upgrade requests.
    pub fn upgrade<E: Endpoint<Connection>>(mut self, chain: E) -> Self {
        self.upgrade = Some(Box::new(chain));
        self
    }

    /// Freeze the mapping.
    pub fn build(self) -> ProtocolRouter {
        ProtocolRouter {
            request: self.request,
            upgrade: self.upgrade,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingHandler;
    use portier_core::Direct;

    fn router(request: &RecordingHandler, upgrade: &RecordingHandler) -> ProtocolRouter {
        ProtocolRouter::builder()
            .request(Direct::new(request.clone()))
            .upgrade(Direct::new(upgrade.clone()))
            .build()
    }

    #[tokio::test]
    async fn test_dispatches_by_scheme() {
        let (plain, ws) = (RecordingHandler::new(), RecordingHandler::new());
        let router = router(&plain, &ws);

        router
            .dispatch(Connection::request("/api/status").build())
            .await
            .unwrap();
        router
            .dispatch(Connection::upgrade("/ws").build())
            .await
            .unwrap();

        assert_eq!(plain.count(), 1);
        assert_eq!(plain.last().unwrap().path(), "/api/status");
        assert_eq!(ws.count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_scheme_invokes_nothing() {
        let (plain, ws) = (RecordingHandler::new(), RecordingHandler::new());
        let router = router(&plain, &ws);

        let err = router
            .dispatch(Connection::builder("lifespan", "/").build())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::UnsupportedProtocol(s) if s == "lifespan"));
        assert_eq!(plain.count() + ws.count(), 0);
    }

    #[tokio::test]
    async fn test_unconfigured_scheme_is_unsupported() {
        let ws = RecordingHandler::new();
        let router = ProtocolRouter::builder()
            .upgrade(Direct::new(ws.clone()))
            .build();

        let err = router
            .dispatch(Connection::request("/").build())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::UnsupportedProtocol(s) if s == "request"));
        assert!(!router.contains(&Scheme::Request));
        assert!(router.contains(&Scheme::Upgrade));
    }

    #[test]
    fn test_route_does_not_mutate_connection() {
        let (plain, ws) = (RecordingHandler::new(), RecordingHandler::new());
        let router = router(&plain, &ws);

        let conn = Connection::upgrade("/ws").origin("https://a.com").build();
        let before = conn.clone();
        assert!(router.route(&conn).is_ok());
        assert_eq!(conn, before);
    }
}
