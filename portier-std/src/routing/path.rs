//! Matchit-backed path router.
//!
//! Patterns use `{name}` for a single segment and `{*rest}` for a catch-all,
//! e.g. `/ws/rooms/{room}` or `/ws/files/{*path}`. Overlapping patterns are
//! refused when the table is built, so at most one pattern can match a path.

use matchit::{InsertError, Router as InnerRouter};
use portier_core::{
    BoxHandler, Connection, DispatchError, Endpoint, Handler, RouteParams, RouteResult, Router,
    RouterBuildError,
};
use std::sync::Arc;

/// Dispatches connections to the handler registered for their path.
pub struct PathRouter {
    router: InnerRouter<BoxHandler<Connection>>,
    patterns: Vec<String>,
}

impl PathRouter {
    /// Start an empty routing table.
    pub fn builder() -> PathRouterBuilder {
        PathRouterBuilder::default()
    }

    /// Registered patterns, in registration order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether no patterns are registered.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The handler and captured parameters for `path`.
    pub fn resolve(&self, path: &str) -> Option<(BoxHandler<Connection>, RouteParams)> {
        let matched = self.router.at(path).ok()?;
        let params = matched.params.iter().collect();
        Some((Arc::clone(matched.value), params))
    }
}

impl Router<str, BoxHandler<Connection>> for PathRouter {
    fn lookup(&self, key: &str) -> RouteResult<'_, BoxHandler<Connection>> {
        match self.router.at(key) {
            Ok(matched) => RouteResult::Matched(matched.value),
            Err(_) => RouteResult::NotFound,
        }
    }
}

impl Endpoint<Connection> for PathRouter {
    async fn dispatch(&self, conn: Connection) -> Result<(), DispatchError> {
        if conn.is_closed() {
            return Err(DispatchError::Closed);
        }
        let Some((handler, params)) = self.resolve(conn.path()) else {
            tracing::debug!(conn = %conn.id(), path = %conn.path(), "no route for upgrade path");
            return Err(DispatchError::NoRoute(conn.path().to_owned()));
        };
        handler
            .call_dyn(conn.with_params(params))
            .await
            .map_err(DispatchError::Handler)
    }
}

/// Builder for [`PathRouter`].
pub struct PathRouterBuilder {
    router: InnerRouter<BoxHandler<Connection>>,
    patterns: Vec<String>,
}

impl Default for PathRouterBuilder {
    fn default() -> Self {
        Self {
            router: InnerRouter::new(),
            patterns: Vec::new(),
        }
    }
}

impl PathRouterBuilder {
    /// Register `handler` for `pattern`.
    pub fn route<H>(mut self, pattern: &str, handler: H) -> Result<Self, RouterBuildError>
    where
        H: Handler<Connection>,
    {
        self.insert(pattern, Arc::new(handler))?;
        Ok(self)
    }

    /// Register an already shared handler for `pattern`.
    ///
    /// A pattern without a leading `/` gets one.
    pub fn insert(
        &mut self,
        pattern: &str,
        handler: BoxHandler<Connection>,
    ) -> Result<(), RouterBuildError> {
        let pattern = if pattern.starts_with('/') {
            pattern.to_owned()
        } else {
            format!("/{pattern}")
        };
        self.router
            .insert(pattern.clone(), handler)
            .map_err(|err| match err {
                InsertError::Conflict { .. } => {
                    RouterBuildError::Conflict(format!("{pattern}: {err}"))
                }
                _ => RouterBuildError::InvalidPattern(format!("{pattern}: {err}")),
            })?;
        self.patterns.push(pattern);
        Ok(())
    }

    /// Freeze the table.
    pub fn build(self) -> PathRouter {
        PathRouter {
            router: self.router,
            patterns: self.patterns,
        }
    }
}
