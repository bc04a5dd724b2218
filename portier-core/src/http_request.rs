//! Conversion from `http` request heads.

use crate::connection::Connection;
use http::{HeaderMap, Request, header};

impl Connection {
    /// Build a connection from an HTTP request head.
    ///
    /// A request carrying `Upgrade: websocket` together with a `Connection`
    /// header that lists `upgrade` is declared as `websocket`; everything
    /// else is declared as `http`. Header values that are not visible ASCII
    /// are dropped.
    pub fn from_http_request<B>(request: &Request<B>) -> Self {
        let scheme = if is_websocket_upgrade(request.headers()) {
            "websocket"
        } else {
            "http"
        };

        let mut builder = Connection::builder(scheme, request.uri().path());
        if let Some(query) = request.uri().query() {
            builder = builder.query(query);
        }
        for (name, value) in request.headers() {
            if let Ok(value) = value.to_str() {
                builder = builder.header(name.as_str(), value);
            }
        }
        builder.build()
    }
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let upgrade = headers
        .get_all(header::UPGRADE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("websocket"));

    let connection = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    upgrade && connection
}
