#![cfg(feature = "http")]

use http::{Request, header};
use portier::{Connection, Scheme};

mod common;
use common::{Harness, example_config};

fn websocket_handshake(uri: &str, origin: &str) -> Request<()> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "app.example.com")
        .header(header::CONNECTION, "keep-alive, Upgrade")
        .header(header::UPGRADE, "websocket")
        .header(header::ORIGIN, origin)
        .header(header::COOKIE, "csrftoken=x; sessionid=tok-1")
        .body(())
        .unwrap()
}

#[tokio::test]
async fn test_http_handshake_is_dispatched_as_upgrade() {
    let harness = Harness::new(&example_config());
    harness.login("tok-1", "alice");

    let request = websocket_handshake("/ws/chat/lobby?v=2", "https://app.example.com");
    let conn = Connection::from_http_request(&request);
    assert_eq!(conn.scheme(), Some(Scheme::Upgrade));
    assert_eq!(conn.query(), Some("v=2"));

    harness.gateway.serve(conn).await.unwrap();
    assert_eq!(harness.chat.joined()[0].user.as_deref(), Some("alice"));
}

#[tokio::test]
async fn test_http_handshake_from_foreign_origin() {
    let harness = Harness::new(&example_config());
    let request = websocket_handshake("/ws/chat/lobby", "https://evil.com");

    let err = harness
        .gateway
        .serve(Connection::from_http_request(&request))
        .await
        .unwrap_err();
    assert!(matches!(err, portier::DispatchError::OriginRejected));
}

#[tokio::test]
async fn test_plain_http_request_goes_to_app() {
    let harness = Harness::new(&example_config());
    let request = Request::get("/api/status").body(()).unwrap();

    harness
        .gateway
        .serve(Connection::from_http_request(&request))
        .await
        .unwrap();
    assert_eq!(harness.app.count(), 1);
    assert_eq!(harness.app.last().unwrap().path(), "/api/status");
}
