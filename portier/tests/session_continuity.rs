use portier::{
    Connection, Gateway, GatewayConfig, Session, SessionToken, Stage,
    session::{MemorySessionStore, SessionCarrier},
    testing::{CountingSessionStore, RecordingHandler},
};
use std::sync::Arc;

mod common;
use common::example_config;

fn gateway_with(store: CountingSessionStore, sink: RecordingHandler) -> Gateway {
    Gateway::builder(&example_config())
        .unwrap()
        .session_store(store)
        .route("/ws/notifications", sink)
        .unwrap()
        .build()
}

#[tokio::test]
async fn test_session_identity_is_preserved_with_one_lookup() {
    let store = CountingSessionStore::new();
    let stored = store.create("tok-1");
    let sink = RecordingHandler::new();
    let gateway = gateway_with(store.clone(), sink.clone());

    let conn = Connection::upgrade("/ws/notifications")
        .origin("https://example.com")
        .cookie("theme=dark; sessionid=tok-1")
        .build();
    gateway.serve(conn).await.unwrap();

    let received = sink.last().unwrap();
    let first = received.session().cloned().unwrap();
    let second = received.session().cloned().unwrap();
    assert!(first.same_identity(&second));
    assert!(first.same_identity(&stored));
    assert_eq!(store.lookups(), 1);
}

#[tokio::test]
async fn test_each_connection_resolves_its_own_session() {
    let store = CountingSessionStore::new();
    let alice = store.create("alice");
    let bob = store.create("bob");
    let sink = RecordingHandler::new();
    let gateway = gateway_with(store.clone(), sink.clone());

    for token in ["alice", "bob"] {
        let conn = Connection::upgrade("/ws/notifications")
            .origin("https://example.com")
            .cookie(format!("sessionid={token}"))
            .build();
        gateway.serve(conn).await.unwrap();
    }

    let received = sink.connections();
    assert!(received[0].session().unwrap().same_identity(&alice));
    assert!(received[1].session().unwrap().same_identity(&bob));
    assert_eq!(store.lookups(), 2);
}

#[tokio::test]
async fn test_shared_store_sees_sessions_created_after_build() {
    let store = MemorySessionStore::new();
    let sink = RecordingHandler::new();
    let gateway = Gateway::builder(&GatewayConfig {
        allowed_origins: vec!["*".into()],
        ..GatewayConfig::default()
    })
    .unwrap()
    .shared_session_store(Arc::new(store.clone()))
    .route("/ws", sink.clone())
    .unwrap()
    .build();

    store.insert(Session::new(SessionToken::new("late")));

    let conn = Connection::upgrade("/ws")
        .origin("https://anywhere.test")
        .cookie("sessionid=late")
        .build();
    gateway.serve(conn).await.unwrap();

    assert!(sink.last().unwrap().has_session());
}

#[tokio::test]
async fn test_carrier_keeps_a_session_already_attached() {
    let store = CountingSessionStore::new();
    store.create("tok-1");
    let carrier = SessionCarrier::new(store.clone());

    let existing = Session::new(SessionToken::new("tok-0"));
    let conn = Connection::upgrade("/ws")
        .cookie("sessionid=tok-1")
        .build()
        .with_session(existing.clone());

    let conn = carrier.process(conn).await.unwrap();
    assert!(conn.session().unwrap().same_identity(&existing));
    assert_eq!(store.lookups(), 0);
}
