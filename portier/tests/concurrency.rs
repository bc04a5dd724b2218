use futures::future::join_all;
use portier::{Connection, DispatchError};

mod common;
use common::{Harness, example_config};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_connections_do_not_interfere() {
    let harness = Harness::new(&example_config());
    for i in 0..16 {
        harness.login(&format!("tok-{i}"), &format!("user-{i}"));
    }

    let handles = (0..16).map(|i| {
        let origin = if i % 4 == 0 {
            "https://evil.com"
        } else {
            "https://app.example.com"
        };
        harness.gateway.spawn(
            Connection::upgrade(format!("/ws/chat/room-{i}"))
                .origin(origin)
                .cookie(format!("sessionid=tok-{i}"))
                .build(),
        )
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    for (i, result) in results.iter().enumerate() {
        if i % 4 == 0 {
            assert!(matches!(result, Err(DispatchError::OriginRejected)));
        } else {
            assert!(result.is_ok());
        }
    }

    let mut joined = harness.chat.joined();
    joined.sort_by(|a, b| a.room.cmp(&b.room));
    assert_eq!(joined.len(), 12);
    for entry in &joined {
        let i = entry.room.trim_start_matches("room-");
        assert_eq!(entry.user.as_deref(), Some(format!("user-{i}").as_str()));
    }
    assert_eq!(harness.store.lookups(), 12);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_mixed_schemes_in_parallel() {
    let harness = Harness::new(&example_config());

    let requests = (0..8).map(|i| {
        harness
            .gateway
            .serve(Connection::request(format!("/page/{i}")).build())
    });
    let upgrades = (0..8).map(|i| {
        harness.gateway.serve(
            Connection::upgrade(format!("/ws/chat/{i}"))
                .origin("https://example.com")
                .build(),
        )
    });

    let (requests, upgrades) = futures::join!(join_all(requests), join_all(upgrades));
    assert!(requests.iter().chain(upgrades.iter()).all(Result::is_ok));
    assert_eq!(harness.app.count(), 8);
    assert_eq!(harness.chat.joined().len(), 8);
}
