#![allow(dead_code)]

use portier::{
    Connection, Gateway, GatewayConfig, Handler, Session, SessionToken,
    testing::{CountingSessionStore, RecordingHandler},
};
use serde_json::{Map, json};
use std::sync::{Arc, Mutex};

// ============================================================================
// Configuration
// ============================================================================

pub fn example_config() -> GatewayConfig {
    GatewayConfig::from_toml_str(r#"allowed_origins = [".example.com"]"#).unwrap()
}

// ============================================================================
// Test Handlers
// ============================================================================

/// What a chat consumer saw when it took over a connection.
#[derive(Clone, Debug, PartialEq)]
pub struct Joined {
    pub room: String,
    pub user: Option<String>,
}

/// Stands in for a per-room chat consumer.
#[derive(Clone, Default)]
pub struct ChatConsumer {
    pub joined: Arc<Mutex<Vec<Joined>>>,
}

impl ChatConsumer {
    pub fn joined(&self) -> Vec<Joined> {
        self.joined.lock().unwrap().clone()
    }
}

impl Handler<Connection> for ChatConsumer {
    type Output = Result<(), std::io::Error>;

    async fn call(&self, conn: Connection) -> Self::Output {
        let room = conn
            .param("room")
            .ok_or_else(|| std::io::Error::other("route has no room"))?
            .to_owned();
        let user = conn
            .session()
            .and_then(|session| session.get("user"))
            .and_then(|user| user.as_str())
            .map(str::to_owned);
        self.joined.lock().unwrap().push(Joined { room, user });
        Ok(())
    }
}

// ============================================================================
// Assembly
// ============================================================================

pub struct Harness {
    pub gateway: Gateway,
    pub app: RecordingHandler,
    pub chat: ChatConsumer,
    pub store: CountingSessionStore,
}

impl Harness {
    pub fn new(config: &GatewayConfig) -> Self {
        let app = RecordingHandler::new();
        let chat = ChatConsumer::default();
        let store = CountingSessionStore::new();

        let gateway = Gateway::builder(config)
            .unwrap()
            .request_handler(app.clone())
            .session_store(store.clone())
            .route("/ws/chat/{room}", chat.clone())
            .unwrap()
            .build();

        Self {
            gateway,
            app,
            chat,
            store,
        }
    }

    /// Put a logged-in session for `user` into the store.
    pub fn login(&self, token: &str, user: &str) -> Session {
        let mut data = Map::new();
        data.insert("user".into(), json!(user));
        let session = Session::with_data(SessionToken::new(token), data);
        self.store.insert(session.clone());
        session
    }
}
