//! Test helpers for HTTP API tests.
//!
//! Builds the full router over an in-memory database, a temporary byte
//! store and an in-memory token store.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderName;
use axum_test::{TestResponse, TestServer};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tempfile::TempDir;

use depot::config::ServerConfig;
use depot::jobs::JobReceiver;
use depot::web::create_router;
use depot::{
    AppState, Authenticator, Database, DiskByteStore, FileTreeManager, JobDispatcher,
    MemoryTokenStore,
};

/// Session token header.
pub const X_TOKEN: HeaderName = HeaderName::from_static("x-token");

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub bytes: Arc<DiskByteStore>,
    /// Receiving end of the upload queue, for inspection or a worker.
    pub jobs: Option<JobReceiver>,
    _dir: TempDir,
}

impl TestApp {
    /// Create an app with the default 24 hour token lifetime.
    pub async fn new() -> Self {
        Self::with_token_ttl(Duration::from_secs(24 * 60 * 60)).await
    }

    /// Create an app with a custom token lifetime.
    pub async fn with_token_ttl(ttl: Duration) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open_in_memory()
            .await
            .expect("Failed to create test database");

        let authenticator =
            Authenticator::with_ttl(db.clone(), Arc::new(MemoryTokenStore::new()), ttl);
        let bytes = Arc::new(DiskByteStore::new(dir.path()).expect("Failed to create store"));
        let (dispatcher, jobs) = JobDispatcher::new();
        let files = FileTreeManager::new(db.clone(), bytes.clone(), dispatcher);

        let state = Arc::new(AppState::new(db.clone(), authenticator, files));
        let router = create_router(state, &ServerConfig::default());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            db,
            bytes,
            jobs: Some(jobs),
            _dir: dir,
        }
    }

    /// POST /users.
    pub async fn register(&self, email: &str, password: &str) -> TestResponse {
        self.server
            .post("/users")
            .json(&json!({ "email": email, "password": password }))
            .await
    }

    /// GET /connect with Basic credentials.
    pub async fn connect(&self, email: &str, password: &str) -> TestResponse {
        let encoded = STANDARD.encode(format!("{email}:{password}"));
        self.server
            .get("/connect")
            .add_header(AUTHORIZATION, format!("Basic {encoded}"))
            .await
    }

    /// Register a user and log in, returning the session token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        self.register(email, password).await;
        let response = self.connect(email, password).await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .expect("token in response")
            .to_string()
    }

    /// POST /files with a JSON body.
    pub async fn upload(&self, token: &str, body: Value) -> TestResponse {
        self.server
            .post("/files")
            .add_header(X_TOKEN, token.to_string())
            .json(&body)
            .await
    }

    /// Create a folder and return its ID.
    pub async fn create_folder(&self, token: &str, name: &str, parent_id: i64) -> i64 {
        let response = self
            .upload(
                token,
                json!({ "name": name, "type": "folder", "parentId": parent_id }),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().expect("folder id")
    }

    /// Upload a file and return its ID.
    pub async fn create_file(&self, token: &str, name: &str, parent_id: i64, content: &[u8]) -> i64 {
        let response = self
            .upload(
                token,
                json!({
                    "name": name,
                    "type": "file",
                    "parentId": parent_id,
                    "data": STANDARD.encode(content)
                }),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().expect("file id")
    }

    /// Authenticated GET.
    pub async fn get(&self, path: &str, token: &str) -> TestResponse {
        self.server
            .get(path)
            .add_header(X_TOKEN, token.to_string())
            .await
    }

    /// Authenticated PUT.
    pub async fn put(&self, path: &str, token: &str) -> TestResponse {
        self.server
            .put(path)
            .add_header(X_TOKEN, token.to_string())
            .await
    }
}
