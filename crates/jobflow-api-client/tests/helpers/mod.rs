pub mod fixtures;

use jobflow_api_client::{ApiClient, AuthResponse, Session, SessionStore, User};
use jobflow_core::ClientConfig;
use mockito::ServerGuard;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_TOKEN: &str = "test-token-abc";

/// Returns the prefixed API path, e.g. `api_path("/executions")` -> `/api/executions`.
pub fn api_path(path: &str) -> String {
    format!("/api{}", path)
}

/// Client wired to a mock server, with its session stored in a temp dir
pub struct TestClient {
    pub server: ServerGuard,
    pub client: ApiClient,
    pub session_dir: TempDir,
}

impl TestClient {
    pub fn store(&self) -> SessionStore {
        SessionStore::new(self.session_dir.path())
    }
}

pub fn test_user() -> User {
    User {
        id: 1,
        email: "recruiter@example.com".to_string(),
        created_at: "2025-01-05T09:00:00".to_string(),
    }
}

/// Client without a session
pub async fn setup_anonymous_client() -> TestClient {
    let server = mockito::Server::new_async().await;
    let session_dir = tempfile::tempdir().expect("temp dir");

    let config = ClientConfig {
        api_url: server.url(),
        api_prefix: "/api".to_string(),
        http_timeout_secs: 5,
        poll_interval_ms: 2000,
        session_dir: session_dir.path().to_path_buf(),
    };
    let session = Session::new(SessionStore::new(session_dir.path()));
    let client = ApiClient::new(&config, Arc::new(session)).expect("client");

    TestClient {
        server,
        client,
        session_dir,
    }
}

/// Client with a logged-in session persisted to its session dir
pub async fn setup_test_client() -> TestClient {
    let test = setup_anonymous_client().await;
    test.client
        .session()
        .establish(&AuthResponse {
            access_token: TEST_TOKEN.to_string(),
            token_type: "bearer".to_string(),
            user: Some(test_user()),
        })
        .await
        .expect("establish session");
    test
}
