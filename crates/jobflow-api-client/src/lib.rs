//! Shared HTTP client for the jobflow API.
//!
//! Provides the client (bearer auth taken from the [`Session`], generic
//! GET/POST/PUT/PATCH/DELETE helpers, 401 handling), domain methods in
//! [`api`], and the execution status poller in [`poller`]. The CLI uses this
//! client directly.

pub mod api;
pub mod poller;
pub mod session;

use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use jobflow_core::ClientConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

pub use jobflow_core::ApiError;
pub use poller::{ExecutionPoller, ExecutionSource, PollEvent, PollHandle, PollOutcome, PollState};
pub use session::{Session, SessionStore};

/// HTTP client for the jobflow API, authenticated through a shared session.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base(),
            session,
        })
    }

    /// Create client from environment (see [`ClientConfig::from_env`]) with the
    /// session restored from the configured session directory.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env()?;
        Self::from_config(&config)
    }

    /// Create client for `config`, hydrating the session from its directory.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let session = Session::hydrate(SessionStore::new(config.session_dir.clone()))?;
        Self::new(config, Arc::new(session))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.session.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send the request and turn non-success statuses into [`ApiError`].
    /// A 401 tears the session down before the error is returned.
    async fn execute(&self, method: &str, path: &str, request: RequestBuilder) -> Result<Response> {
        let request = self.apply_auth(request).await;
        debug!(method, path, "Sending API request");

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let error = ApiError::from_response(status.as_u16(), &error_text);

        if error.is_auth_failure() {
            warn!(method, path, "Request unauthorized, clearing session");
            if let Err(e) = self.session.teardown().await {
                warn!(error = %e, "Failed to clear stored session");
            }
        } else {
            debug!(method, path, status = status.as_u16(), "API request failed");
        }

        Err(error.into())
    }

    async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json()
            .await
            .context("Failed to parse response as JSON")
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.execute("GET", path, request).await?;
        Self::json_body(response).await
    }

    /// GET request returning the raw body (file downloads).
    pub async fn get_bytes(&self, path: &str, query: &[(&str, String)]) -> Result<Bytes> {
        let mut request = self.client.get(self.build_url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let response = self.execute("GET", path, request).await?;
        response
            .bytes()
            .await
            .context("Failed to read response body")
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.execute("POST", path, request).await?;
        Self::json_body(response).await
    }

    /// POST without a body, ignoring any response body.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        let request = self.client.post(self.build_url(path));
        self.execute("POST", path, request).await?;
        Ok(())
    }

    /// POST without a body and deserialize response.
    pub async fn post_for<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.post(self.build_url(path));
        let response = self.execute("POST", path, request).await?;
        Self::json_body(response).await
    }

    /// PUT JSON body and deserialize response.
    pub async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.put(self.build_url(path)).json(body);
        let response = self.execute("PUT", path, request).await?;
        Self::json_body(response).await
    }

    /// PATCH JSON body and deserialize response.
    pub async fn patch_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.patch(self.build_url(path)).json(body);
        let response = self.execute("PATCH", path, request).await?;
        Self::json_body(response).await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.client.delete(self.build_url(path));
        self.execute("DELETE", path, request).await?;
        Ok(())
    }
}

// Re-export domain types for convenience.
pub use jobflow_core::models::{
    AuthResponse, Credentials, Execution, ExecutionCreate, ExecutionStatus, LinkedinResult,
    PresetInitResponse, StaticFilesList, User, WorkflowConfig, WorkflowConfigCreate,
    WorkflowPreset, WorkflowPresetCreate,
};
