//! Domain methods for the jobflow API client.
//!
//! One method per backend operation; each maps to exactly one HTTP call except
//! `login`/`register`, which also record the session, and
//! `revalidate_session`, which may clear it.

use std::path::Path;

use anyhow::{Context, Result};
use bytes::Bytes;
use jobflow_core::models::{
    AuthResponse, Credentials, Execution, ExecutionCreate, LinkedinResult, PresetInitResponse,
    StaticFilesList, User, WorkflowActivate, WorkflowConfig, WorkflowConfigCreate,
    WorkflowFileImport, WorkflowJsonExport, WorkflowPreset, WorkflowPresetCreate,
};
use tracing::{info, warn};

use crate::ApiClient;

/// File name the executions export is saved under by default
pub const EXECUTIONS_CSV_FILENAME: &str = "executions.csv";

impl ApiClient {
    // Auth

    /// Log in and persist the returned token and user.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let response: AuthResponse = self.post_json("/auth/login", credentials).await?;
        self.session().establish(&response).await?;
        Ok(response)
    }

    /// Register a new account and persist the returned token and user.
    pub async fn register(&self, credentials: &Credentials) -> Result<AuthResponse> {
        let response: AuthResponse = self.post_json("/auth/register", credentials).await?;
        self.session().establish(&response).await?;
        Ok(response)
    }

    pub async fn current_user(&self) -> Result<User> {
        self.get("/auth/me", &[]).await
    }

    /// Confirm a hydrated session with the backend. On success the cached user
    /// is refreshed; on any failure the session is cleared. Returns `None`
    /// when there was no token to check or the check failed.
    pub async fn revalidate_session(&self) -> Result<Option<User>> {
        if self.session().token().await.is_none() {
            return Ok(None);
        }

        match self.current_user().await {
            Ok(user) => {
                self.session().update_user(user.clone()).await?;
                Ok(Some(user))
            }
            Err(e) => {
                warn!(error = %e, "Session revalidation failed, clearing session");
                self.session().teardown().await?;
                Ok(None)
            }
        }
    }

    /// Local logout; the backend keeps no server-side session.
    pub async fn logout(&self) -> Result<()> {
        self.session().teardown().await
    }

    // Workflow configs

    pub async fn list_workflows(&self) -> Result<Vec<WorkflowConfig>> {
        self.get("/workflows", &[]).await
    }

    pub async fn list_active_workflows(&self) -> Result<Vec<WorkflowConfig>> {
        self.get("/workflows/active", &[]).await
    }

    pub async fn get_workflow(&self, id: i64) -> Result<WorkflowConfig> {
        self.get(&format!("/workflows/{}", id), &[]).await
    }

    /// Workflow the backend runs when an execution names none.
    pub async fn get_default_workflow(&self) -> Result<WorkflowConfig> {
        self.get("/workflows/default", &[]).await
    }

    pub async fn create_workflow(&self, data: &WorkflowConfigCreate) -> Result<WorkflowConfig> {
        data.validate()?;
        self.post_json("/workflows", data).await
    }

    pub async fn update_workflow(
        &self,
        id: i64,
        data: &WorkflowConfigCreate,
    ) -> Result<WorkflowConfig> {
        data.validate()?;
        self.put_json(&format!("/workflows/{}", id), data).await
    }

    pub async fn set_workflow_active(&self, id: i64, is_active: bool) -> Result<WorkflowConfig> {
        self.patch_json(
            &format!("/workflows/{}/activate", id),
            &WorkflowActivate { is_active },
        )
        .await
    }

    pub async fn delete_workflow(&self, id: i64) -> Result<()> {
        self.delete(&format!("/workflows/{}", id)).await
    }

    /// Workflow definition JSON as stored by the backend.
    pub async fn get_workflow_json(&self, id: i64) -> Result<serde_json::Value> {
        let export: WorkflowJsonExport = self.get(&format!("/workflows/{}/json", id), &[]).await?;
        Ok(export.workflow_json)
    }

    /// Import a workflow from a JSON file in the backend's static directory.
    pub async fn import_workflow_from_file(&self, filename: Option<&str>) -> Result<WorkflowConfig> {
        let body = match filename {
            Some(name) => WorkflowFileImport {
                filename: name.to_string(),
            },
            None => WorkflowFileImport::default(),
        };
        self.post_json("/workflows/import-file", &body).await
    }

    /// Files available to [`ApiClient::import_workflow_from_file`].
    pub async fn list_importable_files(&self) -> Result<Vec<String>> {
        let list: StaticFilesList = self.get("/workflows/static-files", &[]).await?;
        Ok(list.files)
    }

    // Presets

    pub async fn list_presets(&self) -> Result<Vec<WorkflowPreset>> {
        self.get("/workflows/presets", &[]).await
    }

    pub async fn create_preset(&self, data: &WorkflowPresetCreate) -> Result<WorkflowPreset> {
        data.validate()?;
        self.post_json("/workflows/presets", data).await
    }

    pub async fn delete_preset(&self, id: i64) -> Result<()> {
        self.delete(&format!("/workflows/presets/{}", id)).await
    }

    pub async fn initialize_default_presets(&self) -> Result<PresetInitResponse> {
        self.post_for("/workflows/initialize-presets").await
    }

    // Executions

    pub async fn list_executions(&self) -> Result<Vec<Execution>> {
        self.get("/executions", &[]).await
    }

    pub async fn get_execution(&self, id: i64) -> Result<Execution> {
        self.get(&format!("/executions/{}", id), &[]).await
    }

    /// Start a run. The backend answers right away with the pending execution.
    pub async fn create_execution(&self, data: &ExecutionCreate) -> Result<Execution> {
        data.validate()?;
        let execution: Execution = self.post_json("/executions", data).await?;
        info!(
            execution_id = execution.id,
            workflow_config_id = execution.workflow_config_id,
            status = %execution.status,
            "Execution created"
        );
        Ok(execution)
    }

    pub async fn cancel_execution(&self, id: i64) -> Result<()> {
        self.post_empty(&format!("/executions/{}/cancel", id)).await
    }

    /// All executions as CSV, exactly as produced by the backend.
    pub async fn export_executions_csv(&self) -> Result<Bytes> {
        self.get_bytes("/executions/export", &[("format", "csv".to_string())])
            .await
    }

    /// Download the CSV export to `path`; returns the number of bytes written.
    pub async fn download_executions_csv(&self, path: &Path) -> Result<usize> {
        let csv = self.export_executions_csv().await?;
        tokio::fs::write(path, &csv)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(csv.len())
    }

    // Results

    pub async fn list_linkedin_results(&self) -> Result<Vec<LinkedinResult>> {
        self.get("/linkedin-results", &[]).await
    }
}
