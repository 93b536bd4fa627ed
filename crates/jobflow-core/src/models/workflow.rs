//! Workflow configuration models: named references to automations living in
//! the external workflow engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::error::ApiError;

/// Interval the backend assumes when none is given
pub const DEFAULT_RUN_INTERVAL_MINUTES: i32 = 15;

/// Server-side file imported when no name is given
pub const DEFAULT_IMPORT_FILE: &str = "automation.json";

/// Workflow configuration (API record)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub id: i64,
    pub user_id: i64,
    pub workflow_name: String,
    pub n8n_workflow_id: String,
    #[serde(default)]
    pub webhook_path: Option<String>,
    #[serde(default)]
    pub workflow_config_json: Option<serde_json::Value>,
    #[serde(default)]
    pub workflow_version: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_run_interval")]
    pub run_interval_minutes: i32,
    #[serde(default, with = "timestamp::option")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Body for create (POST) and full update (PUT)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowConfigCreate {
    pub workflow_name: String,
    pub n8n_workflow_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_config_json: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_interval_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl WorkflowConfigCreate {
    /// Required-field check done before anything is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.workflow_name.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "Workflow name is required".to_string(),
            ));
        }
        if self.n8n_workflow_id.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "External workflow id is required".to_string(),
            ));
        }
        if let Some(minutes) = self.run_interval_minutes {
            if minutes <= 0 {
                return Err(ApiError::InvalidInput(
                    "Run interval must be a positive number of minutes".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl From<&WorkflowConfig> for WorkflowConfigCreate {
    /// Prefill an edit form from an existing record.
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            workflow_name: config.workflow_name.clone(),
            n8n_workflow_id: config.n8n_workflow_id.clone(),
            webhook_path: config.webhook_path.clone(),
            workflow_config_json: config.workflow_config_json.clone(),
            workflow_version: config.workflow_version.clone(),
            is_active: Some(config.is_active),
            run_interval_minutes: Some(config.run_interval_minutes),
            description: config.description.clone(),
            source_file: config.source_file.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowActivate {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowFileImport {
    pub filename: String,
}

impl Default for WorkflowFileImport {
    fn default() -> Self {
        Self {
            filename: DEFAULT_IMPORT_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowJsonExport {
    pub workflow_json: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticFilesList {
    pub files: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_run_interval() -> i32 {
    DEFAULT_RUN_INTERVAL_MINUTES
}
