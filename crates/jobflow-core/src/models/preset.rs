use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;
use crate::error::ApiError;

/// Saved (keywords, location) pair used to prefill a new execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPreset {
    pub id: i64,
    pub user_id: i64,
    pub workflow_config_id: i64,
    pub preset_name: String,
    pub keywords: String,
    pub location: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPresetCreate {
    pub workflow_config_id: i64,
    pub preset_name: String,
    pub keywords: String,
    pub location: String,
}

impl WorkflowPresetCreate {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.preset_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("Preset name is required".to_string()));
        }
        if self.keywords.trim().is_empty() || self.location.trim().is_empty() {
            return Err(ApiError::InvalidInput(
                "Keywords and location are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reply of `POST /workflows/initialize-presets`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInitResponse {
    pub message: String,
    pub count: i64,
}
