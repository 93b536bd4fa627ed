use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use super::timestamp;
use crate::error::ApiError;

/// Execution lifecycle. Only the backend moves an execution between states;
/// `Success` and `Error` are final.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Success | ExecutionStatus::Error)
    }
}

impl Display for ExecutionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ExecutionStatus::Pending => write!(f, "pending"),
            ExecutionStatus::Running => write!(f, "running"),
            ExecutionStatus::Success => write!(f, "success"),
            ExecutionStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for ExecutionStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "running" => Ok(ExecutionStatus::Running),
            "success" => Ok(ExecutionStatus::Success),
            "error" => Ok(ExecutionStatus::Error),
            _ => Err(anyhow::anyhow!("Invalid execution status: {}", s)),
        }
    }
}

/// One requested run of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: i64,
    pub user_id: i64,
    pub workflow_config_id: i64,
    pub keywords: String,
    pub location: String,
    #[serde(default)]
    pub n8n_execution_id: Option<String>,
    pub status: ExecutionStatus,
    /// Opaque payload echoed from the workflow engine
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Execution {
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Body of `POST /executions`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionCreate {
    /// Falls back to the user's default workflow on the server when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_config_id: Option<i64>,
    pub keywords: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_as_preset: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset_name: Option<String>,
}

impl ExecutionCreate {
    pub fn new(keywords: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    pub fn for_workflow(mut self, workflow_config_id: i64) -> Self {
        self.workflow_config_id = Some(workflow_config_id);
        self
    }

    /// Ask the backend to also store the parameters as a named preset.
    pub fn save_as_preset(mut self, preset_name: impl Into<String>) -> Self {
        self.save_as_preset = Some(true);
        self.preset_name = Some(preset_name.into());
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.keywords.trim().is_empty() {
            return Err(ApiError::InvalidInput("Keywords are required".to_string()));
        }
        if self.location.trim().is_empty() {
            return Err(ApiError::InvalidInput("Location is required".to_string()));
        }
        if self.save_as_preset == Some(true)
            && self
                .preset_name
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            return Err(ApiError::InvalidInput(
                "Preset name is required when saving as preset".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!ExecutionStatus::Pending.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(ExecutionStatus::Success.is_terminal());
        assert!(ExecutionStatus::Error.is_terminal());
    }

    #[test]
    fn status_display_matches_wire_format() {
        for status in [
            ExecutionStatus::Pending,
            ExecutionStatus::Running,
            ExecutionStatus::Success,
            ExecutionStatus::Error,
        ] {
            let wire = serde_json::to_value(status).unwrap();
            assert_eq!(wire, status.to_string());
            assert_eq!(status.to_string().parse::<ExecutionStatus>().unwrap(), status);
        }
        assert!("cancelled".parse::<ExecutionStatus>().is_err());
    }

    #[test]
    fn create_body_has_exactly_the_given_fields() {
        let body = ExecutionCreate::new("React Developer", "Kyiv").for_workflow(5);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "workflow_config_id": 5,
                "keywords": "React Developer",
                "location": "Kyiv"
            })
        );
    }

    #[test]
    fn preset_name_required_when_saving() {
        let mut body = ExecutionCreate::new("Rust", "Remote");
        body.save_as_preset = Some(true);
        assert!(body.validate().is_err());

        let body = ExecutionCreate::new("Rust", "Remote").save_as_preset("Remote Rust");
        assert!(body.validate().is_ok());

        assert!(ExecutionCreate::new(" ", "Remote").validate().is_err());
    }

    #[test]
    fn execution_with_result_payload() {
        let json = r#"{
            "id": 11, "user_id": 1, "workflow_config_id": 5,
            "keywords": "React Developer", "location": "Kyiv",
            "n8n_execution_id": "8812", "status": "success",
            "result": {"items": 14},
            "created_at": "2025-02-10T08:00:00",
            "completed_at": "2025-02-10T08:03:10"
        }"#;
        let execution: Execution = serde_json::from_str(json).unwrap();
        assert!(execution.is_finished());
        assert_eq!(execution.result.unwrap()["items"], 14);
        assert!(execution.completed_at.is_some());
    }
}
