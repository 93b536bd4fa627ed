use serde::{Deserialize, Serialize};

/// One vacancy row produced by a completed execution (read-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedinResult {
    pub id: i64,
    pub workflow_execution_id: i64,
    pub title: String,
    pub vacancy_link: String,
}
