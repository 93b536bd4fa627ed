use serde_json::{json, Value};

pub fn workflow_json(id: i64, name: &str, is_active: bool) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "workflow_name": name,
        "n8n_workflow_id": format!("wf_{}", id),
        "webhook_path": "linkedin-jobs",
        "workflow_config_json": null,
        "workflow_version": null,
        "is_active": is_active,
        "run_interval_minutes": 15,
        "last_run_at": null,
        "description": "Collects vacancies",
        "source_file": "automation.json",
        "created_at": "2025-02-10T08:00:00.512000"
    })
}

pub fn execution_json(id: i64, workflow_config_id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "workflow_config_id": workflow_config_id,
        "keywords": "React Developer",
        "location": "Kyiv",
        "n8n_execution_id": null,
        "status": status,
        "result": null,
        "created_at": "2025-02-10T08:00:00",
        "completed_at": null
    })
}

pub fn preset_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "user_id": 1,
        "workflow_config_id": 5,
        "preset_name": name,
        "keywords": "Rust, Go",
        "location": "Remote",
        "created_at": "2025-02-11T12:30:00"
    })
}
