//! Plain-text tables and detail views.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use jobflow_api_client::{Execution, LinkedinResult, User, WorkflowConfig, WorkflowPreset};
use jobflow_core::format::{format_date_distance, format_interval, truncate_string};

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn active_label(is_active: bool) -> &'static str {
    if is_active {
        "yes"
    } else {
        "no"
    }
}

pub fn workflows_table(workflows: &[WorkflowConfig], now: DateTime<Utc>) -> String {
    if workflows.is_empty() {
        return "No workflows found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<28} {:<20} {:<7} {:<22} {:<18}",
        "ID", "Name", "External ID", "Active", "Interval", "Last Run"
    );
    let _ = writeln!(out, "{}", "-".repeat(106));
    for wf in workflows {
        let _ = writeln!(
            out,
            "{:<6} {:<28} {:<20} {:<7} {:<22} {:<18}",
            wf.id,
            truncate_string(&wf.workflow_name, 28),
            truncate_string(&wf.n8n_workflow_id, 20),
            active_label(wf.is_active),
            format_interval(wf.run_interval_minutes),
            format_date_distance(wf.last_run_at, now),
        );
    }
    out
}

pub fn workflow_detail(wf: &WorkflowConfig, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Workflow #{}: {}", wf.id, wf.workflow_name);
    let _ = writeln!(out, "  External ID:  {}", wf.n8n_workflow_id);
    let _ = writeln!(
        out,
        "  Webhook:      {}",
        wf.webhook_path.as_deref().unwrap_or("-")
    );
    let _ = writeln!(out, "  Active:       {}", active_label(wf.is_active));
    let _ = writeln!(
        out,
        "  Runs every:   {}",
        format_interval(wf.run_interval_minutes)
    );
    let _ = writeln!(
        out,
        "  Last run:     {}",
        format_date_distance(wf.last_run_at, now)
    );
    if let Some(version) = &wf.workflow_version {
        let _ = writeln!(out, "  Version:      {}", version);
    }
    if let Some(source) = &wf.source_file {
        let _ = writeln!(out, "  Source file:  {}", source);
    }
    if let Some(description) = &wf.description {
        let _ = writeln!(out, "  Description:  {}", description);
    }
    let _ = writeln!(out, "  Created:      {}", timestamp(&wf.created_at));
    out
}

pub fn executions_table(executions: &[Execution]) -> String {
    if executions.is_empty() {
        return "No executions found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<9} {:<8} {:<30} {:<18} {:<19}",
        "ID", "Workflow", "Status", "Keywords", "Location", "Created"
    );
    let _ = writeln!(out, "{}", "-".repeat(95));
    for ex in executions {
        let _ = writeln!(
            out,
            "{:<6} {:<9} {:<8} {:<30} {:<18} {:<19}",
            ex.id,
            ex.workflow_config_id,
            ex.status.to_string(),
            truncate_string(&ex.keywords, 30),
            truncate_string(&ex.location, 18),
            timestamp(&ex.created_at),
        );
    }
    out
}

pub fn execution_detail(ex: &Execution) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Execution #{} ({})", ex.id, ex.status);
    let _ = writeln!(out, "  Workflow:     {}", ex.workflow_config_id);
    let _ = writeln!(out, "  Keywords:     {}", ex.keywords);
    let _ = writeln!(out, "  Location:     {}", ex.location);
    let _ = writeln!(
        out,
        "  Engine run:   {}",
        ex.n8n_execution_id.as_deref().unwrap_or("-")
    );
    let _ = writeln!(out, "  Created:      {}", timestamp(&ex.created_at));
    let _ = writeln!(
        out,
        "  Completed:    {}",
        ex.completed_at
            .as_ref()
            .map(timestamp)
            .unwrap_or_else(|| "-".to_string())
    );
    if let Some(result) = &ex.result {
        let pretty =
            serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
        let _ = writeln!(out, "  Result:");
        for line in pretty.lines() {
            let _ = writeln!(out, "    {}", line);
        }
    }
    out
}

pub fn presets_table(presets: &[WorkflowPreset]) -> String {
    if presets.is_empty() {
        return "No presets found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<9} {:<24} {:<30} {:<18}",
        "ID", "Workflow", "Name", "Keywords", "Location"
    );
    let _ = writeln!(out, "{}", "-".repeat(91));
    for preset in presets {
        let _ = writeln!(
            out,
            "{:<6} {:<9} {:<24} {:<30} {:<18}",
            preset.id,
            preset.workflow_config_id,
            truncate_string(&preset.preset_name, 24),
            truncate_string(&preset.keywords, 30),
            truncate_string(&preset.location, 18),
        );
    }
    out
}

pub fn results_table(results: &[LinkedinResult]) -> String {
    if results.is_empty() {
        return "No results found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<6} {:<10} {:<40} {}",
        "ID", "Execution", "Title", "Link"
    );
    let _ = writeln!(out, "{}", "-".repeat(100));
    for row in results {
        let _ = writeln!(
            out,
            "{:<6} {:<10} {:<40} {}",
            row.id,
            row.workflow_execution_id,
            truncate_string(&row.title, 40),
            row.vacancy_link,
        );
    }
    let _ = writeln!(out, "\n{} result(s)", results.len());
    out
}

pub fn user_detail(user: &User) -> String {
    let created = if user.created_at.is_empty() {
        "-"
    } else {
        user.created_at.as_str()
    };
    format!("{} (id {}, since {})\n", user.email, user.id, created)
}
