//! Command dispatch.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use jobflow_api_client::{
    ApiClient, ApiError, Credentials, Execution, ExecutionCreate, ExecutionPoller,
    ExecutionSource, PollEvent, PollHandle, PollOutcome, WorkflowConfig, WorkflowConfigCreate, WorkflowPreset, WorkflowPresetCreate,
};
use jobflow_core::{find_api_error, ClientConfig, KeywordTags};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::{
    Cli, Commands, CredentialArgs, ExecutionCommands, KeywordArgs, OutputFormat, PresetCommands,
    ResultCommands, RunArgs, WorkflowCommands, WorkflowCreateArgs, WorkflowUpdateArgs,
};
use crate::{print_json, render};

/// Run the parsed command line against the configured backend.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    debug!(api = %config.api_base(), session_dir = %config.session_dir.display(), "Loaded configuration");

    let client = ApiClient::from_config(&config)?;
    let dashboard = Dashboard {
        client,
        format: cli.format,
        poll_interval: config.poll_interval(),
    };

    match cli.command {
        Commands::Login(args) => dashboard.login(args, false).await,
        Commands::Register(args) => dashboard.login(args, true).await,
        Commands::Logout => {
            dashboard.client.logout().await?;
            println!("Signed out.");
            Ok(())
        }
        Commands::Whoami { refresh } => dashboard.whoami(refresh).await,
        Commands::Workflows { sub } => {
            dashboard.require_session().await?;
            dashboard.workflows(sub).await
        }
        Commands::Presets { sub } => {
            dashboard.require_session().await?;
            dashboard.presets(sub).await
        }
        Commands::Executions { sub } => {
            dashboard.require_session().await?;
            dashboard.executions(sub).await
        }
        Commands::Results { sub } => {
            dashboard.require_session().await?;
            dashboard.results(sub).await
        }
    }
}

struct Dashboard {
    client: ApiClient,
    format: OutputFormat,
    poll_interval: Duration,
}

impl Dashboard {
    fn emit<T: Serialize>(&self, value: &T, table: impl FnOnce(&T) -> String) -> Result<()> {
        match self.format {
            OutputFormat::Json => print_json(value),
            OutputFormat::Table => {
                print!("{}", table(value));
                Ok(())
            }
        }
    }

    fn notice(&self, message: &str) {
        if self.format == OutputFormat::Table {
            println!("{}", message);
        }
    }

    /// Data commands need a signed-in user; anonymous requests would only
    /// come back as 401.
    async fn require_session(&self) -> Result<()> {
        if self.client.session().is_authenticated().await {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("Not signed in".to_string()).into())
        }
    }

    async fn login(&self, args: CredentialArgs, register: bool) -> Result<()> {
        let credentials = Credentials::new(args.email.trim(), args.password);
        if credentials.email.is_empty() || credentials.password.is_empty() {
            return Err(ApiError::InvalidInput("Email and password are required".to_string()).into());
        }

        let auth = if register {
            self.client.register(&credentials).await
        } else {
            self.client.login(&credentials).await
        }
        .map_err(credentials_rejected)?;

        let user = self.client.session().user().await;
        match (self.format, user) {
            (OutputFormat::Json, Some(user)) => print_json(&user),
            (OutputFormat::Json, None) => print_json(&serde_json::json!({ "token_type": auth.token_type })),
            (OutputFormat::Table, Some(user)) => {
                println!("Signed in as {}", user.email);
                Ok(())
            }
            (OutputFormat::Table, None) => {
                println!("Signed in.");
                Ok(())
            }
        }
    }

    async fn whoami(&self, refresh: bool) -> Result<()> {
        let user = if refresh {
            self.client.revalidate_session().await?
        } else if self.client.session().is_authenticated().await {
            self.client.session().user().await
        } else {
            None
        };

        match user {
            Some(user) => self.emit(&user, render::user_detail),
            None => Err(ApiError::Unauthorized("Not signed in".to_string()).into()),
        }
    }

    async fn workflows(&self, sub: WorkflowCommands) -> Result<()> {
        let now = Utc::now();
        match sub {
            WorkflowCommands::List { active } => {
                let workflows = if active {
                    self.client.list_active_workflows().await?
                } else {
                    self.client.list_workflows().await?
                };
                self.emit(&workflows, |w| render::workflows_table(w, now))
            }
            WorkflowCommands::Get { id } => {
                let workflow = self.client.get_workflow(id).await?;
                self.emit(&workflow, |w| render::workflow_detail(w, now))
            }
            WorkflowCommands::Default => {
                let workflow = self.client.get_default_workflow().await?;
                self.emit(&workflow, |w| render::workflow_detail(w, now))
            }
            WorkflowCommands::Create(args) => {
                let body = workflow_create_body(args).await?;
                let workflow = self.client.create_workflow(&body).await?;
                self.notice(&format!("Created workflow #{}", workflow.id));
                self.emit(&workflow, |w| render::workflow_detail(w, now))
            }
            WorkflowCommands::Update { id, changes } => {
                let current = self.client.get_workflow(id).await?;
                let body = apply_workflow_changes(&current, changes);
                let workflow = self.client.update_workflow(id, &body).await?;
                self.notice(&format!("Updated workflow #{}", workflow.id));
                self.emit(&workflow, |w| render::workflow_detail(w, now))
            }
            WorkflowCommands::Activate { id } => self.toggle_workflow(id, true).await,
            WorkflowCommands::Deactivate { id } => self.toggle_workflow(id, false).await,
            WorkflowCommands::Delete { id } => {
                self.client.delete_workflow(id).await?;
                self.emit(
                    &serde_json::json!({ "success": true, "id": id }),
                    |_| format!("Deleted workflow #{}\n", id),
                )
            }
            WorkflowCommands::Json { id, output } => {
                let definition = self.client.get_workflow_json(id).await?;
                match output {
                    Some(path) => {
                        let text = serde_json::to_string_pretty(&definition)
                            .context("Serialize workflow JSON")?;
                        tokio::fs::write(&path, text)
                            .await
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        println!("Saved workflow JSON to {}", path.display());
                        Ok(())
                    }
                    None => print_json(&definition),
                }
            }
            WorkflowCommands::ImportFile { filename } => {
                let workflow = self
                    .client
                    .import_workflow_from_file(filename.as_deref())
                    .await?;
                self.notice(&format!("Imported workflow #{}", workflow.id));
                self.emit(&workflow, |w| render::workflow_detail(w, now))
            }
            WorkflowCommands::Files => {
                let files = self.client.list_importable_files().await?;
                self.emit(&files, |files| {
                    if files.is_empty() {
                        "No importable files.\n".to_string()
                    } else {
                        files.iter().map(|f| format!("{}\n", f)).collect()
                    }
                })
            }
        }
    }

    async fn toggle_workflow(&self, id: i64, is_active: bool) -> Result<()> {
        let workflow = self.client.set_workflow_active(id, is_active).await?;
        let state = if workflow.is_active { "active" } else { "inactive" };
        self.emit(&workflow, |w| format!("Workflow #{} is now {}\n", w.id, state))
    }

    async fn presets(&self, sub: PresetCommands) -> Result<()> {
        match sub {
            PresetCommands::List { workflow } => {
                let mut presets = self.client.list_presets().await?;
                if let Some(workflow_id) = workflow {
                    presets.retain(|p| p.workflow_config_id == workflow_id);
                }
                self.emit(&presets, |p| render::presets_table(p))
            }
            PresetCommands::Create {
                workflow,
                name,
                keywords,
                location,
            } => {
                let body = WorkflowPresetCreate {
                    workflow_config_id: workflow,
                    preset_name: name.trim().to_string(),
                    keywords: collect_keywords(&keywords, None),
                    location: location.trim().to_string(),
                };
                let preset = self.client.create_preset(&body).await?;
                self.notice(&format!("Saved preset #{}", preset.id));
                self.emit(&preset, |p| render::presets_table(std::slice::from_ref(p)))
            }
            PresetCommands::Delete { id } => {
                self.client.delete_preset(id).await?;
                self.emit(
                    &serde_json::json!({ "success": true, "id": id }),
                    |_| format!("Deleted preset #{}\n", id),
                )
            }
            PresetCommands::InitDefaults => {
                let response = self.client.initialize_default_presets().await?;
                self.emit(&response, |r| format!("{} ({})\n", r.message, r.count))
            }
        }
    }

    async fn executions(&self, sub: ExecutionCommands) -> Result<()> {
        match sub {
            ExecutionCommands::List => {
                let executions = self.client.list_executions().await?;
                self.emit(&executions, |e| render::executions_table(e))
            }
            ExecutionCommands::Get { id } => {
                let execution = self.client.get_execution(id).await?;
                self.emit(&execution, render::execution_detail)
            }
            ExecutionCommands::Run(args) => self.run_execution(args).await,
            ExecutionCommands::Watch { id, interval_ms } => {
                self.watch(id, self.interval(interval_ms)).await
            }
            ExecutionCommands::Cancel { id } => {
                self.client.cancel_execution(id).await?;
                let execution = self.client.get_execution(id).await?;
                self.notice(&format!("Cancel requested for execution #{}", id));
                self.emit(&execution, render::execution_detail)
            }
            ExecutionCommands::Export { output } => self.export(&output).await,
        }
    }

    fn interval(&self, interval_ms: Option<u64>) -> Duration {
        interval_ms
            .map(Duration::from_millis)
            .unwrap_or(self.poll_interval)
    }

    async fn run_execution(&self, args: RunArgs) -> Result<()> {
        let preset = match args.from_preset {
            Some(preset_id) => {
                let presets = self.client.list_presets().await?;
                let preset = presets
                    .into_iter()
                    .find(|p| p.id == preset_id)
                    .ok_or_else(|| anyhow!("Preset #{} not found", preset_id))?;
                Some(preset)
            }
            None => None,
        };

        let request = build_execution_request(&args, preset.as_ref());
        let execution = self.client.create_execution(&request).await?;
        info!(execution_id = execution.id, "Execution started");

        if !args.wait {
            self.notice(&format!("Started execution #{}", execution.id));
            return self.emit(&execution, render::execution_detail);
        }

        self.notice(&format!(
            "Started execution #{}, waiting for it to finish (Ctrl-C to stop watching)",
            execution.id
        ));
        self.watch(execution.id, self.interval(args.interval_ms)).await
    }

    async fn watch(&self, id: i64, interval: Duration) -> Result<()> {
        if id <= 0 {
            return Err(ApiError::InvalidInput("Execution id must be positive".to_string()).into());
        }

        let poller = ExecutionPoller::new(Arc::new(self.client.clone())).with_interval(interval);
        let handle = poller.start(id);

        let show_progress = self.format == OutputFormat::Table;
        let mut last_status = None;
        let follow = follow_execution(handle, |execution| {
            if last_status != Some(execution.status) {
                if show_progress {
                    eprintln!("Execution #{} is {}", execution.id, execution.status);
                }
                last_status = Some(execution.status);
            }
        });

        // Dropping `follow` drops the handle, which stops the poller.
        tokio::select! {
            result = follow => {
                let execution = result?;
                self.emit(&execution, render::execution_detail)
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopped watching execution #{}; it keeps running on the server.", id);
                Ok(())
            }
        }
    }

    async fn export(&self, output: &Path) -> Result<()> {
        let written = self.client.download_executions_csv(output).await?;
        self.emit(
            &serde_json::json!({ "path": output.display().to_string(), "bytes": written }),
            |_| format!("Saved {} bytes to {}\n", written, output.display()),
        )
    }

    async fn results(&self, sub: ResultCommands) -> Result<()> {
        match sub {
            ResultCommands::List { execution } => {
                let mut results = self.client.list_linkedin_results().await?;
                if let Some(execution_id) = execution {
                    results.retain(|r| r.workflow_execution_id == execution_id);
                }
                self.emit(&results, |r| render::results_table(r))
            }
        }
    }
}

/// Drive `handle` until the execution reaches a terminal status. Snapshots
/// are passed to `on_progress`. Polling that ends any other way, including a
/// crashed poll task, is an error.
pub async fn follow_execution<S: ExecutionSource>(
    mut handle: PollHandle<S>,
    mut on_progress: impl FnMut(&Execution),
) -> Result<Execution> {
    let id = handle.execution_id();
    while let Some(event) = handle.next_event().await {
        match event {
            PollEvent::Snapshot(execution) => on_progress(&execution),
            PollEvent::Completed(execution) => return Ok(execution),
            PollEvent::Failed(message) => bail!(message),
        }
    }

    match handle.wait().await {
        PollOutcome::Completed(execution) => Ok(execution),
        PollOutcome::Failed(message) => bail!(message),
        PollOutcome::Stopped => bail!("Polling stopped before execution #{} finished", id),
        PollOutcome::Inert => bail!("Execution #{} cannot be polled", id),
    }
}

/// A 401 on login means bad credentials, not an expired session, so keep the
/// server's message instead of the sign-in-again hint.
fn credentials_rejected(err: anyhow::Error) -> anyhow::Error {
    if let Some(ApiError::Unauthorized(message)) = find_api_error(&err) {
        return ApiError::Http {
            status: 401,
            message: message.clone(),
        }
        .into();
    }
    err
}

/// Keywords from `--keywords` (free text) followed by each `--keyword` tag.
/// `base` seeds the field before either is applied.
pub fn collect_keywords(args: &KeywordArgs, base: Option<&str>) -> String {
    let mut tags = KeywordTags::new(base.unwrap_or_default());
    if let Some(raw) = &args.keywords {
        tags.set_raw(raw.as_str());
    }
    for keyword in &args.keyword {
        tags.add(keyword);
    }
    tags.into_string()
}

/// Execution request from the command line, with a preset (if any) filling
/// whatever the flags leave unset.
pub fn build_execution_request(args: &RunArgs, preset: Option<&WorkflowPreset>) -> ExecutionCreate {
    let base_keywords = preset.map(|p| p.keywords.as_str());
    let keywords = collect_keywords(&args.keywords, base_keywords);
    let location = args
        .location
        .clone()
        .or_else(|| preset.map(|p| p.location.clone()))
        .unwrap_or_default();

    let mut request = ExecutionCreate::new(keywords, location.trim());
    if let Some(workflow_id) = args.workflow.or(preset.map(|p| p.workflow_config_id)) {
        request = request.for_workflow(workflow_id);
    }
    if let Some(name) = &args.save_preset {
        request = request.save_as_preset(name.trim());
    }
    request
}

async fn workflow_create_body(args: WorkflowCreateArgs) -> Result<WorkflowConfigCreate> {
    let workflow_config_json = match &args.definition {
        Some(path) => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            Some(value)
        }
        None => None,
    };

    Ok(WorkflowConfigCreate {
        workflow_name: args.name.trim().to_string(),
        n8n_workflow_id: args.external_id.trim().to_string(),
        webhook_path: args.webhook_path,
        workflow_config_json,
        is_active: Some(!args.inactive),
        run_interval_minutes: args.interval,
        description: args.description,
        ..Default::default()
    })
}

/// Current record with the given changes laid over it.
pub fn apply_workflow_changes(
    current: &WorkflowConfig,
    changes: WorkflowUpdateArgs,
) -> WorkflowConfigCreate {
    let mut body = WorkflowConfigCreate::from(current);
    if let Some(name) = changes.name {
        body.workflow_name = name.trim().to_string();
    }
    if let Some(external_id) = changes.external_id {
        body.n8n_workflow_id = external_id.trim().to_string();
    }
    if let Some(webhook_path) = changes.webhook_path {
        body.webhook_path = Some(webhook_path);
    }
    if let Some(interval) = changes.interval {
        body.run_interval_minutes = Some(interval);
    }
    if let Some(description) = changes.description {
        body.description = Some(description);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn preset() -> WorkflowPreset {
        WorkflowPreset {
            id: 3,
            user_id: 1,
            workflow_config_id: 7,
            preset_name: "Kyiv React".to_string(),
            keywords: "React Developer, Frontend".to_string(),
            location: "Kyiv".to_string(),
            created_at: "2025-02-01T09:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn keywords_from_text_and_tags() {
        let args = KeywordArgs {
            keywords: Some("React Developer ,, Java".to_string()),
            keyword: vec!["  Rust ".to_string(), "".to_string()],
        };
        assert_eq!(collect_keywords(&args, None), "React Developer, Java, Rust");
    }

    #[test]
    fn run_request_without_preset() {
        let args = RunArgs {
            workflow: Some(5),
            keywords: KeywordArgs {
                keywords: Some("React Developer".to_string()),
                keyword: vec![],
            },
            location: Some("Kyiv".to_string()),
            ..Default::default()
        };
        let request = build_execution_request(&args, None);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "workflow_config_id": 5,
                "keywords": "React Developer",
                "location": "Kyiv"
            })
        );
    }

    #[test]
    fn preset_fills_unset_fields() {
        let args = RunArgs {
            keywords: KeywordArgs {
                keywords: None,
                keyword: vec!["TypeScript".to_string()],
            },
            ..Default::default()
        };
        let request = build_execution_request(&args, Some(&preset()));
        assert_eq!(request.workflow_config_id, Some(7));
        assert_eq!(request.keywords, "React Developer, Frontend, TypeScript");
        assert_eq!(request.location, "Kyiv");
        assert_eq!(request.save_as_preset, None);
    }

    #[test]
    fn flags_override_preset() {
        let args = RunArgs {
            workflow: Some(9),
            keywords: KeywordArgs {
                keywords: Some("Go".to_string()),
                keyword: vec![],
            },
            location: Some("Remote".to_string()),
            save_preset: Some("Remote Go".to_string()),
            ..Default::default()
        };
        let request = build_execution_request(&args, Some(&preset()));
        assert_eq!(request.workflow_config_id, Some(9));
        assert_eq!(request.keywords, "Go");
        assert_eq!(request.location, "Remote");
        assert_eq!(request.save_as_preset, Some(true));
        assert_eq!(request.preset_name.as_deref(), Some("Remote Go"));
    }

    #[test]
    fn workflow_update_keeps_unchanged_fields() {
        let current: WorkflowConfig = serde_json::from_value(serde_json::json!({
            "id": 4,
            "user_id": 1,
            "workflow_name": "LinkedIn Jobs",
            "n8n_workflow_id": "wf_4",
            "webhook_path": "linkedin",
            "is_active": true,
            "run_interval_minutes": 15,
            "created_at": "2025-02-01T09:00:00"
        }))
        .unwrap();

        let body = apply_workflow_changes(
            &current,
            WorkflowUpdateArgs {
                interval: Some(60),
                ..Default::default()
            },
        );
        assert_eq!(body.workflow_name, "LinkedIn Jobs");
        assert_eq!(body.n8n_workflow_id, "wf_4");
        assert_eq!(body.webhook_path.as_deref(), Some("linkedin"));
        assert_eq!(body.run_interval_minutes, Some(60));
    }

    /// Reports one running snapshot, then the poll task dies.
    struct CrashingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl ExecutionSource for CrashingSource {
        async fn fetch_execution(&self, id: i64) -> Result<Execution> {
            if self.fetches.fetch_add(1, Ordering::SeqCst) == 0 {
                let mut execution = running_execution();
                execution.id = id;
                return Ok(execution);
            }
            panic!("connection pool poisoned");
        }

        async fn cancel_execution(&self, _id: i64) -> Result<()> {
            Ok(())
        }
    }

    fn running_execution() -> Execution {
        serde_json::from_value(serde_json::json!({
            "id": 31,
            "user_id": 1,
            "workflow_config_id": 5,
            "keywords": "React Developer",
            "location": "Kyiv",
            "status": "running",
            "created_at": "2025-03-01T10:00:00"
        }))
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn follow_fails_when_poll_task_dies() {
        let source = Arc::new(CrashingSource {
            fetches: AtomicUsize::new(0),
        });
        let handle = ExecutionPoller::new(source)
            .with_interval(Duration::from_millis(10))
            .start(31);

        let mut snapshots = 0;
        let err = follow_execution(handle, |_| snapshots += 1)
            .await
            .unwrap_err();

        assert_eq!(snapshots, 1);
        assert!(err.to_string().starts_with("Polling task failed"));
    }

    #[tokio::test]
    async fn follow_rejects_inert_handle() {
        let source = Arc::new(CrashingSource {
            fetches: AtomicUsize::new(0),
        });
        let handle = ExecutionPoller::new(source).start(0);

        let err = follow_execution(handle, |_| {}).await.unwrap_err();
        assert_eq!(err.to_string(), "Execution #0 cannot be polled");
    }

    #[test]
    fn rejected_login_keeps_server_message() {
        let err = credentials_rejected(
            ApiError::Unauthorized("Incorrect email or password".to_string()).into(),
        );
        let api_error = find_api_error(&err).unwrap();
        assert!(!api_error.is_auth_failure());
        assert_eq!(api_error.client_message(), "Incorrect email or password");
    }

    #[tokio::test]
    async fn create_body_reads_definition_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("automation.json");
        std::fs::write(&path, r#"{"name":"LinkedIn","nodes":[]}"#).unwrap();

        let body = workflow_create_body(WorkflowCreateArgs {
            name: " LinkedIn Jobs ".to_string(),
            external_id: "wf_1".to_string(),
            webhook_path: None,
            interval: Some(30),
            description: None,
            inactive: true,
            definition: Some(path),
        })
        .await
        .unwrap();

        assert_eq!(body.workflow_name, "LinkedIn Jobs");
        assert_eq!(body.is_active, Some(false));
        assert_eq!(body.workflow_config_json.unwrap()["name"], "LinkedIn");
    }
}
