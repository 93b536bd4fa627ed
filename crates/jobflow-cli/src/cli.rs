//! Command-line definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "jobflow", about = "Jobflow workflow dashboard CLI", version)]
pub struct Cli {
    /// Backend URL (overrides JOBFLOW_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session locally
    Login(CredentialArgs),
    /// Create an account and store the session locally
    Register(CredentialArgs),
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Confirm the session with the backend first
        #[arg(long)]
        refresh: bool,
    },
    /// Workflow configuration
    Workflows {
        #[command(subcommand)]
        sub: WorkflowCommands,
    },
    /// Saved execution parameters
    Presets {
        #[command(subcommand)]
        sub: PresetCommands,
    },
    /// Workflow runs
    Executions {
        #[command(subcommand)]
        sub: ExecutionCommands,
    },
    /// Rows produced by completed executions
    Results {
        #[command(subcommand)]
        sub: ResultCommands,
    },
}

#[derive(Args, Debug)]
pub struct CredentialArgs {
    #[arg(long)]
    pub email: String,
    /// Password (or set JOBFLOW_PASSWORD)
    #[arg(long, env = "JOBFLOW_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum WorkflowCommands {
    /// List workflows
    List {
        /// Only active workflows
        #[arg(long)]
        active: bool,
    },
    /// Show one workflow
    Get { id: i64 },
    /// Show the workflow used when an execution names none
    Default,
    /// Create a workflow
    Create(WorkflowCreateArgs),
    /// Update a workflow; unset options keep their current values
    Update {
        id: i64,
        #[command(flatten)]
        changes: WorkflowUpdateArgs,
    },
    /// Mark a workflow active
    Activate { id: i64 },
    /// Mark a workflow inactive
    Deactivate { id: i64 },
    /// Delete a workflow
    Delete { id: i64 },
    /// Print (or save) the workflow definition JSON
    Json {
        id: i64,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Import a workflow from a JSON file on the server
    ImportFile {
        /// File name in the server's static directory (default: automation.json)
        filename: Option<String>,
    },
    /// List files available for import
    Files,
}

#[derive(Args, Debug)]
pub struct WorkflowCreateArgs {
    /// Display name
    #[arg(long)]
    pub name: String,
    /// Workflow id in the external engine
    #[arg(long)]
    pub external_id: String,
    #[arg(long)]
    pub webhook_path: Option<String>,
    /// Run interval in minutes
    #[arg(long)]
    pub interval: Option<i32>,
    #[arg(long)]
    pub description: Option<String>,
    /// Create the workflow inactive
    #[arg(long)]
    pub inactive: bool,
    /// Path to a local workflow definition JSON file
    #[arg(long, value_name = "FILE")]
    pub definition: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct WorkflowUpdateArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub external_id: Option<String>,
    #[arg(long)]
    pub webhook_path: Option<String>,
    #[arg(long)]
    pub interval: Option<i32>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PresetCommands {
    /// List presets
    List {
        /// Only presets for this workflow
        #[arg(long)]
        workflow: Option<i64>,
    },
    /// Save a preset
    Create {
        #[arg(long)]
        workflow: i64,
        #[arg(long)]
        name: String,
        #[command(flatten)]
        keywords: KeywordArgs,
        #[arg(long)]
        location: String,
    },
    /// Delete a preset
    Delete { id: i64 },
    /// Create the backend's default presets
    InitDefaults,
}

/// Keywords given as a comma-joined string, as repeated tags, or both.
#[derive(Args, Debug, Default, Clone)]
pub struct KeywordArgs {
    /// Comma-separated keywords, e.g. "React Developer, Java"
    #[arg(long)]
    pub keywords: Option<String>,
    /// Add one keyword tag (repeatable)
    #[arg(long = "keyword", value_name = "KEYWORD")]
    pub keyword: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum ExecutionCommands {
    /// List executions
    List,
    /// Show one execution
    Get { id: i64 },
    /// Start an execution
    Run(RunArgs),
    /// Poll an execution until it finishes
    Watch {
        id: i64,
        /// Poll interval in milliseconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: Option<u64>,
    },
    /// Ask the backend to cancel an execution
    Cancel { id: i64 },
    /// Download all executions as CSV
    Export {
        #[arg(long, default_value = "executions.csv")]
        output: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Workflow id (default workflow when omitted)
    #[arg(long)]
    pub workflow: Option<i64>,
    #[command(flatten)]
    pub keywords: KeywordArgs,
    #[arg(long)]
    pub location: Option<String>,
    /// Prefill workflow, keywords and location from a saved preset
    #[arg(long, value_name = "PRESET_ID")]
    pub from_preset: Option<i64>,
    /// Also save these parameters as a preset with this name
    #[arg(long, value_name = "NAME")]
    pub save_preset: Option<String>,
    /// Poll until the execution finishes
    #[arg(long)]
    pub wait: bool,
    /// Poll interval in milliseconds (with --wait)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum ResultCommands {
    /// List result rows
    List {
        /// Only rows from this execution
        #[arg(long)]
        execution: Option<i64>,
    },
}
