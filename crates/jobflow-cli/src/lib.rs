//! jobflow CLI: sign in, manage workflows and presets, run and watch
//! executions, browse results.

pub mod cli;
pub mod commands;
pub mod render;

use anyhow::{Context, Result};
use serde::Serialize;

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays clean
/// for tables and JSON. `JOBFLOW_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    if std::env::var("JOBFLOW_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

pub fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}
