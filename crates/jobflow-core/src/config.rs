//! Configuration module
//!
//! Client configuration loaded from the environment (and a `.env` file when
//! present): backend location, HTTP timeout, poll interval and the directory
//! that holds the persisted session.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_API_PREFIX: &str = "/api";
const HTTP_TIMEOUT_SECS: u64 = 60;
const POLL_INTERVAL_MS: u64 = 2000;
const SESSION_DIR_NAME: &str = "jobflow";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend origin, without trailing slash (e.g. "http://localhost:8000")
    pub api_url: String,
    /// Path prefix every endpoint lives under (e.g. "/api")
    pub api_prefix: String,
    pub http_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub session_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            http_timeout_secs: HTTP_TIMEOUT_SECS,
            poll_interval_ms: POLL_INTERVAL_MS,
            session_dir: default_session_dir(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let api_url = env::var("JOBFLOW_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "JOBFLOW_API_URL must start with http:// or https:// (got '{}')",
                api_url
            ));
        }

        let api_prefix =
            env::var("JOBFLOW_API_PREFIX").unwrap_or_else(|_| DEFAULT_API_PREFIX.to_string());

        let http_timeout_secs = env::var("JOBFLOW_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| HTTP_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("JOBFLOW_HTTP_TIMEOUT_SECS must be a valid number"))?;

        let poll_interval_ms = env::var("JOBFLOW_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| POLL_INTERVAL_MS.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("JOBFLOW_POLL_INTERVAL_MS must be a valid number"))?;
        if poll_interval_ms == 0 {
            return Err(anyhow::anyhow!(
                "JOBFLOW_POLL_INTERVAL_MS must be greater than zero"
            ));
        }

        let session_dir = env::var("JOBFLOW_SESSION_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_session_dir());

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_prefix: normalize_prefix(&api_prefix),
            http_timeout_secs,
            poll_interval_ms,
            session_dir,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Full base URL for API paths, e.g. "http://localhost:8000/api".
    pub fn api_base(&self) -> String {
        format!("{}{}", self.api_url, self.api_prefix)
    }
}

fn default_session_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(env::temp_dir)
        .join(SESSION_DIR_NAME)
}

/// Leading slash, no trailing slash; empty stays empty.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(normalize_prefix("api"), "/api");
        assert_eq!(normalize_prefix("/api/"), "/api");
        assert_eq!(normalize_prefix("/api/v1"), "/api/v1");
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("/"), "");
    }

    #[test]
    fn defaults_match_backend_layout() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base(), "http://localhost:8000/api");
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.http_timeout(), Duration::from_secs(60));
        assert!(config.session_dir.ends_with("jobflow"));
    }

    #[test]
    fn api_url_override_strips_trailing_slash() {
        let config = ClientConfig::default().with_api_url("https://jobs.example.com/");
        assert_eq!(config.api_base(), "https://jobs.example.com/api");
    }
}
