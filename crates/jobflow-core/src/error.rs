//! Error types module
//!
//! `ApiError` is the typed root cause attached to failures coming back from the
//! jobflow backend. Client code propagates `anyhow::Error` and classifies with
//! `err.downcast_ref::<ApiError>()`, so an expired session can be told apart
//! from an ordinary request failure.

use std::io;

/// Fallback message when the server gives no usable `detail`.
pub const GENERIC_ERROR_MESSAGE: &str = "Request failed";

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like an expired session
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401 from the backend. The session has been torn down by the time the
    /// caller sees this.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("API request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Build an error from a non-success response. The FastAPI backend reports
    /// failures as `{"detail": "..."}` or, for validation errors, as a list of
    /// `{"msg": "..."}` objects.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_detail(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() || trimmed.starts_with('<') {
                GENERIC_ERROR_MESSAGE.to_string()
            } else {
                trimmed.to_string()
            }
        });

        if status == 401 {
            ApiError::Unauthorized(message)
        } else {
            ApiError::Http { status, message }
        }
    }

    /// HTTP status associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            ApiError::InvalidInput(_) | ApiError::Storage(_) => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Message suitable for a user-facing notification.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Unauthorized(_) => {
                "Session expired or invalid. Run `jobflow login` to sign in again.".to_string()
            }
            ApiError::Http { message, .. } => message.clone(),
            ApiError::InvalidInput(message) => message.clone(),
            ApiError::Storage(message) => format!("Could not access local session: {}", message),
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            ApiError::InvalidInput(_) => LogLevel::Debug,
            ApiError::Unauthorized(_) => LogLevel::Warn,
            ApiError::Http { status, .. } if *status < 500 => LogLevel::Warn,
            ApiError::Http { .. } | ApiError::Storage(_) => LogLevel::Error,
        }
    }
}

impl From<io::Error> for ApiError {
    fn from(err: io::Error) -> Self {
        ApiError::Storage(format!("IO error: {}", err))
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail").or_else(|| value.get("message"))?;
    match detail {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// Find the first `ApiError` in an error chain.
pub fn find_api_error(err: &anyhow::Error) -> Option<&ApiError> {
    err.chain().find_map(|cause| cause.downcast_ref::<ApiError>())
}
