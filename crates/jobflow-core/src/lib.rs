//! Jobflow Core Library
//!
//! This crate provides the domain models, error types, configuration and small
//! helpers (keyword tags, display formatting) shared by the jobflow API client
//! and CLI.

pub mod config;
pub mod error;
pub mod format;
pub mod keywords;
pub mod models;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{find_api_error, ApiError, LogLevel};
pub use keywords::{normalize_keywords, parse_keywords, KeywordTags};
