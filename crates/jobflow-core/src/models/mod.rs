//! Data models for the application
//!
//! Records mirrored from the jobflow backend. The client owns no invariants on
//! them beyond display formatting; they are (de)serialized as-is.

mod execution;
mod linkedin_result;
mod preset;
pub mod timestamp;
mod user;
mod workflow;

// Re-export all models for convenient imports
pub use execution::*;
pub use linkedin_result::*;
pub use preset::*;
pub use user::*;
pub use workflow::*;
