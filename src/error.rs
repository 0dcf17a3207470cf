//! Error types for autotdd
//!
//! Centralized error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// All error types that can occur while driving the convergence loop
#[derive(Debug, Error)]
pub enum AutoTddError {
    /// Requirements document was not found where the run expects it
    #[error("Missing requirements: {}", .0.display())]
    MissingRequirements(PathBuf),

    /// Run configuration violates an invariant
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Creating or cleaning the source/test layout failed
    #[error("Scaffold error: {0}")]
    Scaffold(String),

    /// The fix collaborator could not be invoked or reported failure
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// Prompt template failed to render
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for autotdd operations
pub type Result<T> = std::result::Result<T, AutoTddError>;
