//! Tracker error types.

use thiserror::Error;

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Errors that can occur while tracking projects.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// No project with this id exists in the collection.
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Phase slug not in the lifecycle.
    #[error("Unknown phase: {0}")]
    UnknownPhase(String),

    /// Action trigger not in any phase.
    #[error("Unknown action trigger: {0}")]
    UnknownTrigger(String),

    /// Project status not recognised.
    #[error("Unknown project status: {0} (expected active, completed, on-hold or cancelled)")]
    UnknownStatus(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored project data could not be read or written.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
