use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by task lifecycle, history and report operations.
///
/// The `Display` text is meant to be shown to the user as-is.
#[derive(Debug, Error)]
pub enum TaskError {
    /// A required text input was blank; carries what was missing
    #[error("Please enter a {0}")]
    EmptyInput(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("Failed to save task data to {}", .0.display())]
    PersistenceFailure(PathBuf),

    #[error("Invalid timestamp '{0}'")]
    ParseFailure(String),

    #[error("{0}")]
    Report(String),
}

pub type TaskResult<T> = std::result::Result<T, TaskError>;
