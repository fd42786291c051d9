use std::path::PathBuf;
use thiserror::Error;

/// Rejected supervisor operations.
///
/// All of these are recoverable at the request boundary. An unexpected exit
/// of the supervised process is not an error; it shows up as a status change.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Server is already running")]
    AlreadyRunning,

    #[error("Server is not running")]
    NotRunning,

    #[error("Server jar not found at '{path}'")]
    MissingArtifact { path: PathBuf },

    #[error("Failed to start server: {reason}")]
    SpawnFailure { reason: String },

    #[error("Failed to write to server console: {source}")]
    WriteFailure {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to kill server process: {source}")]
    KillFailure {
        #[source]
        source: std::io::Error,
    },
}

impl SupervisorError {
    /// Short machine-readable kind, used in logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            SupervisorError::AlreadyRunning => "already_running",
            SupervisorError::NotRunning => "not_running",
            SupervisorError::MissingArtifact { .. } => "missing_artifact",
            SupervisorError::SpawnFailure { .. } => "spawn_failure",
            SupervisorError::WriteFailure { .. } => "write_failure",
            SupervisorError::KillFailure { .. } => "kill_failure",
        }
    }

    /// True for precondition failures caused by the caller's timing or setup,
    /// as opposed to OS-level failures.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SupervisorError::AlreadyRunning
                | SupervisorError::NotRunning
                | SupervisorError::MissingArtifact { .. }
        )
    }
}
