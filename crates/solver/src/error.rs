use std::path::PathBuf;

use thiserror::Error;

use crate::config::SolverKind;

/// Errors from solver interaction.
///
/// Only infrastructure failures are errors. A solver that answers
/// `unknown` or runs out of time produces `SolverResult::Unknown` instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// Solver binary not found at the specified path.
    #[error("{kind} binary not found at: {}", .path.display())]
    NotFound { kind: SolverKind, path: PathBuf },
    /// Process failed to start, crashed, or reported an error.
    #[error("Solver process error: {0}")]
    ProcessError(String),
    /// Failed to parse solver output.
    #[error("Failed to parse solver output: {0}")]
    ParseError(String),
}
