use std::path::PathBuf;

use minilang_fv_analysis::VerifyError;
use minilang_fv_solver::SolverError;
use thiserror::Error;

/// Everything that stops the driver before a verdict is printed.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is not a valid program: {source}", path.display())]
    InvalidProgram {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} is not a valid configuration: {message}", path.display())]
    InvalidConfig { path: PathBuf, message: String },
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error(transparent)]
    Verify(#[from] VerifyError),
}

impl DriverError {
    /// Short machine-readable name for the JSON error report.
    pub fn kind(&self) -> &'static str {
        match self {
            DriverError::Io { .. } => "io",
            DriverError::InvalidProgram { .. } => "invalid_program",
            DriverError::InvalidConfig { .. } => "invalid_config",
            DriverError::Solver(_) => "solver",
            DriverError::Verify(VerifyError::Solver(_)) => "solver",
            DriverError::Verify(_) => "verification",
        }
    }
}
