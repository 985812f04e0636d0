//! Abstraction over SMT solver backends.
//!
//! The verification pipeline talks to a `dyn SolverBackend`, so the
//! subprocess solver can be swapped for an in-process stand-in in tests.

use minilang_fv_smtlib::Script;

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::result::SolverResult;
use crate::solver::CliSolver;

/// A decision procedure for SMT-LIB scripts.
///
/// Implementations must be shareable across threads: independent queries
/// are issued concurrently.
pub trait SolverBackend: Send + Sync {
    /// Check satisfiability of the given script.
    ///
    /// - `Ok(SolverResult::Sat(model))`: satisfiable (counterexample found)
    /// - `Ok(SolverResult::Unsat)`: unsatisfiable (property proved)
    /// - `Ok(SolverResult::Unknown(reason))`: undecided or timed out
    /// - `Err(SolverError)`: the solver could not be run
    fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError>;

    /// Human-readable backend name for logs and reports.
    fn name(&self) -> String;
}

impl SolverBackend for CliSolver {
    fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
        CliSolver::check_sat(self, script)
    }

    fn name(&self) -> String {
        self.config().kind.to_string()
    }
}

/// Create a subprocess backend for `config`, checking the binary exists.
pub fn create_backend(config: SolverConfig) -> Result<Box<dyn SolverBackend>, SolverError> {
    config.validate()?;
    tracing::debug!(solver = %config.kind, path = %config.solver_path.display(), "using subprocess backend");
    Ok(Box::new(CliSolver::new(config)))
}

/// Create the default backend: auto-detected Z3.
pub fn create_default_backend() -> Result<Box<dyn SolverBackend>, SolverError> {
    create_backend(SolverConfig::auto_detect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverKind;
    use std::path::PathBuf;

    #[test]
    fn create_backend_rejects_missing_binary() {
        let config = SolverConfig::new(SolverKind::Cvc5, PathBuf::from("/no/such/cvc5"));
        let err = create_backend(config).err().unwrap();
        assert!(err.to_string().contains("CVC5"), "{err}");
    }

    #[test]
    fn cli_backend_name_is_solver_kind() {
        let solver = CliSolver::new(SolverConfig::new(SolverKind::Z3, PathBuf::from("z3")));
        assert_eq!(SolverBackend::name(&solver), "Z3");
    }

    #[test]
    fn default_backend_matches_detection() {
        assert_eq!(
            create_default_backend().is_ok(),
            SolverConfig::auto_detect().is_ok()
        );
    }
}
