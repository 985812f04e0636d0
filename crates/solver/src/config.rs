use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SolverError;

/// Extra wall-clock time granted on top of the solver's own timeout before
/// the process is killed.
const KILL_GRACE_MS: u64 = 500;

/// Supported SMT solver backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Z3 from Microsoft Research.
    Z3,
    /// CVC5 from Stanford/Iowa.
    Cvc5,
}

impl SolverKind {
    /// Binary name used for PATH lookup.
    pub fn binary_name(&self) -> &'static str {
        match self {
            SolverKind::Z3 => "z3",
            SolverKind::Cvc5 => "cvc5",
        }
    }

    /// Installation directories checked when PATH lookup fails.
    fn fallback_dirs(&self) -> &'static [&'static str] {
        &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"]
    }

    /// Arguments that make the solver read a script from stdin.
    pub fn stdin_args(&self) -> Vec<String> {
        match self {
            SolverKind::Z3 => vec!["-in".to_string()],
            SolverKind::Cvc5 => vec![
                "--lang".to_string(),
                "smt2".to_string(),
                "--produce-models".to_string(),
            ],
        }
    }

    /// The solver's own per-query timeout flag, if any.
    pub fn timeout_arg(&self, timeout_ms: u64) -> Option<String> {
        if timeout_ms == 0 {
            return None;
        }
        match self {
            SolverKind::Z3 => Some(format!("-t:{timeout_ms}")),
            SolverKind::Cvc5 => Some(format!("--tlimit-per={timeout_ms}")),
        }
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverKind::Z3 => write!(f, "Z3"),
            SolverKind::Cvc5 => write!(f, "CVC5"),
        }
    }
}

impl std::str::FromStr for SolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "z3" => Ok(SolverKind::Z3),
            "cvc5" => Ok(SolverKind::Cvc5),
            _ => Err(format!("Unknown solver: {s}. Valid options: z3, cvc5")),
        }
    }
}

/// Solver process configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Which solver to run.
    pub kind: SolverKind,
    /// Path to the solver binary.
    pub solver_path: PathBuf,
    /// Per-query timeout in milliseconds (0 = no timeout).
    pub timeout_ms: u64,
    /// Additional solver arguments.
    pub extra_args: Vec<String>,
}

impl SolverConfig {
    pub fn new(kind: SolverKind, solver_path: PathBuf) -> Self {
        Self {
            kind,
            solver_path,
            timeout_ms: 0,
            extra_args: Vec::new(),
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Locate the solver binary for `kind`.
    ///
    /// Searches the directories on `PATH`, then a few common install
    /// locations.
    pub fn auto_detect_for(kind: SolverKind) -> Result<Self, SolverError> {
        let binary = kind.binary_name();

        let path_dirs = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect::<Vec<_>>())
            .unwrap_or_default();
        let fallback = kind.fallback_dirs().iter().map(PathBuf::from);

        path_dirs
            .into_iter()
            .chain(fallback)
            .map(|dir| dir.join(binary))
            .find(|candidate| is_executable_file(candidate))
            .map(|path| Self::new(kind, path))
            .ok_or_else(|| SolverError::NotFound {
                kind,
                path: PathBuf::from(binary),
            })
    }

    /// Locate Z3.
    pub fn auto_detect() -> Result<Self, SolverError> {
        Self::auto_detect_for(SolverKind::Z3)
    }

    /// Full argument list for one invocation.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.kind.stdin_args();
        if let Some(timeout_arg) = self.kind.timeout_arg(self.timeout_ms) {
            args.push(timeout_arg);
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Wall-clock budget after which an in-flight query is killed.
    pub fn kill_after(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms + KILL_GRACE_MS))
    }

    /// Check that the configured solver binary exists.
    pub fn validate(&self) -> Result<(), SolverError> {
        if !self.solver_path.exists() {
            return Err(SolverError::NotFound {
                kind: self.kind,
                path: self.solver_path.clone(),
            });
        }
        Ok(())
    }
}

fn is_executable_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_has_no_timeout() {
        let config = SolverConfig::new(SolverKind::Z3, PathBuf::from("/usr/bin/z3"));
        assert_eq!(config.timeout_ms, 0);
        assert!(config.extra_args.is_empty());
        assert_eq!(config.kill_after(), None);
    }

    #[test]
    fn kill_after_adds_grace() {
        let config =
            SolverConfig::new(SolverKind::Z3, PathBuf::from("/usr/bin/z3")).with_timeout(2000);
        assert_eq!(config.kill_after(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn build_args_z3() {
        let config = SolverConfig::new(SolverKind::Z3, PathBuf::from("/usr/bin/z3"))
            .with_timeout(3000)
            .with_extra_args(vec!["-v:1".to_string()]);
        assert_eq!(config.build_args(), vec!["-in", "-t:3000", "-v:1"]);
    }

    #[test]
    fn build_args_cvc5() {
        let config =
            SolverConfig::new(SolverKind::Cvc5, PathBuf::from("/usr/bin/cvc5")).with_timeout(10);
        let args = config.build_args();
        assert!(args.contains(&"--produce-models".to_string()));
        assert!(args.contains(&"--tlimit-per=10".to_string()));
    }

    #[test]
    fn validate_missing_binary() {
        let config = SolverConfig::new(SolverKind::Z3, PathBuf::from("/nonexistent/z3"));
        assert_eq!(
            config.validate().unwrap_err(),
            SolverError::NotFound {
                kind: SolverKind::Z3,
                path: PathBuf::from("/nonexistent/z3"),
            }
        );
    }

    #[test]
    fn solver_kind_round_trips_through_str() {
        assert_eq!("z3".parse::<SolverKind>().unwrap(), SolverKind::Z3);
        assert_eq!("CVC5".parse::<SolverKind>().unwrap(), SolverKind::Cvc5);
        assert!("yices".parse::<SolverKind>().is_err());
        assert_eq!(SolverKind::Cvc5.to_string(), "CVC5");
    }

    #[test]
    fn no_timeout_flag_for_zero() {
        assert_eq!(SolverKind::Z3.timeout_arg(0), None);
        assert_eq!(SolverKind::Cvc5.timeout_arg(0), None);
    }
}
