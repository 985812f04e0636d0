//! Command-line arguments and how they combine with a config file.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use minilang_fv_analysis::VerifyConfig;
use minilang_fv_solver::{SolverConfig, SolverKind};

use crate::error::DriverError;

#[derive(Debug, Parser)]
#[command(name = "minilang-fv")]
#[command(about = "Bounded assertion and equivalence checking for minilang programs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check every `verify(..)` and every division of one program.
    Check {
        /// Program AST as JSON.
        program: PathBuf,
        #[command(flatten)]
        opts: VerifyOpts,
    },
    /// Check that two programs compute the same outputs.
    Equiv {
        a: PathBuf,
        b: PathBuf,
        /// Also check the assertions of both programs.
        #[arg(long)]
        with_assertions: bool,
        #[command(flatten)]
        opts: VerifyOpts,
    },
    /// Print the SSA form and the SMT-LIB encoding of a program.
    Dump {
        program: PathBuf,
        /// Loop unrolling bound.
        #[arg(long)]
        unroll: Option<u32>,
        /// Configuration file (JSON).
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SolverArg {
    #[default]
    Z3,
    Cvc5,
}

impl From<SolverArg> for SolverKind {
    fn from(arg: SolverArg) -> Self {
        match arg {
            SolverArg::Z3 => SolverKind::Z3,
            SolverArg::Cvc5 => SolverKind::Cvc5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Options shared by the commands that run a solver.
#[derive(Debug, Clone, Default, Args)]
pub struct VerifyOpts {
    /// Loop unrolling bound.
    #[arg(long)]
    pub unroll: Option<u32>,
    /// Per-query solver timeout in milliseconds (0 = none).
    #[arg(long)]
    pub timeout: Option<u64>,
    #[arg(long, value_enum, default_value_t = SolverArg::Z3)]
    pub solver: SolverArg,
    /// Solver binary; looked up on PATH when absent.
    #[arg(long)]
    pub solver_path: Option<PathBuf>,
    /// Output variables compared by `equiv`, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub outputs: Option<Vec<String>>,
    /// Configuration file (JSON). Flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl VerifyOpts {
    /// The config file (or the defaults) with every given flag applied.
    pub fn verify_config(&self) -> Result<VerifyConfig, DriverError> {
        let mut config = base_config(self.config.as_deref())?;
        if let Some(bound) = self.unroll {
            config.unroll_bound = bound;
        }
        if let Some(timeout) = self.timeout {
            config.solver_timeout_ms = timeout;
        }
        if let Some(outputs) = &self.outputs {
            config.output_variables = Some(outputs.clone());
        }
        config.validate()?;
        Ok(config)
    }

    pub fn solver_config(&self) -> Result<SolverConfig, DriverError> {
        let kind = SolverKind::from(self.solver);
        match &self.solver_path {
            Some(path) => Ok(SolverConfig::new(kind, path.clone())),
            None => Ok(SolverConfig::auto_detect_for(kind)?),
        }
    }
}

/// Configuration for `dump`, which never talks to a solver.
pub fn dump_config(unroll: Option<u32>, file: Option<&Path>) -> Result<VerifyConfig, DriverError> {
    let mut config = base_config(file)?;
    if let Some(bound) = unroll {
        config.unroll_bound = bound;
    }
    config.validate()?;
    Ok(config)
}

fn base_config(file: Option<&Path>) -> Result<VerifyConfig, DriverError> {
    let Some(path) = file else {
        return Ok(VerifyConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    VerifyConfig::from_json(&text).map_err(|e| DriverError::InvalidConfig {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("minilang-fv").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_check_defaults() {
        let Command::Check { program, opts } = parse(&["check", "p.json"]).command else {
            panic!("expected check");
        };
        assert_eq!(program, PathBuf::from("p.json"));
        assert_eq!(opts.solver, SolverArg::Z3);
        assert_eq!(opts.format, OutputFormat::Text);
        assert_eq!(opts.verify_config().unwrap(), VerifyConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let Command::Equiv { opts, with_assertions, .. } = parse(&[
            "equiv", "a.json", "b.json", "--unroll", "3", "--timeout", "500", "--outputs",
            "x,y", "--solver", "cvc5", "--format", "json",
        ])
        .command
        else {
            panic!("expected equiv");
        };
        assert!(!with_assertions);
        assert_eq!(opts.solver, SolverArg::Cvc5);
        assert_eq!(opts.format, OutputFormat::Json);
        let config = opts.verify_config().unwrap();
        assert_eq!(config.unroll_bound, 3);
        assert_eq!(config.solver_timeout_ms, 500);
        assert_eq!(
            config.output_variables,
            Some(vec!["x".to_string(), "y".to_string()])
        );
    }

    #[test]
    fn test_zero_unroll_is_rejected() {
        let Command::Check { opts, .. } = parse(&["check", "p.json", "--unroll", "0"]).command
        else {
            panic!("expected check");
        };
        assert!(matches!(opts.verify_config(), Err(DriverError::Verify(_))));
    }

    #[test]
    fn test_explicit_solver_path_skips_detection() {
        let opts = VerifyOpts {
            solver: SolverArg::Cvc5,
            solver_path: Some(PathBuf::from("/opt/cvc5/bin/cvc5")),
            ..VerifyOpts::default()
        };
        let solver = opts.solver_config().unwrap();
        assert_eq!(solver.kind, SolverKind::Cvc5);
        assert_eq!(solver.solver_path, PathBuf::from("/opt/cvc5/bin/cvc5"));
    }

    #[test]
    fn test_missing_config_file() {
        let err = dump_config(None, Some(Path::new("/nonexistent/fv.json"))).unwrap_err();
        assert!(matches!(err, DriverError::Io { .. }));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["minilang-fv", "prove", "p.json"]).is_err());
    }
}
