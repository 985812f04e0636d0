//! Subcommand execution.

use std::path::Path;
use std::process::ExitCode;

use minilang_fv_analysis::{
    AssertionVerdict, EquivalenceVerdict, Program, ProgramEncoding, SsaProgram, Verifier,
    VerifyConfig, VerifyError, build_ssa, encode,
};
use tracing::{debug, info};

use crate::cli::{Command, OutputFormat, VerifyOpts, dump_config};
use crate::error::DriverError;
use crate::json_output::{
    JsonCheckReport, JsonDump, JsonEquivReport, JsonPairReport, JsonSummary, print_json,
};
use crate::output;

/// What a finished run established, mapped onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every assertion holds, or the programs are equivalent.
    Verified,
    /// A failure or a difference was found.
    Refuted,
    /// At least one solver answer was `unknown`.
    Inconclusive,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Verified => ExitCode::SUCCESS,
            Outcome::Refuted => ExitCode::from(1),
            Outcome::Inconclusive => ExitCode::from(2),
        }
    }

    fn of_assertions(verdict: &AssertionVerdict) -> Self {
        match verdict {
            AssertionVerdict::Holds => Outcome::Verified,
            AssertionVerdict::Violated { .. } => Outcome::Refuted,
            AssertionVerdict::Unknown { .. } => Outcome::Inconclusive,
        }
    }

    fn of_equivalence(verdict: &EquivalenceVerdict) -> Self {
        match verdict {
            EquivalenceVerdict::Equivalent => Outcome::Verified,
            EquivalenceVerdict::NotEquivalent { .. } | EquivalenceVerdict::DivisionUnsafe { .. } => {
                Outcome::Refuted
            }
            EquivalenceVerdict::Unknown { .. } => Outcome::Inconclusive,
        }
    }

    /// The worst of two outcomes: refuted over inconclusive over verified.
    fn combine(self, other: Outcome) -> Outcome {
        match (self, other) {
            (Outcome::Refuted, _) | (_, Outcome::Refuted) => Outcome::Refuted,
            (Outcome::Inconclusive, _) | (_, Outcome::Inconclusive) => Outcome::Inconclusive,
            _ => Outcome::Verified,
        }
    }
}

/// Read and parse a program AST from a JSON file.
pub fn load_program(path: &Path) -> Result<Program, DriverError> {
    let text = std::fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| DriverError::InvalidProgram {
        path: path.to_path_buf(),
        source,
    })
}

fn verifier(opts: &VerifyOpts) -> Result<Verifier, DriverError> {
    let config = opts.verify_config()?;
    let solver = opts.solver_config()?;
    debug!(
        solver = %solver.kind,
        path = %solver.solver_path.display(),
        unroll_bound = config.unroll_bound,
        timeout_ms = config.solver_timeout_ms,
        "configured verifier"
    );
    Ok(Verifier::with_solver(solver, config)?)
}

pub fn run(command: &Command) -> Result<Outcome, DriverError> {
    match command {
        Command::Check { program, opts } => {
            let verifier = verifier(opts)?;
            check(&verifier, program, opts.format)
        }
        Command::Equiv {
            a,
            b,
            with_assertions,
            opts,
        } => {
            let verifier = verifier(opts)?;
            equiv(&verifier, a, b, *with_assertions, opts.format)
        }
        Command::Dump {
            program,
            unroll,
            config,
            format,
        } => {
            let config = dump_config(*unroll, config.as_deref())?;
            let (ssa, encoding) = dump(program, &config)?;
            match format {
                OutputFormat::Text => print!("{}", output::render_dump(&ssa, &encoding)),
                OutputFormat::Json => print_json(&JsonDump::new(
                    program.display().to_string(),
                    &ssa,
                    &encoding,
                )),
            }
            Ok(Outcome::Verified)
        }
    }
}

/// Assertion check of one program file.
pub fn check(verifier: &Verifier, path: &Path, format: OutputFormat) -> Result<Outcome, DriverError> {
    let program = load_program(path)?;
    info!(program = %path.display(), backend = %verifier.backend_name(), "checking assertions");
    let report = verifier.check_assertions(&program)?;
    let title = path.display().to_string();

    match format {
        OutputFormat::Text => print!("{}", output::render_assertions(&title, &report)),
        OutputFormat::Json => print_json(&JsonCheckReport {
            program: title,
            solver: verifier.backend_name(),
            unroll_bound: verifier.config().unroll_bound,
            summary: JsonSummary::of(&report),
            report: &report,
        }),
    }
    Ok(Outcome::of_assertions(&report.verdict))
}

/// Equivalence check of two program files, optionally with both programs'
/// assertion checks.
pub fn equiv(
    verifier: &Verifier,
    a: &Path,
    b: &Path,
    with_assertions: bool,
    format: OutputFormat,
) -> Result<Outcome, DriverError> {
    let program_a = load_program(a)?;
    let program_b = load_program(b)?;
    let (title_a, title_b) = (a.display().to_string(), b.display().to_string());
    info!(a = %title_a, b = %title_b, with_assertions, "checking equivalence");

    if with_assertions {
        let report = verifier.verify_pair(&program_a, &program_b)?;
        match format {
            OutputFormat::Text => print!("{}", output::render_pair(&title_a, &title_b, &report)),
            OutputFormat::Json => print_json(&JsonPairReport {
                program_a: title_a,
                program_b: title_b,
                solver: verifier.backend_name(),
                unroll_bound: verifier.config().unroll_bound,
                report: &report,
            }),
        }
        return Ok(Outcome::of_assertions(&report.assertions_a.verdict)
            .combine(Outcome::of_assertions(&report.assertions_b.verdict))
            .combine(Outcome::of_equivalence(&report.equivalence.verdict)));
    }

    let report = verifier.check_equivalence(&program_a, &program_b)?;
    match format {
        OutputFormat::Text => print!(
            "{}",
            output::render_equivalence(&format!("{title_a} and {title_b}"), &report)
        ),
        OutputFormat::Json => print_json(&JsonEquivReport {
            program_a: title_a,
            program_b: title_b,
            solver: verifier.backend_name(),
            unroll_bound: verifier.config().unroll_bound,
            report: &report,
        }),
    }
    Ok(Outcome::of_equivalence(&report.verdict))
}

/// SSA form and encoding of one program, without running a solver.
pub fn dump(
    path: &Path,
    config: &VerifyConfig,
) -> Result<(SsaProgram, ProgramEncoding), DriverError> {
    let program = load_program(path)?;
    let ssa = build_ssa(&program, config.unroll_bound).map_err(VerifyError::from)?;
    let encoding = encode(&ssa);
    Ok((ssa, encoding))
}
