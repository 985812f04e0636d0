use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use minilang_fv_smtlib::Script;

use crate::config::{SolverConfig, SolverKind};
use crate::error::SolverError;
use crate::parser::parse_solver_output;
use crate::result::SolverResult;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// SMT solver driven as a subprocess.
///
/// Each query spawns the configured solver, pipes SMT-LIB2 text to its
/// stdin, and parses stdout. When a timeout is configured the process is
/// killed once the wall-clock deadline passes and the query answers
/// `Unknown("timeout")`.
#[derive(Debug, Clone)]
pub struct CliSolver {
    config: SolverConfig,
}

impl CliSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Auto-detected Z3 with default settings.
    pub fn with_default_config() -> Result<Self, SolverError> {
        Self::with_default_config_for(SolverKind::Z3)
    }

    pub fn with_default_config_for(kind: SolverKind) -> Result<Self, SolverError> {
        Ok(Self::new(SolverConfig::auto_detect_for(kind)?))
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Check satisfiability of a script.
    ///
    /// `(check-sat)` and `(get-model)` are appended when missing.
    pub fn check_sat(&self, script: &Script) -> Result<SolverResult, SolverError> {
        let mut script = script.clone();
        script.finish_query();
        self.check_sat_raw(&script.to_string())
    }

    /// Check satisfiability of raw SMT-LIB2 text.
    pub fn check_sat_raw(&self, smtlib: &str) -> Result<SolverResult, SolverError> {
        self.config.validate()?;
        let kind = self.config.kind;
        let args = self.config.build_args();
        tracing::debug!(solver = %kind, ?args, bytes = smtlib.len(), "spawning solver");

        let started = Instant::now();
        let mut child = Command::new(&self.config.solver_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SolverError::ProcessError(format!("Failed to start {kind}: {e}")))?;

        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_reader = spawn_reader(child.stderr.take());

        // Dropping stdin closes the pipe so the solver sees end of input.
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| SolverError::ProcessError(format!("Failed to open {kind} stdin")))?;
            if let Err(e) = stdin.write_all(smtlib.as_bytes()) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SolverError::ProcessError(format!(
                    "Failed to write to {kind} stdin: {e}"
                )));
            }
        }

        let finished = wait_with_deadline(&mut child, self.config.kill_after())?;
        let stdout = join_reader(stdout_reader)?;
        let stderr = join_reader(stderr_reader)?;
        let elapsed_ms = started.elapsed().as_millis();

        if !finished {
            tracing::warn!(solver = %kind, elapsed_ms, "solver killed after deadline");
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }

        if stdout.trim() == "timeout" {
            return Ok(SolverResult::Unknown("timeout".to_string()));
        }

        let result = parse_solver_output(&stdout, &stderr)?;
        tracing::debug!(solver = %kind, elapsed_ms, status = result.status_name(), "solver answered");
        Ok(result)
    }
}

/// Wait for `child`, killing it once `limit` elapses.
///
/// Returns `false` if the process had to be killed.
fn wait_with_deadline(child: &mut Child, limit: Option<Duration>) -> Result<bool, SolverError> {
    let wait_err = |e: std::io::Error| SolverError::ProcessError(format!("Failed to wait for solver: {e}"));
    let Some(limit) = limit else {
        child.wait().map_err(wait_err)?;
        return Ok(true);
    };

    let deadline = Instant::now() + limit;
    loop {
        if child.try_wait().map_err(wait_err)?.is_some() {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            // The process may exit between try_wait and kill; both are fine.
            let _ = child.kill();
            child.wait().map_err(wait_err)?;
            return Ok(false);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_string(&mut buf)?;
        }
        Ok(buf)
    })
}

fn join_reader(handle: JoinHandle<std::io::Result<String>>) -> Result<String, SolverError> {
    handle
        .join()
        .map_err(|_| SolverError::ProcessError("solver output reader panicked".to_string()))?
        .map_err(|e| SolverError::ProcessError(format!("Failed to read solver output: {e}")))
}
