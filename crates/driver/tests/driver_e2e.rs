//! Driver tests over program files on disk.
//!
//! Tests that run a solver return early when Z3 is not installed.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use minilang_fv_analysis::VerifyConfig;
use minilang_fv_driver::cli::{Cli, Command, OutputFormat, VerifyOpts};
use minilang_fv_driver::commands::{self, Outcome};
use minilang_fv_driver::error::DriverError;
use minilang_fv_driver::output;
use minilang_fv_solver::SolverConfig;

/// `y := 10 / x; verify(y > 0)`
const DIVIDE: &str = r#"{
  "inputs": [{ "name": "x" }],
  "body": [
    { "kind": "assign", "target": "y",
      "value": { "kind": "arith", "op": "/",
                 "lhs": { "kind": "int", "value": 10 },
                 "rhs": { "kind": "var", "name": "x" } },
      "loc": { "line": 1, "column": 1 } },
    { "kind": "assert",
      "cond": { "kind": "cmp", "op": ">",
                "lhs": { "kind": "var", "name": "y" },
                "rhs": { "kind": "int", "value": 0 } },
      "loc": { "line": 2, "column": 1 } }
  ]
}"#;

/// `z := x + x`
const DOUBLE_ADD: &str = r#"{
  "inputs": [{ "name": "x" }],
  "body": [
    { "kind": "assign", "target": "z",
      "value": { "kind": "arith", "op": "+",
                 "lhs": { "kind": "var", "name": "x" },
                 "rhs": { "kind": "var", "name": "x" } } }
  ]
}"#;

/// `z := 2 * x`
const DOUBLE_MUL: &str = r#"{
  "inputs": [{ "name": "x" }],
  "body": [
    { "kind": "assign", "target": "z",
      "value": { "kind": "arith", "op": "*",
                 "lhs": { "kind": "int", "value": 2 },
                 "rhs": { "kind": "var", "name": "x" } } }
  ]
}"#;

/// Create a unique, empty temporary directory for one test.
fn temp_dir(test_name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push(format!("minilang-fv-driver-{}-{}", test_name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn verifier() -> Option<minilang_fv_analysis::Verifier> {
    let solver = match SolverConfig::auto_detect() {
        Ok(solver) => solver,
        Err(e) => {
            eprintln!("skipping: {e}");
            return None;
        }
    };
    Some(minilang_fv_analysis::Verifier::with_solver(solver, VerifyConfig::default()).unwrap())
}

#[test]
fn test_load_program_from_json() {
    let dir = temp_dir("load");
    let program = commands::load_program(&write(&dir, "p.json", DIVIDE)).unwrap();
    assert_eq!(program.inputs.len(), 1);
    assert_eq!(program.body.len(), 2);
}

#[test]
fn test_invalid_program_is_reported_with_path() {
    let dir = temp_dir("invalid");
    let path = write(&dir, "bad.json", r#"{ "body": [{ "kind": "goto" }] }"#);
    let err = commands::load_program(&path).unwrap_err();
    assert!(matches!(err, DriverError::InvalidProgram { .. }));
    assert!(err.to_string().contains("bad.json"));
    assert_eq!(err.kind(), "invalid_program");
}

#[test]
fn test_dump_needs_no_solver() {
    let dir = temp_dir("dump");
    let path = write(&dir, "p.json", DIVIDE);
    let (ssa, encoding) = commands::dump(&path, &VerifyConfig::default()).unwrap();
    let text = output::render_dump(&ssa, &encoding);
    assert!(text.contains(";; input x@0 : scalar"));
    assert!(text.contains("(declare-const x@0 Int)"));
    assert!(text.contains(";; division by zero at 1:1"));
    assert!(text.contains(";; assertion at 2:1"));
    assert_eq!(text.matches("(push 1)").count(), 2);
}

#[test]
fn test_dump_reports_build_errors() {
    let dir = temp_dir("dump-err");
    let path = write(
        &dir,
        "p.json",
        r#"{ "body": [{ "kind": "assign", "target": "y",
                        "value": { "kind": "var", "name": "ghost" } }] }"#,
    );
    let err = commands::dump(&path, &VerifyConfig::default()).unwrap_err();
    assert!(matches!(err, DriverError::Verify(_)));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn test_config_file_with_flag_override() {
    let dir = temp_dir("config");
    let config = write(
        &dir,
        "fv.json",
        r#"{ "unrollBound": 4, "solverTimeoutMs": 2500, "outputVariables": ["z"] }"#,
    );
    let cli = Cli::try_parse_from([
        "minilang-fv",
        "check",
        "p.json",
        "--config",
        config.to_str().unwrap(),
        "--unroll",
        "7",
    ])
    .unwrap();
    let Command::Check { opts, .. } = cli.command else {
        panic!("expected check");
    };
    let resolved = opts.verify_config().unwrap();
    assert_eq!(resolved.unroll_bound, 7);
    assert_eq!(resolved.solver_timeout_ms, 2500);
    assert_eq!(resolved.output_variables, Some(vec!["z".to_string()]));
}

#[test]
fn test_malformed_config_file() {
    let dir = temp_dir("bad-config");
    let config = write(&dir, "fv.json", r#"{ "unrollBound": "many" }"#);
    let opts = VerifyOpts {
        config: Some(config),
        ..VerifyOpts::default()
    };
    let err = opts.verify_config().unwrap_err();
    assert!(matches!(err, DriverError::InvalidConfig { .. }));
    assert_eq!(err.kind(), "invalid_config");
}

#[test]
fn test_check_division_is_refuted() {
    let Some(v) = verifier() else { return };
    let dir = temp_dir("check");
    let path = write(&dir, "p.json", DIVIDE);
    let outcome = commands::check(&v, &path, OutputFormat::Json).unwrap();
    assert_eq!(outcome, Outcome::Refuted);
}

#[test]
fn test_equiv_rewrites_are_verified() {
    let Some(v) = verifier() else { return };
    let dir = temp_dir("equiv");
    let a = write(&dir, "a.json", DOUBLE_ADD);
    let b = write(&dir, "b.json", DOUBLE_MUL);
    assert_eq!(
        commands::equiv(&v, &a, &b, false, OutputFormat::Text).unwrap(),
        Outcome::Verified
    );
    assert_eq!(
        commands::equiv(&v, &a, &b, true, OutputFormat::Json).unwrap(),
        Outcome::Verified
    );
}

#[test]
fn test_equiv_without_common_outputs_is_an_error() {
    let Some(v) = verifier() else { return };
    let dir = temp_dir("equiv-div");
    let a = write(&dir, "a.json", DOUBLE_ADD);
    let b = write(&dir, "b.json", DIVIDE);
    // No common output: `z` versus `y`.
    let err = commands::equiv(&v, &a, &b, false, OutputFormat::Text).unwrap_err();
    assert!(matches!(err, DriverError::Verify(_)));
}
