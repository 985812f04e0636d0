//! Machine-readable reports for `--format json`.
//!
//! The report goes to stdout as one pretty-printed JSON document; logs and
//! progress stay on stderr.

use minilang_fv_analysis::{
    AssertionReport, EquivalenceReport, ObligationOutcome, PairReport, ProgramEncoding,
    SsaProgram,
};
use serde::Serialize;

use crate::error::DriverError;

/// Obligation counts of an assertion check.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct JsonSummary {
    pub total: usize,
    pub proved: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl JsonSummary {
    pub fn of(report: &AssertionReport) -> Self {
        let mut summary = JsonSummary {
            total: report.obligations.len(),
            proved: 0,
            failed: 0,
            unknown: 0,
        };
        for result in &report.obligations {
            match result.outcome {
                ObligationOutcome::Proved => summary.proved += 1,
                ObligationOutcome::Failed { .. } => summary.failed += 1,
                ObligationOutcome::Unknown { .. } => summary.unknown += 1,
            }
        }
        summary
    }
}

#[derive(Serialize)]
pub struct JsonCheckReport<'a> {
    pub program: String,
    pub solver: String,
    pub unroll_bound: u32,
    #[serde(flatten)]
    pub report: &'a AssertionReport,
    pub summary: JsonSummary,
}

#[derive(Serialize)]
pub struct JsonEquivReport<'a> {
    pub program_a: String,
    pub program_b: String,
    pub solver: String,
    pub unroll_bound: u32,
    #[serde(flatten)]
    pub report: &'a EquivalenceReport,
}

#[derive(Serialize)]
pub struct JsonPairReport<'a> {
    pub program_a: String,
    pub program_b: String,
    pub solver: String,
    pub unroll_bound: u32,
    #[serde(flatten)]
    pub report: &'a PairReport,
}

#[derive(Serialize)]
pub struct JsonDump {
    pub program: String,
    pub ssa: String,
    pub smt: String,
}

impl JsonDump {
    pub fn new(program: String, ssa: &SsaProgram, encoding: &ProgramEncoding) -> Self {
        Self {
            program,
            ssa: ssa.to_string(),
            smt: encoding.dump(),
        }
    }
}

#[derive(Serialize)]
pub struct JsonError {
    pub error: &'static str,
    pub message: String,
}

impl From<&DriverError> for JsonError {
    fn from(err: &DriverError) -> Self {
        Self {
            error: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Print a JSON document to stdout.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("[minilang-fv] error serializing JSON report: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minilang_fv_analysis::verdict::Failure;
    use minilang_fv_analysis::{
        EquivalenceVerdict, Location, ObligationKind, ObligationResult, UnrollCaveat, VerifyError,
    };
    use std::collections::BTreeMap;

    fn result(line: u32, outcome: ObligationOutcome) -> ObligationResult {
        ObligationResult {
            kind: ObligationKind::Assert,
            loc: Location::new(line, 1),
            outcome,
        }
    }

    fn sample_report() -> AssertionReport {
        AssertionReport::new(
            vec![
                result(1, ObligationOutcome::Proved),
                result(
                    2,
                    ObligationOutcome::Failed {
                        failure: Failure {
                            kind: ObligationKind::Assert,
                            loc: Location::new(2, 1),
                            side: None,
                            inputs: BTreeMap::new(),
                            confirmed: Some(true),
                        },
                    },
                ),
                result(
                    3,
                    ObligationOutcome::Unknown {
                        reason: "timeout".into(),
                    },
                ),
            ],
            UnrollCaveat::default(),
        )
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let summary = JsonSummary::of(&sample_report());
        assert_eq!(
            summary,
            JsonSummary {
                total: 3,
                proved: 1,
                failed: 1,
                unknown: 1
            }
        );
    }

    #[test]
    fn test_check_report_flattens_assertion_report() {
        let report = sample_report();
        let json = JsonCheckReport {
            program: "p.json".into(),
            solver: "z3".into(),
            unroll_bound: 10,
            summary: JsonSummary::of(&report),
            report: &report,
        };
        let parsed = serde_json::to_value(&json).unwrap();
        assert_eq!(parsed["program"], "p.json");
        assert_eq!(parsed["unroll_bound"], 10);
        assert_eq!(parsed["verdict"]["status"], "violated");
        assert_eq!(parsed["obligations"][2]["result"], "unknown");
        assert_eq!(parsed["obligations"][2]["reason"], "timeout");
        assert_eq!(parsed["summary"]["failed"], 1);
    }

    #[test]
    fn test_equiv_report_serialization() {
        let report = EquivalenceReport {
            verdict: EquivalenceVerdict::Equivalent,
            outputs: vec!["z".into()],
            caveat_a: UnrollCaveat::default(),
            caveat_b: UnrollCaveat {
                bound: 3,
                loops: vec![Location::new(2, 1)],
            },
        };
        let json = JsonEquivReport {
            program_a: "a.json".into(),
            program_b: "b.json".into(),
            solver: "cvc5".into(),
            unroll_bound: 3,
            report: &report,
        };
        let parsed = serde_json::to_value(&json).unwrap();
        assert_eq!(parsed["verdict"]["status"], "equivalent");
        assert_eq!(parsed["outputs"], serde_json::json!(["z"]));
        assert_eq!(parsed["caveat_b"]["loops"][0]["line"], 2);
    }

    #[test]
    fn test_error_report() {
        let err = DriverError::Verify(VerifyError::Config("unroll bound must be at least 1".into()));
        let json = serde_json::to_value(JsonError::from(&err)).unwrap();
        assert_eq!(json["error"], "verification");
        assert!(json["message"].as_str().unwrap().contains("unroll bound"));
    }
}
