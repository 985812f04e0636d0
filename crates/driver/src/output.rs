//! Colored text reports.
//!
//! One line per obligation, color-coded by outcome:
//!   [OK]      assertion at 3:1 (green)
//!   [FAIL]    division by zero at 1:1 (x = 0; reproduced by execution) (red)
//!   [UNKNOWN] assertion at 2:1 (timeout) (yellow)
//! followed by unrolling notes and a summary line.

use std::collections::BTreeMap;
use std::fmt::Write;

use colored::{ColoredString, Colorize};
use minilang_fv_analysis::verdict::display_value;
use minilang_fv_analysis::{
    AssertionReport, AssertionVerdict, Counterexample, EquivalenceReport, EquivalenceVerdict,
    Failure, ObligationOutcome, PairReport, ProgramEncoding, SsaProgram, UnrollCaveat,
};
use minilang_fv_solver::ModelValue;

fn ok() -> ColoredString {
    format!("{:<9}", "[OK]").as_str().green().bold()
}

fn fail() -> ColoredString {
    format!("{:<9}", "[FAIL]").as_str().red().bold()
}

fn unknown() -> ColoredString {
    format!("{:<9}", "[UNKNOWN]").as_str().yellow().bold()
}

fn replay_note(confirmed: Option<bool>) -> &'static str {
    match confirmed {
        Some(true) => "reproduced by execution",
        Some(false) => "not reproduced by execution",
        None => "replay inconclusive",
    }
}

fn values(map: &BTreeMap<String, ModelValue>) -> String {
    map.iter()
        .map(|(name, value)| format!("{name} = {}", display_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn failure_detail(failure: &Failure) -> String {
    let note = replay_note(failure.confirmed);
    if failure.inputs.is_empty() {
        note.to_string()
    } else {
        format!("{}; {note}", values(&failure.inputs))
    }
}

fn caveat_note(out: &mut String, label: &str, caveat: &UnrollCaveat) {
    if !caveat.is_empty() {
        let _ = writeln!(out, "  {} {label}{caveat}", "note:".yellow());
    }
}

/// Report of a single-program check.
///
/// ```text
/// Checking prog.json
///   [OK]      assertion at 3:1
///   [FAIL]    division by zero at 1:1 (x = 0; reproduced by execution)
///
/// Summary: 1 OK, 1 FAIL => violated (1 failing obligation(s))
/// ```
pub fn render_assertions(title: &str, report: &AssertionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("Checking {title}").as_str().bold());

    if report.obligations.is_empty() {
        let _ = writeln!(out, "  {}", "No assertions or divisions to check.".dimmed());
    }
    for result in &report.obligations {
        let site = format!("{} at {}", result.kind, result.loc);
        match &result.outcome {
            ObligationOutcome::Proved => {
                let _ = writeln!(out, "  {}  {site}", ok());
            }
            ObligationOutcome::Failed { failure } => {
                let _ = writeln!(out, "  {}  {site} ({})", fail(), failure_detail(failure));
            }
            ObligationOutcome::Unknown { reason } => {
                let _ = writeln!(out, "  {}  {site} ({reason})", unknown());
            }
        }
    }
    caveat_note(&mut out, "", &report.caveat);

    let proved = report.obligations.iter().filter(|r| r.is_proved()).count();
    let failed = report
        .obligations
        .iter()
        .filter(|r| matches!(r.outcome, ObligationOutcome::Failed { .. }))
        .count();
    let undecided = report.obligations.len() - proved - failed;

    let mut parts = Vec::new();
    if proved > 0 {
        parts.push(format!("{proved} {}", "OK".green()));
    }
    if failed > 0 {
        parts.push(format!("{failed} {}", "FAIL".red()));
    }
    if undecided > 0 {
        parts.push(format!("{undecided} {}", "UNKNOWN".yellow()));
    }
    let verdict = match &report.verdict {
        AssertionVerdict::Holds => report.verdict.to_string().as_str().green(),
        AssertionVerdict::Violated { .. } => report.verdict.to_string().as_str().red(),
        AssertionVerdict::Unknown { .. } => report.verdict.to_string().as_str().yellow(),
    };
    let _ = writeln!(out);
    if parts.is_empty() {
        let _ = writeln!(out, "Summary: {verdict}");
    } else {
        let _ = writeln!(out, "Summary: {} => {verdict}", parts.join(", "));
    }
    out
}

fn counterexample_lines(out: &mut String, cex: &Counterexample) {
    if !cex.shared_inputs.is_empty() {
        let _ = writeln!(out, "      inputs: {}", values(&cex.shared_inputs));
    }
    if !cex.inputs_a.is_empty() {
        let _ = writeln!(out, "      inputs of A only: {}", values(&cex.inputs_a));
    }
    if !cex.inputs_b.is_empty() {
        let _ = writeln!(out, "      inputs of B only: {}", values(&cex.inputs_b));
    }
    let show = |v: &Option<ModelValue>| v.as_ref().map_or("?".to_string(), display_value);
    for output in cex.outputs.iter().filter(|o| o.differs()) {
        let _ = writeln!(
            out,
            "      {}: A = {}, B = {}",
            output.name,
            show(&output.a),
            show(&output.b)
        );
    }
}

/// Report of a two-program equivalence check.
pub fn render_equivalence(title: &str, report: &EquivalenceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("Comparing {title}").as_str().bold());
    let compared = report.outputs.join(", ");

    match &report.verdict {
        EquivalenceVerdict::Equivalent => {
            let _ = writeln!(out, "  {}  programs agree on {compared}", ok());
        }
        EquivalenceVerdict::NotEquivalent { counterexample } => {
            let _ = writeln!(
                out,
                "  {}  programs disagree ({})",
                fail(),
                replay_note(counterexample.confirmed)
            );
            counterexample_lines(&mut out, counterexample);
        }
        EquivalenceVerdict::DivisionUnsafe { failures } => {
            let _ = writeln!(
                out,
                "  {}  a division may fail, outputs are not defined for every input",
                fail()
            );
            for failure in failures {
                let _ = writeln!(out, "      {failure} ({})", replay_note(failure.confirmed));
            }
        }
        EquivalenceVerdict::Unknown { reason } => {
            let _ = writeln!(out, "  {}  {reason}", unknown());
        }
    }
    caveat_note(&mut out, "program A: ", &report.caveat_a);
    caveat_note(&mut out, "program B: ", &report.caveat_b);

    let verdict = match &report.verdict {
        EquivalenceVerdict::Equivalent => "equivalent".green(),
        EquivalenceVerdict::NotEquivalent { .. } => "not equivalent".red(),
        EquivalenceVerdict::DivisionUnsafe { .. } => "division unsafe".red(),
        EquivalenceVerdict::Unknown { .. } => "unknown".yellow(),
    };
    let _ = writeln!(out);
    let _ = writeln!(out, "Summary: {verdict} (outputs: {compared})");
    out
}

pub fn render_pair(title_a: &str, title_b: &str, report: &PairReport) -> String {
    let mut out = render_assertions(title_a, &report.assertions_a);
    out.push('\n');
    out.push_str(&render_assertions(title_b, &report.assertions_b));
    out.push('\n');
    out.push_str(&render_equivalence(
        &format!("{title_a} and {title_b}"),
        &report.equivalence,
    ));
    out
}

/// SSA listing followed by the SMT-LIB text with one push/pop block per
/// obligation.
pub fn render_dump(ssa: &SsaProgram, encoding: &ProgramEncoding) -> String {
    let mut out = String::new();
    let _ = writeln!(out, ";; ---- SSA ----");
    for line in ssa.to_string().lines() {
        let _ = writeln!(out, ";; {line}");
    }
    let _ = writeln!(out, ";; ---- SMT-LIB ----");
    out.push_str(&encoding.dump());
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use minilang_fv_analysis::verdict::OutputValues;
    use minilang_fv_analysis::{Location, ObligationKind, ObligationResult};

    fn failure(confirmed: Option<bool>) -> Failure {
        Failure {
            kind: ObligationKind::DivisionSafe,
            loc: Location::new(1, 1),
            side: None,
            inputs: BTreeMap::from([("x".to_string(), ModelValue::Int(0))]),
            confirmed,
        }
    }

    fn result(kind: ObligationKind, line: u32, outcome: ObligationOutcome) -> ObligationResult {
        ObligationResult {
            kind,
            loc: Location::new(line, 1),
            outcome,
        }
    }

    #[test]
    fn test_render_assertions_mixed() {
        let report = AssertionReport::new(
            vec![
                result(
                    ObligationKind::DivisionSafe,
                    1,
                    ObligationOutcome::Failed {
                        failure: failure(Some(true)),
                    },
                ),
                result(ObligationKind::Assert, 2, ObligationOutcome::Proved),
                result(
                    ObligationKind::Assert,
                    3,
                    ObligationOutcome::Unknown {
                        reason: "timeout".into(),
                    },
                ),
            ],
            UnrollCaveat::default(),
        );
        let text = render_assertions("prog.json", &report);
        assert!(text.contains("Checking prog.json"));
        assert!(text.contains("[FAIL]"));
        assert!(text.contains("division by zero at 1:1 (x = 0; reproduced by execution)"));
        assert!(text.contains("assertion at 2:1"));
        assert!(text.contains("assertion at 3:1 (timeout)"));
        assert!(text.contains("violated"));
        assert!(!text.contains("note:"));
    }

    #[test]
    fn test_render_assertions_empty_program() {
        let report = AssertionReport::new(vec![], UnrollCaveat::default());
        let text = render_assertions("empty.json", &report);
        assert!(text.contains("No assertions or divisions to check."));
        assert!(text.contains("holds"));
    }

    #[test]
    fn test_render_assertions_caveat() {
        let caveat = UnrollCaveat {
            bound: 2,
            loops: vec![Location::new(4, 1)],
        };
        let report = AssertionReport::new(
            vec![result(ObligationKind::Assert, 5, ObligationOutcome::Proved)],
            caveat,
        );
        let text = render_assertions("loop.json", &report);
        assert!(text.contains("verified up to 2 iterations of the loop(s) at 4:1"));
    }

    #[test]
    fn test_render_not_equivalent() {
        let report = EquivalenceReport {
            verdict: EquivalenceVerdict::NotEquivalent {
                counterexample: Counterexample {
                    shared_inputs: BTreeMap::from([("n".to_string(), ModelValue::Int(1))]),
                    outputs: vec![
                        OutputValues {
                            name: "h".into(),
                            a: Some(ModelValue::Int(0)),
                            b: Some(ModelValue::Int(1)),
                        },
                        OutputValues {
                            name: "k".into(),
                            a: Some(ModelValue::Int(5)),
                            b: Some(ModelValue::Int(5)),
                        },
                    ],
                    confirmed: Some(true),
                    ..Counterexample::default()
                },
            },
            outputs: vec!["h".into(), "k".into()],
            caveat_a: UnrollCaveat::default(),
            caveat_b: UnrollCaveat::default(),
        };
        let text = render_equivalence("a.json and b.json", &report);
        assert!(text.contains("programs disagree (reproduced by execution)"));
        assert!(text.contains("inputs: n = 1"));
        assert!(text.contains("h: A = 0, B = 1"));
        assert!(!text.contains("k: A"));
        assert!(text.contains("(outputs: h, k)"));
    }

    #[test]
    fn test_render_division_unsafe_lists_failures() {
        let mut f = failure(None);
        f.side = Some(minilang_fv_analysis::Side::B);
        let report = EquivalenceReport {
            verdict: EquivalenceVerdict::DivisionUnsafe { failures: vec![f] },
            outputs: vec!["y".into()],
            caveat_a: UnrollCaveat::default(),
            caveat_b: UnrollCaveat {
                bound: 1,
                loops: vec![Location::new(2, 3)],
            },
        };
        let text = render_equivalence("a and b", &report);
        assert!(text.contains("program B: division by zero may fail at 1:1 with x = 0"));
        assert!(text.contains("replay inconclusive"));
        assert!(text.contains("program B: verified up to 1 iterations"));
        assert!(text.contains("division unsafe"));
    }
}
