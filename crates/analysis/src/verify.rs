//! Verification orchestrator.
//!
//! Turns programs into solver queries and solver answers into verdicts. A
//! goal holds when `encoding ∧ pc ∧ ¬cond` is unsatisfiable; a model of the
//! negation is a counterexample. Independent queries go to the backend in
//! parallel.

use std::collections::BTreeMap;

use minilang_fv_solver::{Model, ModelValue, SolverBackend, SolverConfig, SolverResult};
use rayon::prelude::*;

use crate::ast::Program;
use crate::builder::build_ssa;
use crate::concrete::{self, DEFAULT_FUEL, ExecError, Value};
use crate::config::VerifyConfig;
use crate::equivalence::{self, Composition, Output};
use crate::error::{BuildError, Side, VerifyError};
use crate::ssa::{ObligationKind, SsaProgram};
use crate::vcgen::{Goal, ProgramEncoding, encode};
use crate::verdict::{
    AssertionReport, Counterexample, EquivalenceReport, EquivalenceVerdict, Failure,
    ObligationOutcome, ObligationResult, PairReport,
};

/// Runs assertion and equivalence checks against one solver backend.
pub struct Verifier {
    backend: Box<dyn SolverBackend>,
    config: VerifyConfig,
}

/// A program translated and encoded, ready for queries.
struct Prepared<'p> {
    program: &'p Program,
    ssa: SsaProgram,
    encoding: ProgramEncoding,
}

impl Verifier {
    pub fn new(backend: Box<dyn SolverBackend>, config: VerifyConfig) -> Result<Self, VerifyError> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Subprocess backend for `solver`, with the configured per-query
    /// timeout.
    pub fn with_solver(solver: SolverConfig, config: VerifyConfig) -> Result<Self, VerifyError> {
        let solver = solver.with_timeout(config.solver_timeout_ms);
        let backend = minilang_fv_solver::create_backend(solver)?;
        Self::new(backend, config)
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn backend_name(&self) -> String {
        self.backend.name()
    }

    fn prepare<'p>(&self, program: &'p Program) -> Result<Prepared<'p>, BuildError> {
        let ssa = build_ssa(program, self.config.unroll_bound)?;
        let encoding = encode(&ssa);
        if !ssa.caveat.is_empty() {
            tracing::warn!(caveat = %ssa.caveat, "bounded unrolling");
        }
        Ok(Prepared {
            program,
            ssa,
            encoding,
        })
    }

    fn prepare_side<'p>(&self, side: Side, program: &'p Program) -> Result<Prepared<'p>, VerifyError> {
        self.prepare(program)
            .map_err(|source| VerifyError::BuildSide { side, source })
    }

    /// Check every assertion and division of `program`.
    pub fn check_assertions(&self, program: &Program) -> Result<AssertionReport, VerifyError> {
        let prepared = self.prepare(program)?;
        tracing::info!(
            goals = prepared.encoding.goals.len(),
            solver = %self.backend.name(),
            "checking assertions"
        );
        let results = self.check_goals(&prepared, None, |_| true)?;
        let report = AssertionReport::new(results, prepared.ssa.caveat.clone());
        tracing::info!(verdict = %report.verdict, "assertion check finished");
        Ok(report)
    }

    /// Check goals of `prepared` selected by `filter`, in parallel. Results
    /// keep goal order.
    fn check_goals(
        &self,
        prepared: &Prepared<'_>,
        side: Option<Side>,
        filter: impl Fn(&Goal) -> bool + Sync,
    ) -> Result<Vec<ObligationResult>, VerifyError> {
        prepared
            .encoding
            .goals
            .par_iter()
            .filter(|goal| filter(goal))
            .map(|goal| self.check_goal(prepared, side, goal))
            .collect()
    }

    fn check_goal(
        &self,
        prepared: &Prepared<'_>,
        side: Option<Side>,
        goal: &Goal,
    ) -> Result<ObligationResult, VerifyError> {
        let script = prepared.encoding.goal_script(goal);
        tracing::debug!(kind = %goal.kind, loc = %goal.loc, commands = script.len(), "issuing query");
        let outcome = match self.backend.check_sat(&script)? {
            SolverResult::Unsat => ObligationOutcome::Proved,
            SolverResult::Sat(model) => {
                let inputs = model
                    .as_ref()
                    .map(|m| entry_values(m, &prepared.ssa))
                    .unwrap_or_default();
                let confirmed = replay_failure(prepared.program, goal, &inputs);
                ObligationOutcome::Failed {
                    failure: Failure {
                        kind: goal.kind,
                        loc: goal.loc,
                        side,
                        inputs,
                        confirmed,
                    },
                }
            }
            SolverResult::Unknown(reason) => {
                tracing::warn!(kind = %goal.kind, loc = %goal.loc, %reason, "solver returned unknown");
                ObligationOutcome::Unknown { reason }
            }
        };
        Ok(ObligationResult {
            kind: goal.kind,
            loc: goal.loc,
            outcome,
        })
    }

    /// Decide whether `a` and `b` agree on their outputs for every input.
    pub fn check_equivalence(
        &self,
        a: &Program,
        b: &Program,
    ) -> Result<EquivalenceReport, VerifyError> {
        let pa = self.prepare_side(Side::A, a)?;
        let pb = self.prepare_side(Side::B, b)?;
        let outputs = equivalence::resolve_outputs(
            self.config.output_variables.as_deref(),
            (a, b),
            (&pa.ssa, &pb.ssa),
        )?;
        let composition =
            equivalence::compose((&pa.ssa, &pb.ssa), (&pa.encoding, &pb.encoding), outputs)?;
        tracing::info!(
            outputs = composition.outputs.len(),
            solver = %self.backend.name(),
            "checking equivalence"
        );

        let is_division = |g: &Goal| g.kind == ObligationKind::DivisionSafe;
        let (divisions, answer) = rayon::join(
            || -> Result<Vec<ObligationResult>, VerifyError> {
                let (ra, rb) = rayon::join(
                    || self.check_goals(&pa, Some(Side::A), is_division),
                    || self.check_goals(&pb, Some(Side::B), is_division),
                );
                let mut all = ra?;
                all.extend(rb?);
                Ok(all)
            },
            || self.backend.check_sat(&composition.script),
        );
        let divisions = divisions?;
        let answer = answer?;

        let verdict = equivalence_verdict(&divisions, answer, &composition, &pa, &pb);
        if let EquivalenceVerdict::Unknown { reason } = &verdict {
            tracing::warn!(%reason, "equivalence undecided");
        }
        tracing::info!(verdict = %verdict, "equivalence check finished");
        Ok(EquivalenceReport {
            verdict,
            outputs: composition.outputs.iter().map(|o| o.name.clone()).collect(),
            caveat_a: pa.ssa.caveat.clone(),
            caveat_b: pb.ssa.caveat.clone(),
        })
    }

    /// Assertion checks of both programs and their equivalence, run
    /// concurrently.
    pub fn verify_pair(&self, a: &Program, b: &Program) -> Result<PairReport, VerifyError> {
        let ((assertions_a, assertions_b), equivalence) = rayon::join(
            || {
                rayon::join(
                    || {
                        self.check_assertions(a)
                            .map_err(|e| side_error(Side::A, e))
                    },
                    || {
                        self.check_assertions(b)
                            .map_err(|e| side_error(Side::B, e))
                    },
                )
            },
            || self.check_equivalence(a, b),
        );
        Ok(PairReport {
            assertions_a: assertions_a?,
            assertions_b: assertions_b?,
            equivalence: equivalence?,
        })
    }
}

fn side_error(side: Side, err: VerifyError) -> VerifyError {
    match err {
        VerifyError::Build(source) => VerifyError::BuildSide { side, source },
        other => other,
    }
}

/// Division failures first; then the answer to the equivalence query. An
/// `Equivalent` answer only stands if every division was proved safe.
fn equivalence_verdict(
    divisions: &[ObligationResult],
    answer: SolverResult,
    composition: &Composition,
    a: &Prepared<'_>,
    b: &Prepared<'_>,
) -> EquivalenceVerdict {
    let failures: Vec<Failure> = divisions
        .iter()
        .filter_map(|r| match &r.outcome {
            ObligationOutcome::Failed { failure } => Some(failure.clone()),
            _ => None,
        })
        .collect();
    if !failures.is_empty() {
        return EquivalenceVerdict::DivisionUnsafe { failures };
    }

    match answer {
        SolverResult::Sat(model) => {
            let counterexample = match model {
                Some(model) => {
                    let mut cex = composition.counterexample(&model, &a.ssa, &b.ssa);
                    cex.confirmed =
                        replay_difference(a.program, b.program, &cex, &composition.outputs);
                    cex
                }
                None => Counterexample::default(),
            };
            EquivalenceVerdict::NotEquivalent { counterexample }
        }
        SolverResult::Unknown(reason) => EquivalenceVerdict::Unknown { reason },
        SolverResult::Unsat => {
            let undecided: Vec<String> = divisions
                .iter()
                .filter_map(|r| match &r.outcome {
                    ObligationOutcome::Unknown { reason } => {
                        Some(format!("division at {}: {reason}", r.loc))
                    }
                    _ => None,
                })
                .collect();
            if undecided.is_empty() {
                EquivalenceVerdict::Equivalent
            } else {
                EquivalenceVerdict::Unknown {
                    reason: undecided.join("; "),
                }
            }
        }
    }
}

/// Entry values of `ssa` in `model`, by source name.
fn entry_values(model: &Model, ssa: &SsaProgram) -> BTreeMap<String, ModelValue> {
    ssa.initial_symbols()
        .filter_map(|(sym, _)| {
            let value = model.value(&sym.smt_name())?;
            Some((sym.name.clone(), value))
        })
        .collect()
}

/// Run `program` on a failure's inputs and check the failure recurs.
fn replay_failure(
    program: &Program,
    goal: &Goal,
    inputs: &BTreeMap<String, ModelValue>,
) -> Option<bool> {
    let run = concrete::execute(program, inputs, DEFAULT_FUEL);
    let reproduced = match goal.kind {
        ObligationKind::Assert => run.failed_assertions.contains(&goal.loc),
        ObligationKind::DivisionSafe => {
            run.halted == Some(ExecError::DivisionByZero { loc: goal.loc })
        }
    };
    if reproduced {
        Some(true)
    } else if run.completed() {
        Some(false)
    } else {
        None
    }
}

/// Run both programs on a counterexample and compare their outputs.
fn replay_difference(
    a: &Program,
    b: &Program,
    cex: &Counterexample,
    outputs: &[Output],
) -> Option<bool> {
    let entry = |own: &BTreeMap<String, ModelValue>| {
        let mut all = cex.shared_inputs.clone();
        all.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        all
    };
    let (entry_a, entry_b) = (entry(&cex.inputs_a), entry(&cex.inputs_b));
    let run_a = concrete::execute(a, &entry_a, DEFAULT_FUEL);
    let run_b = concrete::execute(b, &entry_b, DEFAULT_FUEL);
    if !run_a.completed() || !run_b.completed() {
        return None;
    }
    let differs = outputs.iter().any(|o| {
        match (
            run_a.final_value(&o.name, o.kind, &entry_a),
            run_b.final_value(&o.name, o.kind, &entry_b),
        ) {
            (Value::Array(x), Value::Array(y)) => !same_array(&x, &y),
            (x, y) => x != y,
        }
    });
    Some(differs)
}

fn same_array(x: &minilang_fv_solver::ArrayValue, y: &minilang_fv_solver::ArrayValue) -> bool {
    x.default.unwrap_or(0) == y.default.unwrap_or(0)
        && x
            .entries
            .iter()
            .chain(&y.entries)
            .all(|(i, _)| x.get(*i).unwrap_or(0) == y.get(*i).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr as E, InputDecl, Location, Stmt as S};
    use minilang_fv_solver::{ArrayValue, SolverError};
    use minilang_fv_smtlib::Script;

    /// Answers every query with the same result.
    struct Fixed(SolverResult);

    impl SolverBackend for Fixed {
        fn check_sat(&self, _script: &Script) -> Result<SolverResult, SolverError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> String {
            "fixed".to_string()
        }
    }

    fn verifier(result: SolverResult) -> Verifier {
        Verifier::new(Box::new(Fixed(result)), VerifyConfig::default()).unwrap()
    }

    fn division_program() -> Program {
        Program::new(
            vec![InputDecl::scalar("x")],
            vec![
                S::assign("y", E::div(E::int(10), E::var("x"))).at(1, 1),
                S::assert(E::gt(E::var("y"), E::int(0))).at(2, 1),
            ],
        )
    }

    #[test]
    fn unsat_everywhere_holds() {
        let report = verifier(SolverResult::Unsat)
            .check_assertions(&division_program())
            .unwrap();
        assert!(report.verdict.is_holds());
        assert_eq!(report.obligations.len(), 2);
        assert!(report.obligations.iter().all(ObligationResult::is_proved));
    }

    #[test]
    fn sat_model_becomes_replayed_failure() {
        let model = Model::with_assignments(vec![("x@0".into(), "0".into())]);
        let report = verifier(SolverResult::Sat(Some(model)))
            .check_assertions(&division_program())
            .unwrap();
        let ObligationOutcome::Failed { failure } = &report.obligations[0].outcome else {
            panic!("division should fail");
        };
        assert_eq!(failure.kind, ObligationKind::DivisionSafe);
        assert_eq!(failure.inputs["x"], ModelValue::Int(0));
        assert_eq!(failure.confirmed, Some(true));

        // x = 0 halts at the division, so the assertion cannot be replayed.
        let ObligationOutcome::Failed { failure } = &report.obligations[1].outcome else {
            panic!("assertion should fail");
        };
        assert_eq!(failure.confirmed, None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = VerifyConfig::new().with_unroll_bound(0);
        assert!(matches!(
            Verifier::new(Box::new(Fixed(SolverResult::Unsat)), config),
            Err(VerifyError::Config(_))
        ));
    }

    #[test]
    fn build_errors_name_the_program() {
        let bad = Program::new(vec![], vec![S::assign("y", E::var("nope"))]);
        let good = division_program();
        let v = verifier(SolverResult::Unsat);
        assert!(matches!(
            v.check_equivalence(&good, &bad),
            Err(VerifyError::BuildSide { side: Side::B, .. })
        ));
        assert!(matches!(
            v.verify_pair(&bad, &good),
            Err(VerifyError::BuildSide { side: Side::A, .. })
        ));
    }

    #[test]
    fn replay_rejects_spurious_assertion_failure() {
        // Needs three iterations; a model found with two copies is spurious.
        let program = Program::new(
            vec![],
            vec![
                S::assign("x", E::int(0)),
                S::for_loop(
                    vec![S::assign("i", E::int(0))],
                    E::lt(E::var("i"), E::int(3)),
                    vec![S::assign("i", E::add(E::var("i"), E::int(1)))],
                    vec![S::assign("x", E::add(E::var("x"), E::int(2)))],
                ),
                S::assert(E::eq(E::var("x"), E::int(6))).at(5, 1),
            ],
        );
        let goal = Goal {
            kind: ObligationKind::Assert,
            path: minilang_fv_smtlib::Term::BoolLit(true),
            cond: minilang_fv_smtlib::Term::BoolLit(true),
            loc: Location::new(5, 1),
        };
        assert_eq!(replay_failure(&program, &goal, &BTreeMap::new()), Some(false));
    }

    #[test]
    fn replay_reads_unwritten_outputs_from_their_entry_value() {
        // `r` is written by A only; B leaves its input unchanged.
        let a = Program::new(
            vec![InputDecl::scalar("r")],
            vec![S::assign("r", E::add(E::var("r"), E::int(0)))],
        );
        let b = Program::new(vec![InputDecl::scalar("r")], vec![]);
        let model = Model::with_assignments(vec![
            ("r@0".into(), "5".into()),
            ("A.r@1".into(), "5".into()),
        ]);
        let v = Verifier::new(
            Box::new(Fixed(SolverResult::Sat(Some(model)))),
            VerifyConfig::new().with_outputs(["r"]),
        )
        .unwrap();

        for (first, second) in [(&a, &b), (&b, &a)] {
            let report = v.check_equivalence(first, second).unwrap();
            let EquivalenceVerdict::NotEquivalent { counterexample } = report.verdict else {
                panic!("expected a counterexample");
            };
            assert_eq!(counterexample.confirmed, Some(false));
        }
    }

    #[test]
    fn arrays_compare_by_content() {
        let sparse = ArrayValue::constant(0);
        let mut explicit = ArrayValue::constant(0);
        explicit.set(4, 0);
        assert!(same_array(&sparse, &explicit));
        explicit.set(4, 1);
        assert!(!same_array(&sparse, &explicit));
    }
}
