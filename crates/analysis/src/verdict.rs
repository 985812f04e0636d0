//! Verdicts and reports.
//!
//! Everything here is plain data: serializable for the JSON report and
//! printable for logs.

use std::collections::BTreeMap;
use std::fmt;

use minilang_fv_solver::ModelValue;
use serde::Serialize;

use crate::ast::Location;
use crate::error::Side;
use crate::ssa::{ObligationKind, UnrollCaveat};

/// One obligation that can fail, with the inputs that make it fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub kind: ObligationKind,
    pub loc: Location,
    /// Program of an equivalence check the failure belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    /// Entry values by source name, as given by the solver's model.
    pub inputs: BTreeMap<String, ModelValue>,
    /// Whether concrete execution on `inputs` reproduces the failure.
    /// `None` if the replay could not reach a conclusion.
    pub confirmed: Option<bool>,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(side) = self.side {
            write!(f, "program {side}: ")?;
        }
        write!(f, "{} may fail at {}", self.kind, self.loc)?;
        if !self.inputs.is_empty() {
            write!(f, " with {}", fmt_values(&self.inputs))?;
        }
        Ok(())
    }
}

fn fmt_values(values: &BTreeMap<String, ModelValue>) -> String {
    values
        .iter()
        .map(|(name, value)| format!("{name} = {}", display_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn display_value(value: &ModelValue) -> String {
    match value {
        ModelValue::Int(n) => n.to_string(),
        ModelValue::Bool(b) => b.to_string(),
        ModelValue::Array(a) => a.to_string(),
        ModelValue::Other(raw) => raw.clone(),
    }
}

/// Result of checking one obligation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ObligationOutcome {
    Proved,
    Failed { failure: Failure },
    Unknown { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObligationResult {
    pub kind: ObligationKind,
    pub loc: Location,
    #[serde(flatten)]
    pub outcome: ObligationOutcome,
}

impl ObligationResult {
    pub fn is_proved(&self) -> bool {
        matches!(self.outcome, ObligationOutcome::Proved)
    }
}

/// Verdict of a single-program assertion check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssertionVerdict {
    Holds,
    Violated { failures: Vec<Failure> },
    Unknown { reason: String },
}

impl AssertionVerdict {
    /// Any failure wins over any unknown; otherwise any unknown wins.
    pub fn from_results(results: &[ObligationResult]) -> Self {
        let failures: Vec<Failure> = results
            .iter()
            .filter_map(|r| match &r.outcome {
                ObligationOutcome::Failed { failure } => Some(failure.clone()),
                _ => None,
            })
            .collect();
        if !failures.is_empty() {
            return AssertionVerdict::Violated { failures };
        }
        let reasons: Vec<String> = results
            .iter()
            .filter_map(|r| match &r.outcome {
                ObligationOutcome::Unknown { reason } => {
                    Some(format!("{} at {}: {reason}", r.kind, r.loc))
                }
                _ => None,
            })
            .collect();
        if reasons.is_empty() {
            AssertionVerdict::Holds
        } else {
            AssertionVerdict::Unknown {
                reason: reasons.join("; "),
            }
        }
    }

    pub fn is_holds(&self) -> bool {
        matches!(self, AssertionVerdict::Holds)
    }
}

impl fmt::Display for AssertionVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionVerdict::Holds => write!(f, "holds"),
            AssertionVerdict::Violated { failures } => {
                write!(f, "violated ({} failing obligation(s))", failures.len())
            }
            AssertionVerdict::Unknown { reason } => write!(f, "unknown: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionReport {
    pub verdict: AssertionVerdict,
    pub obligations: Vec<ObligationResult>,
    pub caveat: UnrollCaveat,
}

impl AssertionReport {
    pub fn new(obligations: Vec<ObligationResult>, caveat: UnrollCaveat) -> Self {
        Self {
            verdict: AssertionVerdict::from_results(&obligations),
            obligations,
            caveat,
        }
    }
}

/// Final values of one output in the two programs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputValues {
    pub name: String,
    pub a: Option<ModelValue>,
    pub b: Option<ModelValue>,
}

impl OutputValues {
    pub fn differs(&self) -> bool {
        self.a != self.b
    }
}

/// Inputs on which two programs disagree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Counterexample {
    /// Entry values of names both programs read.
    pub shared_inputs: BTreeMap<String, ModelValue>,
    /// Entry values only program A has.
    pub inputs_a: BTreeMap<String, ModelValue>,
    /// Entry values only program B has.
    pub inputs_b: BTreeMap<String, ModelValue>,
    pub outputs: Vec<OutputValues>,
    /// Whether running both programs on these inputs shows a difference.
    pub confirmed: Option<bool>,
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.shared_inputs.is_empty() {
            parts.push(format!("inputs {}", fmt_values(&self.shared_inputs)));
        }
        for output in self.outputs.iter().filter(|o| o.differs()) {
            let show = |v: &Option<ModelValue>| v.as_ref().map_or("?".to_string(), display_value);
            parts.push(format!(
                "{0}: A.{0} = {1}, B.{0} = {2}",
                output.name,
                show(&output.a),
                show(&output.b)
            ));
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// Verdict of a two-program equivalence check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EquivalenceVerdict {
    Equivalent,
    NotEquivalent { counterexample: Counterexample },
    /// A division in one of the programs can fail, so their outputs are not
    /// well defined for every input.
    DivisionUnsafe { failures: Vec<Failure> },
    Unknown { reason: String },
}

impl EquivalenceVerdict {
    pub fn is_equivalent(&self) -> bool {
        matches!(self, EquivalenceVerdict::Equivalent)
    }
}

impl fmt::Display for EquivalenceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EquivalenceVerdict::Equivalent => write!(f, "equivalent"),
            EquivalenceVerdict::NotEquivalent { counterexample } => {
                write!(f, "not equivalent: {counterexample}")
            }
            EquivalenceVerdict::DivisionUnsafe { failures } => {
                write!(f, "division unsafe ({} failing division(s))", failures.len())
            }
            EquivalenceVerdict::Unknown { reason } => write!(f, "unknown: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquivalenceReport {
    pub verdict: EquivalenceVerdict,
    /// Compared names, sorted.
    pub outputs: Vec<String>,
    pub caveat_a: UnrollCaveat,
    pub caveat_b: UnrollCaveat,
}

impl EquivalenceReport {
    /// Loops of either program that may run past the bound.
    pub fn has_caveat(&self) -> bool {
        !self.caveat_a.is_empty() || !self.caveat_b.is_empty()
    }
}

/// Assertion checks of both programs plus their equivalence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub assertions_a: AssertionReport,
    pub assertions_b: AssertionReport,
    pub equivalence: EquivalenceReport,
}
