use crate::model::Model;

/// Three-valued answer of the SMT solver.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverResult {
    /// Formula is satisfiable; for a negated goal this is a counterexample.
    Sat(Option<Model>),
    /// Formula is unsatisfiable; the goal is valid.
    Unsat,
    /// Solver couldn't decide (timeout, incompleteness, resource limit).
    Unknown(String),
}

impl SolverResult {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolverResult::Sat(_))
    }

    pub fn is_unsat(&self) -> bool {
        matches!(self, SolverResult::Unsat)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SolverResult::Unknown(_))
    }

    /// Returns the model if the result is `Sat` with a model.
    pub fn model(&self) -> Option<&Model> {
        match self {
            SolverResult::Sat(Some(model)) => Some(model),
            _ => None,
        }
    }

    /// Short lowercase name as printed by solvers: `sat`, `unsat`, `unknown`.
    pub fn status_name(&self) -> &'static str {
        match self {
            SolverResult::Sat(_) => "sat",
            SolverResult::Unsat => "unsat",
            SolverResult::Unknown(_) => "unknown",
        }
    }
}
