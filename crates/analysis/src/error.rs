use std::fmt;

use minilang_fv_solver::SolverError;
use thiserror::Error;

use crate::ast::{Location, VarKind};

/// Errors that abort SSA construction of one program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A name was read before any definition reached it.
    #[error("{loc}: variable `{name}` is read before it is assigned")]
    UninitializedVariable { name: String, loc: Location },
    /// A scalar used as an array or the other way round.
    #[error("{loc}: `{name}` is used as {expected} but is {found}")]
    KindMismatch {
        name: String,
        expected: VarKind,
        found: VarKind,
        loc: Location,
    },
    /// An expression in the wrong position, e.g. arithmetic as a condition.
    #[error("{loc}: malformed program: {message}")]
    Malformed { message: String, loc: Location },
}

/// Which of the two programs of an equivalence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Namespace prefix for this program's local symbols.
    pub fn prefix(&self) -> &'static str {
        match self {
            Side::A => "A.",
            Side::B => "B.",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Faults of a verification run. Violations and unknown answers are not
/// errors; they are reported as verdicts.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("program {side}: {source}")]
    BuildSide {
        side: Side,
        #[source]
        source: BuildError,
    },
    #[error(transparent)]
    Solver(#[from] SolverError),
    /// Two distinct symbols ended up with the same name after renaming.
    #[error("symbol `{name}` is defined by both programs after renaming")]
    NamespaceCollision { name: String },
    /// A requested output is not defined by one of the programs.
    #[error("output `{name}` is not defined in program {side}")]
    UnknownOutput { name: String, side: Side },
    /// An output is a scalar in one program and an array in the other.
    #[error("output `{name}` is {a} in program A but {b} in program B")]
    OutputKindMismatch {
        name: String,
        a: VarKind,
        b: VarKind,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_carry_location() {
        let err = BuildError::UninitializedVariable {
            name: "y".into(),
            loc: Location::new(4, 2),
        };
        assert_eq!(err.to_string(), "4:2: variable `y` is read before it is assigned");

        let err = BuildError::KindMismatch {
            name: "a".into(),
            expected: VarKind::Array,
            found: VarKind::Scalar,
            loc: Location::new(1, 1),
        };
        assert_eq!(err.to_string(), "1:1: `a` is used as array but is scalar");
    }

    #[test]
    fn side_errors_name_the_program() {
        let err = VerifyError::BuildSide {
            side: Side::B,
            source: BuildError::Malformed {
                message: "comparison used as a number".into(),
                loc: Location::new(2, 5),
            },
        };
        assert_eq!(
            err.to_string(),
            "program B: 2:5: malformed program: comparison used as a number"
        );
        assert_eq!(Side::A.prefix(), "A.");
    }

    #[test]
    fn solver_errors_convert() {
        let err: VerifyError = SolverError::ProcessError("boom".into()).into();
        assert!(matches!(err, VerifyError::Solver(_)));
        assert_eq!(err.to_string(), "Solver process error: boom");
    }
}
