use crate::sort::Sort;
use crate::term::Term;

/// The SMT-LIB commands a verification query is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `(set-logic QF_LIA)` and friends; chosen from the operators a query uses.
    SetLogic(String),
    /// `(set-option :produce-models true)`
    SetOption(String, String),
    /// One SSA symbol: `(declare-const x@1 Int)`.
    DeclareConst(String, Sort),
    Assert(Term),
    CheckSat,
    /// Requested after every `check-sat` so `sat` answers carry a model.
    GetModel,
    /// Opens the frame of one obligation in a dump.
    Push(u32),
    Pop(u32),
    /// Rendered as one `;; ` line per line of text.
    Comment(String),
}
