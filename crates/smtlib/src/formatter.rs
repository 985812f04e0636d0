//! SMT-LIB2 text formatting for AST types.
//!
//! Implements `Display` for [`Sort`], [`Term`], [`Command`], and [`Script`],
//! producing SMT-LIB2 text accepted by Z3 and CVC5.

use std::fmt;

use crate::command::Command;
use crate::script::Script;
use crate::sort::Sort;
use crate::term::Term;

// ---------------------------------------------------------------------------
// Symbols
// ---------------------------------------------------------------------------

const SYMBOL_PUNCTUATION: &str = "~!@$%^&*_-+=<>.?/";

/// Returns `true` if `name` can be written as an SMT-LIB simple symbol.
pub fn is_simple_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let valid = |c: char| c.is_ascii_alphanumeric() || SYMBOL_PUNCTUATION.contains(c);
    !first.is_ascii_digit() && valid(first) && chars.all(valid)
}

/// Write a symbol, quoting it with `|...|` when it is not a simple symbol.
fn fmt_symbol(name: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if is_simple_symbol(name) {
        write!(f, "{name}")
    } else {
        write!(f, "|{name}|")
    }
}

// ---------------------------------------------------------------------------
// Sort
// ---------------------------------------------------------------------------

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sort::Int => write!(f, "Int"),
            Sort::Array(index, element) => write!(f, "(Array {index} {element})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// Write a binary SMT-LIB operator: `(op lhs rhs)`.
fn fmt_binop(op: &str, lhs: &Term, rhs: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({op} {lhs} {rhs})")
}

/// Write an n-ary operator, or `empty` when there are no operands.
fn fmt_nary(op: &str, terms: &[Term], empty: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if terms.is_empty() {
        return write!(f, "{empty}");
    }
    write!(f, "({op}")?;
    for t in terms {
        write!(f, " {t}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // --- Literals ---
            Term::BoolLit(true) => write!(f, "true"),
            Term::BoolLit(false) => write!(f, "false"),
            Term::IntLit(n) => {
                if *n < 0 {
                    // SMT-LIB has no negative numerals
                    write!(f, "(- {})", n.unsigned_abs())
                } else {
                    write!(f, "{n}")
                }
            }

            Term::Const(name) => fmt_symbol(name, f),

            // --- Boolean operations ---
            Term::Not(inner) => write!(f, "(not {inner})"),
            Term::And(terms) => fmt_nary("and", terms, "true", f),
            Term::Or(terms) => fmt_nary("or", terms, "false", f),
            Term::Implies(lhs, rhs) => fmt_binop("=>", lhs, rhs, f),

            // --- Core ---
            Term::Eq(lhs, rhs) => fmt_binop("=", lhs, rhs, f),
            // `distinct` needs at least two operands; fewer are trivially true
            Term::Distinct(terms) if terms.len() < 2 => write!(f, "true"),
            Term::Distinct(terms) => fmt_nary("distinct", terms, "true", f),

            // --- Integer arithmetic ---
            Term::IntAdd(a, b) => fmt_binop("+", a, b, f),
            Term::IntSub(a, b) => fmt_binop("-", a, b, f),
            Term::IntMul(a, b) => fmt_binop("*", a, b, f),
            Term::IntDiv(a, b) => fmt_binop("div", a, b, f),
            Term::IntNeg(a) => write!(f, "(- {a})"),
            Term::IntLt(a, b) => fmt_binop("<", a, b, f),
            Term::IntLe(a, b) => fmt_binop("<=", a, b, f),
            Term::IntGt(a, b) => fmt_binop(">", a, b, f),
            Term::IntGe(a, b) => fmt_binop(">=", a, b, f),

            // --- Array operations ---
            Term::Select(arr, idx) => fmt_binop("select", arr, idx, f),
            Term::Store(arr, idx, val) => write!(f, "(store {arr} {idx} {val})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetLogic(logic) => write!(f, "(set-logic {logic})"),
            Command::SetOption(key, value) => write!(f, "(set-option :{key} {value})"),
            Command::DeclareConst(name, sort) => {
                write!(f, "(declare-const ")?;
                fmt_symbol(name, f)?;
                write!(f, " {sort})")
            }
            Command::Assert(term) => write!(f, "(assert {term})"),
            Command::CheckSat => write!(f, "(check-sat)"),
            Command::GetModel => write!(f, "(get-model)"),
            Command::Push(n) => write!(f, "(push {n})"),
            Command::Pop(n) => write!(f, "(pop {n})"),
            Command::Comment(text) => {
                // Keep multi-line comments as comments on every line.
                for (i, line) in text.lines().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, ";; {line}")?;
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cmd in self.commands() {
            writeln!(f, "{cmd}")?;
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
