//! SSA facts: the output of the SSA builder and input of the constraint
//! generator.

use std::collections::BTreeMap;
use std::fmt;

use minilang_fv_smtlib::Term;
use serde::Serialize;

use crate::ast::{InputDecl, Location, VarKind};

/// Version `version` of source name `name`, written `name@version`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    pub name: String,
    pub version: u32,
}

impl Symbol {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// The entry value of `name`.
    pub fn initial(name: impl Into<String>) -> Self {
        Self::new(name, 0)
    }

    pub fn is_initial(&self) -> bool {
        self.version == 0
    }

    /// SMT constant name.
    pub fn smt_name(&self) -> String {
        self.to_string()
    }

    pub fn term(&self) -> Term {
        Term::constant(self.smt_name())
    }

    /// Inverse of [`Symbol::smt_name`].
    pub fn parse(smt_name: &str) -> Option<Self> {
        let (name, version) = smt_name.rsplit_once('@')?;
        Some(Self::new(name, version.parse().ok()?))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// What an obligation protects against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationKind {
    /// A `verify(c)` statement.
    Assert,
    /// The divisor of a `/` is non-zero.
    DivisionSafe,
}

impl fmt::Display for ObligationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObligationKind::Assert => write!(f, "assertion"),
            ObligationKind::DivisionSafe => write!(f, "division by zero"),
        }
    }
}

/// A condition that must hold whenever its path condition does.
#[derive(Debug, Clone, PartialEq)]
pub struct Obligation {
    pub kind: ObligationKind,
    pub cond: Term,
    pub path: Term,
    pub loc: Location,
}

/// One SSA fact, in program order.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    /// `path → var = value`
    Assign { var: Symbol, value: Term, path: Term },
    /// `path → array = store(base, index, value)`
    ArrayWrite {
        array: Symbol,
        base: Symbol,
        index: Term,
        value: Term,
        path: Term,
    },
    /// `var = cond ? if_true : if_false`
    Phi {
        var: Symbol,
        if_true: Symbol,
        if_false: Symbol,
        cond: Term,
    },
    Obligation(Obligation),
}

impl Fact {
    /// The symbol this fact defines, if any.
    pub fn defines(&self) -> Option<&Symbol> {
        match self {
            Fact::Assign { var, .. } | Fact::Phi { var, .. } => Some(var),
            Fact::ArrayWrite { array, .. } => Some(array),
            Fact::Obligation(_) => None,
        }
    }
}

/// Loops whose guard was not provably false after the unrolling bound.
///
/// A verdict obtained under a non-empty caveat only covers executions in
/// which every listed loop exits within `bound` iterations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnrollCaveat {
    pub bound: u32,
    pub loops: Vec<Location>,
}

impl UnrollCaveat {
    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

impl fmt::Display for UnrollCaveat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loops.is_empty() {
            return write!(f, "all loops fully unrolled");
        }
        let sites: Vec<String> = self.loops.iter().map(Location::to_string).collect();
        write!(
            f,
            "verified up to {} iterations of the loop(s) at {}",
            self.bound,
            sites.join(", ")
        )
    }
}

/// A program in SSA form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SsaProgram {
    pub inputs: Vec<InputDecl>,
    pub facts: Vec<Fact>,
    /// Every symbol the facts mention, with its kind.
    pub symbols: BTreeMap<Symbol, VarKind>,
    /// Current version of every name at program exit.
    pub finals: BTreeMap<String, Symbol>,
    pub caveat: UnrollCaveat,
}

impl SsaProgram {
    pub fn obligations(&self) -> impl Iterator<Item = &Obligation> {
        self.facts.iter().filter_map(|f| match f {
            Fact::Obligation(o) => Some(o),
            _ => None,
        })
    }

    /// Version-0 symbols: declared inputs and initial contents.
    pub fn initial_symbols(&self) -> impl Iterator<Item = (&Symbol, VarKind)> {
        self.symbols
            .iter()
            .filter(|(s, _)| s.is_initial())
            .map(|(s, k)| (s, *k))
    }

    pub fn kind_of(&self, name: &str) -> Option<VarKind> {
        self.finals
            .get(name)
            .and_then(|s| self.symbols.get(s))
            .copied()
    }
}

/// Line-oriented listing, one fact per line.
///
/// ```text
/// x@1 := 1
/// a@1 := (store a@0 i@1 5)  if (> x@1 0)
/// x@2 := phi((> x@1 0) ? x@1 : x@0)
/// assert (= z@1 3) at 4:1
/// ```
impl fmt::Display for SsaProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            writeln!(f, "input {} : {}", Symbol::initial(&input.name), input.kind)?;
        }
        for fact in &self.facts {
            writeln!(f, "{fact}")?;
        }
        if !self.caveat.is_empty() {
            writeln!(f, "; {}", self.caveat)?;
        }
        Ok(())
    }
}

fn fmt_path(path: &Term, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if path.is_true() {
        Ok(())
    } else {
        write!(f, "  if {path}")
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fact::Assign { var, value, path } => {
                write!(f, "{var} := {value}")?;
                fmt_path(path, f)
            }
            Fact::ArrayWrite {
                array,
                base,
                index,
                value,
                path,
            } => {
                write!(f, "{array} := (store {base} {index} {value})")?;
                fmt_path(path, f)
            }
            Fact::Phi {
                var,
                if_true,
                if_false,
                cond,
            } => write!(f, "{var} := phi({cond} ? {if_true} : {if_false})"),
            Fact::Obligation(o) => {
                let word = match o.kind {
                    ObligationKind::Assert => "assert",
                    ObligationKind::DivisionSafe => "check",
                };
                write!(f, "{word} {} at {}", o.cond, o.loc)?;
                fmt_path(&o.path, f)
            }
        }
    }
}
