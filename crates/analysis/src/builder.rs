//! SSA builder: one deterministic pass over the AST that threads a path
//! condition and emits versioned facts.
//!
//! - `v := e` becomes `Assign(v@k, e, pc)` with a fresh `k`.
//! - `if g` forks the version table, translates both branches under
//!   `pc ∧ g` / `pc ∧ ¬g`, and merges with one phi per name whose version
//!   differs between the forks.
//! - `a[i] := e` becomes `ArrayWrite(a@k, base, i, e, pc)`; the first write
//!   to an undeclared array introduces its initial contents `a@0`.
//! - `verify(c)` and every division emit an [`Obligation`].
//! - Loops are unrolled in place (see `unroll.rs`).
//!
//! The builder also remembers which versions are known constants on the
//! path that defines them. This only decides when a loop can stop being
//! unrolled; it never changes the facts.

use std::collections::{BTreeMap, BTreeSet};

use minilang_fv_smtlib::Term;

use crate::ast::{ArithOp, CmpOp, Expr, InputDecl, Location, Program, Stmt, VarKind};
use crate::error::BuildError;
use crate::ssa::{Fact, Obligation, ObligationKind, SsaProgram, Symbol, UnrollCaveat};
use crate::version::{Scope, VersionTable};

/// Translate `program` to SSA, unrolling every loop at most `unroll_bound`
/// times.
pub fn build_ssa(program: &Program, unroll_bound: u32) -> Result<SsaProgram, BuildError> {
    let mut builder = SsaBuilder::new(unroll_bound);
    builder.declare_inputs(&program.inputs)?;
    builder.stmts(&program.body, &Term::BoolLit(true))?;
    let ssa = builder.finish(program.inputs.clone());
    tracing::debug!(
        facts = ssa.facts.len(),
        symbols = ssa.symbols.len(),
        obligations = ssa.obligations().count(),
        "built SSA"
    );
    Ok(ssa)
}

/// Variable names are `[A-Za-z_][A-Za-z0-9_]*`. Anything else could clash
/// with the `name@k` symbols, the `A.`/`B.` prefixes of an equivalence query
/// or the `|..|` quoting of SMT-LIB symbols.
fn check_identifier(name: &str, loc: Location) -> Result<(), BuildError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(BuildError::Malformed {
            message: format!("`{name}` is not a valid identifier"),
            loc,
        })
    }
}

pub(crate) struct SsaBuilder {
    pub(crate) table: VersionTable,
    pub(crate) facts: Vec<Fact>,
    symbols: BTreeMap<Symbol, VarKind>,
    consts: BTreeMap<Symbol, i128>,
    pub(crate) unroll_bound: u32,
    pub(crate) unbounded_loops: Vec<Location>,
}

impl SsaBuilder {
    pub(crate) fn new(unroll_bound: u32) -> Self {
        Self {
            table: VersionTable::new(),
            facts: Vec::new(),
            symbols: BTreeMap::new(),
            consts: BTreeMap::new(),
            unroll_bound,
            unbounded_loops: Vec::new(),
        }
    }

    fn declare_inputs(&mut self, inputs: &[InputDecl]) -> Result<(), BuildError> {
        for input in inputs {
            check_identifier(&input.name, Location::default())?;
            if !self.table.declare_input(&input.name, input.kind) {
                return Err(BuildError::Malformed {
                    message: format!("input `{}` is declared twice", input.name),
                    loc: Location::default(),
                });
            }
            self.symbols.insert(Symbol::initial(&input.name), input.kind);
        }
        Ok(())
    }

    fn finish(mut self, inputs: Vec<InputDecl>) -> SsaProgram {
        let finals = self
            .table
            .snapshot()
            .iter()
            .map(|(name, version)| (name.to_string(), Symbol::new(name, version)))
            .collect();
        self.unbounded_loops.sort();
        self.unbounded_loops.dedup();
        SsaProgram {
            inputs,
            facts: self.facts,
            symbols: self.symbols,
            finals,
            caveat: UnrollCaveat {
                bound: self.unroll_bound,
                loops: self.unbounded_loops,
            },
        }
    }

    /// Allocate and record the next version of `name`.
    fn define(&mut self, name: &str, kind: VarKind) -> Symbol {
        let sym = self.table.fresh(name, kind);
        self.symbols.insert(sym.clone(), kind);
        sym
    }

    /// Record `name@0` as a symbol of the program.
    fn mention_initial(&mut self, name: &str, kind: VarKind) -> Symbol {
        let sym = Symbol::initial(name);
        self.table.record_kind(name, kind);
        self.symbols.insert(sym.clone(), kind);
        sym
    }

    fn check_kind(&self, name: &str, expected: VarKind, loc: Location) -> Result<(), BuildError> {
        match self.table.kind(name) {
            Some(found) if found != expected => Err(BuildError::KindMismatch {
                name: name.to_string(),
                expected,
                found,
                loc,
            }),
            _ => Ok(()),
        }
    }

    /// Current version of a name that must be defined with kind `expected`.
    fn lookup(&self, name: &str, expected: VarKind, loc: Location) -> Result<Symbol, BuildError> {
        check_identifier(name, loc)?;
        self.check_kind(name, expected, loc)?;
        self.table
            .current(name)
            .ok_or_else(|| BuildError::UninitializedVariable {
                name: name.to_string(),
                loc,
            })
    }

    fn obligation(&mut self, kind: ObligationKind, cond: Term, path: &Term, loc: Location) {
        self.facts.push(Fact::Obligation(Obligation {
            kind,
            cond,
            path: path.clone(),
            loc,
        }));
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    pub(crate) fn stmts(&mut self, stmts: &[Stmt], pc: &Term) -> Result<(), BuildError> {
        for stmt in stmts {
            self.stmt(stmt, pc)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt, pc: &Term) -> Result<(), BuildError> {
        match stmt {
            Stmt::Assign { target, value, loc } => {
                check_identifier(target, *loc)?;
                self.check_kind(target, VarKind::Scalar, *loc)?;
                let term = self.int_expr(value, pc, *loc)?;
                let folded = self.fold_int(value);
                let var = self.define(target, VarKind::Scalar);
                if let Some(n) = folded {
                    self.consts.insert(var.clone(), n);
                }
                self.facts.push(Fact::Assign {
                    var,
                    value: term,
                    path: pc.clone(),
                });
            }
            Stmt::ArrayWrite {
                array,
                index,
                value,
                loc,
            } => {
                check_identifier(array, *loc)?;
                self.check_kind(array, VarKind::Array, *loc)?;
                let index = self.int_expr(index, pc, *loc)?;
                let value = self.int_expr(value, pc, *loc)?;
                let base = match self.table.current(array) {
                    Some(base) => base,
                    None => self.mention_initial(array, VarKind::Array),
                };
                let array = self.define(array, VarKind::Array);
                self.facts.push(Fact::ArrayWrite {
                    array,
                    base,
                    index,
                    value,
                    path: pc.clone(),
                });
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                loc,
            } => {
                let guard = self.bool_expr(cond, pc, *loc)?;
                let known = self.fold_bool(cond);
                let before = self.table.snapshot();

                self.stmts(then_branch, &pc.clone().conjoin(guard.clone()))?;
                let then_scope = self.table.snapshot();

                self.table.restore(before);
                if let Some(else_branch) = else_branch {
                    self.stmts(else_branch, &pc.clone().conjoin(Term::not(guard.clone())))?;
                }
                let else_scope = self.table.snapshot();

                self.merge(&guard, known, &then_scope, &else_scope);
            }
            Stmt::While { cond, body, loc } => {
                self.unroll(cond, body, &[], pc, *loc)?;
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
                loc,
            } => {
                self.stmts(init, pc)?;
                self.unroll(cond, body, update, pc, *loc)?;
            }
            Stmt::Assert { cond, loc } => {
                let cond = self.bool_expr(cond, pc, *loc)?;
                self.obligation(ObligationKind::Assert, cond, pc, *loc);
            }
            Stmt::Block { body } => self.stmts(body, pc)?,
        }
        Ok(())
    }

    /// Join two forks: `cond ? if_true : if_false`.
    ///
    /// Every name whose version differs gets a phi and a fresh version. A
    /// name missing from one fork did not exist before the fork and merges
    /// with its initial contents `name@0`.
    pub(crate) fn merge(
        &mut self,
        cond: &Term,
        known: Option<bool>,
        if_true: &Scope,
        if_false: &Scope,
    ) {
        let names: BTreeSet<String> = if_true
            .iter()
            .chain(if_false.iter())
            .map(|(name, _)| name.to_string())
            .collect();

        self.table.restore(if_true.clone());
        for name in names {
            let t = if_true.get(&name).unwrap_or(0);
            let f = if_false.get(&name).unwrap_or(0);
            if t == f {
                self.table.set_current(&name, t);
                continue;
            }
            let kind = self.table.kind(&name).unwrap_or_default();
            let if_true_sym = Symbol::new(&name, t);
            let if_false_sym = Symbol::new(&name, f);
            for sym in [&if_true_sym, &if_false_sym] {
                if sym.is_initial() {
                    self.mention_initial(&name, kind);
                }
            }

            let var = self.define(&name, kind);
            let value = match known {
                Some(true) => self.consts.get(&if_true_sym).copied(),
                Some(false) => self.consts.get(&if_false_sym).copied(),
                None => match (self.consts.get(&if_true_sym), self.consts.get(&if_false_sym)) {
                    (Some(a), Some(b)) if a == b => Some(*a),
                    _ => None,
                },
            };
            if let Some(n) = value {
                self.consts.insert(var.clone(), n);
            }
            self.facts.push(Fact::Phi {
                var,
                if_true: if_true_sym,
                if_false: if_false_sym,
                cond: cond.clone(),
            });
        }
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    /// Translate an integer-valued expression.
    fn int_expr(&mut self, expr: &Expr, pc: &Term, loc: Location) -> Result<Term, BuildError> {
        Ok(match expr {
            Expr::Int { value } => Term::int(*value),
            Expr::Var { name } => self.lookup(name, VarKind::Scalar, loc)?.term(),
            Expr::Index { array, index } => {
                let array = self.lookup(array, VarKind::Array, loc)?;
                let index = self.int_expr(index, pc, loc)?;
                Term::select(array.term(), index)
            }
            Expr::Arith { op, lhs, rhs } => {
                let l = Box::new(self.int_expr(lhs, pc, loc)?);
                let r = Box::new(self.int_expr(rhs, pc, loc)?);
                match op {
                    ArithOp::Add => Term::IntAdd(l, r),
                    ArithOp::Sub => Term::IntSub(l, r),
                    ArithOp::Mul => Term::IntMul(l, r),
                    ArithOp::Div => {
                        let nonzero = Term::Distinct(vec![(*r).clone(), Term::int(0)]);
                        self.obligation(ObligationKind::DivisionSafe, nonzero, pc, loc);
                        Term::IntDiv(l, r)
                    }
                }
            }
            Expr::Neg { expr } => Term::IntNeg(Box::new(self.int_expr(expr, pc, loc)?)),
            Expr::Cmp { op, .. } => {
                return Err(BuildError::Malformed {
                    message: format!("comparison `{op}` used as a number"),
                    loc,
                });
            }
            Expr::Not { .. } | Expr::And { .. } | Expr::Or { .. } => {
                return Err(BuildError::Malformed {
                    message: "boolean expression used as a number".to_string(),
                    loc,
                });
            }
        })
    }

    /// Translate a condition. Both operands of `and`/`or` are translated,
    /// so divisions on either side are always checked.
    pub(crate) fn bool_expr(
        &mut self,
        expr: &Expr,
        pc: &Term,
        loc: Location,
    ) -> Result<Term, BuildError> {
        Ok(match expr {
            Expr::Cmp { op, lhs, rhs } => {
                let l = self.int_expr(lhs, pc, loc)?;
                let r = self.int_expr(rhs, pc, loc)?;
                let (l, r) = (Box::new(l), Box::new(r));
                match op {
                    CmpOp::Lt => Term::IntLt(l, r),
                    CmpOp::Le => Term::IntLe(l, r),
                    CmpOp::Gt => Term::IntGt(l, r),
                    CmpOp::Ge => Term::IntGe(l, r),
                    CmpOp::Eq => Term::Eq(l, r),
                    CmpOp::Ne => Term::not(Term::Eq(l, r)),
                }
            }
            Expr::Not { expr } => Term::not(self.bool_expr(expr, pc, loc)?),
            Expr::And { lhs, rhs } => {
                let l = self.bool_expr(lhs, pc, loc)?;
                let r = self.bool_expr(rhs, pc, loc)?;
                Term::And(vec![l, r])
            }
            Expr::Or { lhs, rhs } => {
                let l = self.bool_expr(lhs, pc, loc)?;
                let r = self.bool_expr(rhs, pc, loc)?;
                Term::Or(vec![l, r])
            }
            Expr::Int { .. }
            | Expr::Var { .. }
            | Expr::Index { .. }
            | Expr::Arith { .. }
            | Expr::Neg { .. } => {
                return Err(BuildError::Malformed {
                    message: "arithmetic expression used as a condition".to_string(),
                    loc,
                });
            }
        })
    }

    // -----------------------------------------------------------------
    // Constant folding
    // -----------------------------------------------------------------

    /// Value of `expr` if it is a known constant under the current versions.
    pub(crate) fn fold_int(&self, expr: &Expr) -> Option<i128> {
        match expr {
            Expr::Int { value } => Some(i128::from(*value)),
            Expr::Var { name } => {
                let sym = self.table.current(name)?;
                self.consts.get(&sym).copied()
            }
            Expr::Arith { op, lhs, rhs } => {
                let l = self.fold_int(lhs)?;
                let r = self.fold_int(rhs)?;
                match op {
                    ArithOp::Add => l.checked_add(r),
                    ArithOp::Sub => l.checked_sub(r),
                    ArithOp::Mul => l.checked_mul(r),
                    ArithOp::Div if r == 0 => None,
                    ArithOp::Div => l.checked_div_euclid(r),
                }
            }
            Expr::Neg { expr } => self.fold_int(expr)?.checked_neg(),
            Expr::Index { .. }
            | Expr::Cmp { .. }
            | Expr::Not { .. }
            | Expr::And { .. }
            | Expr::Or { .. } => None,
        }
    }

    pub(crate) fn fold_bool(&self, expr: &Expr) -> Option<bool> {
        match expr {
            Expr::Cmp { op, lhs, rhs } => {
                let l = self.fold_int(lhs)?;
                let r = self.fold_int(rhs)?;
                Some(match op {
                    CmpOp::Lt => l < r,
                    CmpOp::Le => l <= r,
                    CmpOp::Gt => l > r,
                    CmpOp::Ge => l >= r,
                    CmpOp::Eq => l == r,
                    CmpOp::Ne => l != r,
                })
            }
            Expr::Not { expr } => self.fold_bool(expr).map(|b| !b),
            Expr::And { lhs, rhs } => match (self.fold_bool(lhs), self.fold_bool(rhs)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            Expr::Or { lhs, rhs } => match (self.fold_bool(lhs), self.fold_bool(rhs)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}
