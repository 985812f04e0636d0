//! Concrete execution, used to replay counterexamples.
//!
//! [`execute`] runs a program on concrete inputs with the same arithmetic as
//! the SMT encoding (unbounded integers approximated by checked `i128`,
//! Euclidean `div`) but with real, unbounded loops limited only by fuel.
//! [`evaluate_ssa`] evaluates the SSA facts of a program directly, which is
//! how the tests compare the two.

use std::collections::BTreeMap;

use minilang_fv_smtlib::Term;
use minilang_fv_solver::{ArrayValue, ModelValue};
use thiserror::Error;

use crate::ast::{ArithOp, CmpOp, Expr, Location, Program, Stmt, VarKind};
use crate::ssa::{Fact, SsaProgram, Symbol};

/// Statement budget for one execution.
pub const DEFAULT_FUEL: u64 = 100_000;

/// A concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i128),
    Bool(bool),
    Array(ArrayValue),
}

impl Value {
    /// The value a name of `kind` has when nothing is known about it.
    pub fn zero(kind: VarKind) -> Self {
        match kind {
            VarKind::Scalar => Value::Int(0),
            VarKind::Array => Value::Array(ArrayValue::constant(0)),
        }
    }

    fn from_model(value: &ModelValue) -> Option<Self> {
        match value {
            ModelValue::Int(n) => Some(Value::Int(*n)),
            ModelValue::Bool(b) => Some(Value::Bool(*b)),
            ModelValue::Array(a) => Some(Value::Array(a.clone())),
            ModelValue::Other(_) => None,
        }
    }
}

/// Why an execution stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("{loc}: division by zero")]
    DivisionByZero { loc: Location },
    #[error("{loc}: integer overflow")]
    Overflow { loc: Location },
    #[error("execution exceeded {fuel} steps")]
    OutOfFuel { fuel: u64 },
    #[error("{loc}: {message}")]
    Malformed { message: String, loc: Location },
}

/// Outcome of [`execute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Every name the program wrote, with its last value.
    pub env: BTreeMap<String, Value>,
    /// Locations of `verify` statements that evaluated to false, in order.
    pub failed_assertions: Vec<Location>,
    /// Set when execution stopped before the end of the program.
    pub halted: Option<ExecError>,
}

impl Execution {
    pub fn completed(&self) -> bool {
        self.halted.is_none()
    }

    pub fn int(&self, name: &str) -> Option<i128> {
        match self.env.get(name)? {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Value of `name` at exit. A name the program never wrote still holds
    /// its entry value from `initial`, or zero.
    pub fn final_value(
        &self,
        name: &str,
        kind: VarKind,
        initial: &BTreeMap<String, ModelValue>,
    ) -> Value {
        entry_or_current(&self.env, initial, name, kind)
    }
}

fn entry_or_current(
    env: &BTreeMap<String, Value>,
    initial: &BTreeMap<String, ModelValue>,
    name: &str,
    kind: VarKind,
) -> Value {
    env.get(name)
        .cloned()
        .or_else(|| initial.get(name).and_then(Value::from_model))
        .unwrap_or_else(|| Value::zero(kind))
}

/// Run `program` with the given entry values.
///
/// `initial` maps source names to their entry value (declared inputs and
/// initial contents); names missing from it start at zero. A failing
/// `verify` is recorded and execution continues; division by zero,
/// overflow and running out of fuel stop it.
pub fn execute(program: &Program, initial: &BTreeMap<String, ModelValue>, fuel: u64) -> Execution {
    let mut interp = Interpreter {
        initial,
        env: BTreeMap::new(),
        failed: Vec::new(),
        fuel,
        budget: fuel,
    };
    let halted = interp.stmts(&program.body).err();
    if let Some(err) = &halted {
        tracing::debug!(%err, "concrete execution halted");
    }
    Execution {
        env: interp.env,
        failed_assertions: interp.failed,
        halted,
    }
}

struct Interpreter<'a> {
    initial: &'a BTreeMap<String, ModelValue>,
    env: BTreeMap<String, Value>,
    failed: Vec<Location>,
    fuel: u64,
    budget: u64,
}

impl Interpreter<'_> {
    fn tick(&mut self) -> Result<(), ExecError> {
        if self.budget == 0 {
            return Err(ExecError::OutOfFuel { fuel: self.fuel });
        }
        self.budget -= 1;
        Ok(())
    }

    fn read(&self, name: &str, kind: VarKind) -> Value {
        entry_or_current(&self.env, self.initial, name, kind)
    }

    fn stmts(&mut self, stmts: &[Stmt]) -> Result<(), ExecError> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), ExecError> {
        self.tick()?;
        match stmt {
            Stmt::Assign { target, value, loc } => {
                let v = self.int(value, *loc)?;
                self.env.insert(target.clone(), Value::Int(v));
            }
            Stmt::ArrayWrite {
                array,
                index,
                value,
                loc,
            } => {
                let i = self.int(index, *loc)?;
                let v = self.int(value, *loc)?;
                let Value::Array(mut contents) = self.read(array, VarKind::Array) else {
                    return Err(malformed(format!("`{array}` is not an array"), *loc));
                };
                contents.set(i, v);
                self.env.insert(array.clone(), Value::Array(contents));
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                loc,
            } => {
                if self.bool(cond, *loc)? {
                    self.stmts(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.stmts(else_branch)?;
                }
            }
            Stmt::While { cond, body, loc } => {
                while self.bool(cond, *loc)? {
                    self.tick()?;
                    self.stmts(body)?;
                }
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
                loc,
            } => {
                self.stmts(init)?;
                while self.bool(cond, *loc)? {
                    self.tick()?;
                    self.stmts(body)?;
                    self.stmts(update)?;
                }
            }
            Stmt::Assert { cond, loc } => {
                if !self.bool(cond, *loc)? {
                    self.failed.push(*loc);
                }
            }
            Stmt::Block { body } => self.stmts(body)?,
        }
        Ok(())
    }

    fn int(&self, expr: &Expr, loc: Location) -> Result<i128, ExecError> {
        let overflow = || ExecError::Overflow { loc };
        match expr {
            Expr::Int { value } => Ok(i128::from(*value)),
            Expr::Var { name } => match self.read(name, VarKind::Scalar) {
                Value::Int(n) => Ok(n),
                _ => Err(malformed(format!("`{name}` is not a scalar"), loc)),
            },
            Expr::Index { array, index } => {
                let i = self.int(index, loc)?;
                match self.read(array, VarKind::Array) {
                    Value::Array(contents) => Ok(contents.get(i).unwrap_or(0)),
                    _ => Err(malformed(format!("`{array}` is not an array"), loc)),
                }
            }
            Expr::Arith { op, lhs, rhs } => {
                let l = self.int(lhs, loc)?;
                let r = self.int(rhs, loc)?;
                match op {
                    ArithOp::Add => l.checked_add(r).ok_or_else(overflow),
                    ArithOp::Sub => l.checked_sub(r).ok_or_else(overflow),
                    ArithOp::Mul => l.checked_mul(r).ok_or_else(overflow),
                    ArithOp::Div if r == 0 => Err(ExecError::DivisionByZero { loc }),
                    ArithOp::Div => l.checked_div_euclid(r).ok_or_else(overflow),
                }
            }
            Expr::Neg { expr } => self.int(expr, loc)?.checked_neg().ok_or_else(overflow),
            Expr::Cmp { .. } | Expr::Not { .. } | Expr::And { .. } | Expr::Or { .. } => Err(
                malformed("boolean expression used as a number".to_string(), loc),
            ),
        }
    }

    /// Both operands of `and`/`or` are evaluated, matching the encoding.
    fn bool(&self, expr: &Expr, loc: Location) -> Result<bool, ExecError> {
        match expr {
            Expr::Cmp { op, lhs, rhs } => {
                let l = self.int(lhs, loc)?;
                let r = self.int(rhs, loc)?;
                Ok(compare(*op, l, r))
            }
            Expr::Not { expr } => Ok(!self.bool(expr, loc)?),
            Expr::And { lhs, rhs } => {
                let l = self.bool(lhs, loc)?;
                let r = self.bool(rhs, loc)?;
                Ok(l && r)
            }
            Expr::Or { lhs, rhs } => {
                let l = self.bool(lhs, loc)?;
                let r = self.bool(rhs, loc)?;
                Ok(l || r)
            }
            _ => Err(malformed(
                "arithmetic expression used as a condition".to_string(),
                loc,
            )),
        }
    }
}

fn malformed(message: String, loc: Location) -> ExecError {
    ExecError::Malformed { message, loc }
}

fn compare(op: CmpOp, l: i128, r: i128) -> bool {
    match op {
        CmpOp::Lt => l < r,
        CmpOp::Le => l <= r,
        CmpOp::Gt => l > r,
        CmpOp::Ge => l >= r,
        CmpOp::Eq => l == r,
        CmpOp::Ne => l != r,
    }
}

// ---------------------------------------------------------------------------
// SSA evaluation
// ---------------------------------------------------------------------------

/// Evaluate the facts of `ssa` in order, starting from `initial`.
///
/// A definition whose path condition is false, or whose value depends on an
/// undefined symbol, leaves its symbol undefined. Undefined symbols are
/// exactly the ones the encoding leaves unconstrained.
pub fn evaluate_ssa(
    ssa: &SsaProgram,
    initial: &BTreeMap<String, ModelValue>,
) -> BTreeMap<Symbol, Value> {
    let mut values: BTreeMap<Symbol, Value> = ssa
        .initial_symbols()
        .map(|(sym, kind)| {
            let value = initial
                .get(&sym.name)
                .and_then(Value::from_model)
                .unwrap_or_else(|| Value::zero(kind));
            (sym.clone(), value)
        })
        .collect();

    for fact in &ssa.facts {
        match fact {
            Fact::Assign { var, value, path } => {
                if eval_bool(path, &values) == Some(true) {
                    if let Some(v) = eval_term(value, &values) {
                        values.insert(var.clone(), v);
                    }
                }
            }
            Fact::ArrayWrite {
                array,
                base,
                index,
                value,
                path,
            } => {
                if eval_bool(path, &values) != Some(true) {
                    continue;
                }
                let stored = eval_term(
                    &Term::store(base.term(), index.clone(), value.clone()),
                    &values,
                );
                if let Some(v) = stored {
                    values.insert(array.clone(), v);
                }
            }
            Fact::Phi {
                var,
                if_true,
                if_false,
                cond,
            } => {
                let source = match eval_bool(cond, &values) {
                    Some(true) => if_true,
                    Some(false) => if_false,
                    None => continue,
                };
                if let Some(v) = values.get(source).cloned() {
                    values.insert(var.clone(), v);
                }
            }
            Fact::Obligation(_) => {}
        }
    }
    values
}

fn eval_bool(term: &Term, values: &BTreeMap<Symbol, Value>) -> Option<bool> {
    match eval_term(term, values)? {
        Value::Bool(b) => Some(b),
        _ => None,
    }
}

fn eval_int(term: &Term, values: &BTreeMap<Symbol, Value>) -> Option<i128> {
    match eval_term(term, values)? {
        Value::Int(n) => Some(n),
        _ => None,
    }
}

/// Value of `term`, or `None` if it reads an undefined symbol, divides by
/// zero or overflows.
fn eval_term(term: &Term, values: &BTreeMap<Symbol, Value>) -> Option<Value> {
    let int2 = |a: &Term, b: &Term| Some((eval_int(a, values)?, eval_int(b, values)?));
    Some(match term {
        Term::BoolLit(b) => Value::Bool(*b),
        Term::IntLit(n) => Value::Int(*n),
        Term::Const(name) => values.get(&Symbol::parse(name)?)?.clone(),
        Term::Not(a) => Value::Bool(!eval_bool(a, values)?),
        Term::And(ts) => Value::Bool(
            ts.iter()
                .map(|t| eval_bool(t, values))
                .collect::<Option<Vec<_>>>()?
                .into_iter()
                .all(|b| b),
        ),
        Term::Or(ts) => Value::Bool(
            ts.iter()
                .map(|t| eval_bool(t, values))
                .collect::<Option<Vec<_>>>()?
                .into_iter()
                .any(|b| b),
        ),
        Term::Implies(a, b) => Value::Bool(!eval_bool(a, values)? || eval_bool(b, values)?),
        Term::Eq(a, b) => Value::Bool(eval_term(a, values)? == eval_term(b, values)?),
        Term::Distinct(ts) => {
            let vs = ts
                .iter()
                .map(|t| eval_term(t, values))
                .collect::<Option<Vec<_>>>()?;
            let all_distinct = vs
                .iter()
                .enumerate()
                .all(|(i, v)| vs[i + 1..].iter().all(|w| w != v));
            Value::Bool(all_distinct)
        }
        Term::IntAdd(a, b) => {
            let (l, r) = int2(a, b)?;
            Value::Int(l.checked_add(r)?)
        }
        Term::IntSub(a, b) => {
            let (l, r) = int2(a, b)?;
            Value::Int(l.checked_sub(r)?)
        }
        Term::IntMul(a, b) => {
            let (l, r) = int2(a, b)?;
            Value::Int(l.checked_mul(r)?)
        }
        Term::IntDiv(a, b) => {
            let (l, r) = int2(a, b)?;
            if r == 0 {
                return None;
            }
            Value::Int(l.checked_div_euclid(r)?)
        }
        Term::IntNeg(a) => Value::Int(eval_int(a, values)?.checked_neg()?),
        Term::IntLt(a, b) => {
            let (l, r) = int2(a, b)?;
            Value::Bool(l < r)
        }
        Term::IntLe(a, b) => {
            let (l, r) = int2(a, b)?;
            Value::Bool(l <= r)
        }
        Term::IntGt(a, b) => {
            let (l, r) = int2(a, b)?;
            Value::Bool(l > r)
        }
        Term::IntGe(a, b) => {
            let (l, r) = int2(a, b)?;
            Value::Bool(l >= r)
        }
        Term::Select(a, i) => {
            let Value::Array(contents) = eval_term(a, values)? else {
                return None;
            };
            Value::Int(contents.get(eval_int(i, values)?).unwrap_or(0))
        }
        Term::Store(a, i, v) => {
            let Value::Array(mut contents) = eval_term(a, values)? else {
                return None;
            };
            contents.set(eval_int(i, values)?, eval_int(v, values)?);
            Value::Array(contents)
        }
    })
}
