//! Abstract syntax of the input language.
//!
//! Produced by an external front-end and consumed read-only by the SSA
//! builder. Every type is serde-(de)serializable so programs can be handed
//! over as JSON:
//!
//! ```json
//! { "inputs": [{ "name": "x" }],
//!   "body": [{ "kind": "assign", "target": "y",
//!              "value": { "kind": "arith", "op": "/", "lhs": { "kind": "int", "value": 10 },
//!                         "rhs": { "kind": "var", "name": "x" } },
//!              "loc": { "line": 1, "column": 1 } }] }
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Source position of a statement (1-based).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Whether a name holds an integer or an integer-indexed integer array.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    #[default]
    Scalar,
    Array,
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKind::Scalar => write!(f, "scalar"),
            VarKind::Array => write!(f, "array"),
        }
    }
}

/// A free input of a program: its value on entry is unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDecl {
    pub name: String,
    #[serde(default)]
    pub kind: VarKind,
}

impl InputDecl {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Scalar,
        }
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Array,
        }
    }
}

/// A whole program: declared inputs plus a statement list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub inputs: Vec<InputDecl>,
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new(inputs: Vec<InputDecl>, body: Vec<Stmt>) -> Self {
        Self { inputs, body }
    }

    /// Every name written by an assignment or array store anywhere in the
    /// program. The language has a single global scope, so these are the
    /// program's observable variables.
    pub fn assigned_names(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        collect_assigned(&self.body, &mut out);
        out
    }
}

fn collect_assigned(stmts: &[Stmt], out: &mut BTreeSet<String>) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign { target, .. } => {
                out.insert(target.clone());
            }
            Stmt::ArrayWrite { array, .. } => {
                out.insert(array.clone());
            }
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect_assigned(then_branch, out);
                if let Some(else_branch) = else_branch {
                    collect_assigned(else_branch, out);
                }
            }
            Stmt::While { body, .. } => collect_assigned(body, out),
            Stmt::For {
                init, update, body, ..
            } => {
                collect_assigned(init, out);
                collect_assigned(body, out);
                collect_assigned(update, out);
            }
            Stmt::Block { body } => collect_assigned(body, out),
            Stmt::Assert { .. } => {}
        }
    }
}

/// Statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    /// `target := value`
    Assign {
        target: String,
        value: Expr,
        #[serde(default)]
        loc: Location,
    },
    /// `array[index] := value`
    ArrayWrite {
        array: String,
        index: Expr,
        value: Expr,
        #[serde(default)]
        loc: Location,
    },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        #[serde(default)]
        else_branch: Option<Vec<Stmt>>,
        #[serde(default)]
        loc: Location,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
        #[serde(default)]
        loc: Location,
    },
    /// `for (init; cond; update) body`. `init` runs once; `update` runs after
    /// every iteration of `body`.
    For {
        #[serde(default)]
        init: Vec<Stmt>,
        cond: Expr,
        #[serde(default)]
        update: Vec<Stmt>,
        body: Vec<Stmt>,
        #[serde(default)]
        loc: Location,
    },
    /// `verify(cond)`
    Assert {
        cond: Expr,
        #[serde(default)]
        loc: Location,
    },
    Block { body: Vec<Stmt> },
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        };
        write!(f, "{s}")
    }
}

/// Expressions. Integer-valued and boolean-valued forms share one type; the
/// SSA builder rejects a form used in the wrong position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    Int {
        value: i64,
    },
    Var {
        name: String,
    },
    /// `array[index]`
    Index {
        array: String,
        index: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Cmp {
        op: CmpOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not {
        expr: Box<Expr>,
    },
    And {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Or {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Unary minus.
    Neg {
        expr: Box<Expr>,
    },
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Int { value }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var { name: name.into() }
    }

    pub fn index(array: impl Into<String>, index: Expr) -> Self {
        Expr::Index {
            array: array.into(),
            index: Box::new(index),
        }
    }

    pub fn arith(op: ArithOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Arith {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn cmp(op: CmpOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Cmp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::arith(ArithOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::arith(ArithOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Self::arith(ArithOp::Mul, lhs, rhs)
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Self {
        Self::arith(ArithOp::Div, lhs, rhs)
    }

    pub fn lt(lhs: Expr, rhs: Expr) -> Self {
        Self::cmp(CmpOp::Lt, lhs, rhs)
    }

    pub fn gt(lhs: Expr, rhs: Expr) -> Self {
        Self::cmp(CmpOp::Gt, lhs, rhs)
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::cmp(CmpOp::Eq, lhs, rhs)
    }

    pub fn not(expr: Expr) -> Self {
        Expr::Not {
            expr: Box::new(expr),
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Expr::And {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Expr::Or {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn neg(expr: Expr) -> Self {
        Expr::Neg {
            expr: Box::new(expr),
        }
    }
}

impl Stmt {
    pub fn assign(target: impl Into<String>, value: Expr) -> Self {
        Stmt::Assign {
            target: target.into(),
            value,
            loc: Location::default(),
        }
    }

    pub fn array_write(array: impl Into<String>, index: Expr, value: Expr) -> Self {
        Stmt::ArrayWrite {
            array: array.into(),
            index,
            value,
            loc: Location::default(),
        }
    }

    pub fn if_then(cond: Expr, then_branch: Vec<Stmt>) -> Self {
        Stmt::If {
            cond,
            then_branch,
            else_branch: None,
            loc: Location::default(),
        }
    }

    pub fn if_else(cond: Expr, then_branch: Vec<Stmt>, else_branch: Vec<Stmt>) -> Self {
        Stmt::If {
            cond,
            then_branch,
            else_branch: Some(else_branch),
            loc: Location::default(),
        }
    }

    pub fn while_loop(cond: Expr, body: Vec<Stmt>) -> Self {
        Stmt::While {
            cond,
            body,
            loc: Location::default(),
        }
    }

    pub fn for_loop(init: Vec<Stmt>, cond: Expr, update: Vec<Stmt>, body: Vec<Stmt>) -> Self {
        Stmt::For {
            init,
            cond,
            update,
            body,
            loc: Location::default(),
        }
    }

    pub fn assert(cond: Expr) -> Self {
        Stmt::Assert {
            cond,
            loc: Location::default(),
        }
    }

    /// Replace the statement's location. `Block` has none and is returned
    /// unchanged.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        match &mut self {
            Stmt::Assign { loc, .. }
            | Stmt::ArrayWrite { loc, .. }
            | Stmt::If { loc, .. }
            | Stmt::While { loc, .. }
            | Stmt::For { loc, .. }
            | Stmt::Assert { loc, .. } => *loc = Location::new(line, column),
            Stmt::Block { .. } => {}
        }
        self
    }

    pub fn loc(&self) -> Option<Location> {
        match self {
            Stmt::Assign { loc, .. }
            | Stmt::ArrayWrite { loc, .. }
            | Stmt::If { loc, .. }
            | Stmt::While { loc, .. }
            | Stmt::For { loc, .. }
            | Stmt::Assert { loc, .. } => Some(*loc),
            Stmt::Block { .. } => None,
        }
    }
}
