use std::collections::BTreeSet;

/// SMT-LIB term (expression) representation.
///
/// Covers the quantifier-free fragment over integers and integer arrays:
/// everything the SSA encoding of a program can produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    // === Literals ===
    /// Boolean literal
    BoolLit(bool),
    /// Integer literal (unbounded)
    IntLit(i128),

    // === Variables ===
    /// Named constant reference (an SSA symbol such as `x@2`)
    Const(String),

    // === Boolean operations ===
    /// Logical NOT
    Not(Box<Term>),
    /// Logical AND (n-ary)
    And(Vec<Term>),
    /// Logical OR (n-ary)
    Or(Vec<Term>),
    /// Logical implication: `(=> a b)`
    Implies(Box<Term>, Box<Term>),

    // === Core ===
    /// Equality: `(= a b)`
    Eq(Box<Term>, Box<Term>),
    /// Distinct: `(distinct a b ...)`
    Distinct(Vec<Term>),

    // === Integer arithmetic ===
    /// `(+ a b)`
    IntAdd(Box<Term>, Box<Term>),
    /// `(- a b)`
    IntSub(Box<Term>, Box<Term>),
    /// `(* a b)`
    IntMul(Box<Term>, Box<Term>),
    /// `(div a b)`, SMT-LIB euclidean integer division
    IntDiv(Box<Term>, Box<Term>),
    /// `(- a)`
    IntNeg(Box<Term>),
    /// `(< a b)`
    IntLt(Box<Term>, Box<Term>),
    /// `(<= a b)`
    IntLe(Box<Term>, Box<Term>),
    /// `(> a b)`
    IntGt(Box<Term>, Box<Term>),
    /// `(>= a b)`
    IntGe(Box<Term>, Box<Term>),

    // === Array operations ===
    /// `(select array index)`
    Select(Box<Term>, Box<Term>),
    /// `(store array index value)`
    Store(Box<Term>, Box<Term>, Box<Term>),
}

impl Term {
    pub fn constant(name: impl Into<String>) -> Self {
        Term::Const(name.into())
    }

    pub fn int(value: impl Into<i128>) -> Self {
        Term::IntLit(value.into())
    }

    pub fn not(inner: Term) -> Self {
        Term::Not(Box::new(inner))
    }

    /// `(= lhs rhs)`.
    pub fn equals(lhs: Term, rhs: Term) -> Self {
        Term::Eq(Box::new(lhs), Box::new(rhs))
    }

    pub fn implies(lhs: Term, rhs: Term) -> Self {
        Term::Implies(Box::new(lhs), Box::new(rhs))
    }

    pub fn select(array: Term, index: Term) -> Self {
        Term::Select(Box::new(array), Box::new(index))
    }

    pub fn store(array: Term, index: Term, value: Term) -> Self {
        Term::Store(Box::new(array), Box::new(index), Box::new(value))
    }

    /// Returns `true` if this is the literal `true`.
    pub fn is_true(&self) -> bool {
        matches!(self, Term::BoolLit(true))
    }

    /// Extend a conjunction with one more conjunct.
    ///
    /// `true ∧ g` is `g`, and an existing `and` is extended in place, so a
    /// path condition built guard by guard stays a flat n-ary `and`.
    pub fn conjoin(self, conjunct: Term) -> Term {
        match self {
            Term::BoolLit(true) => conjunct,
            Term::And(mut conjuncts) => {
                conjuncts.push(conjunct);
                Term::And(conjuncts)
            }
            other => Term::And(vec![other, conjunct]),
        }
    }

    /// Direct children of this term, in argument order.
    pub fn children(&self) -> Vec<&Term> {
        match self {
            Term::BoolLit(_) | Term::IntLit(_) | Term::Const(_) => Vec::new(),
            Term::Not(a) | Term::IntNeg(a) => vec![&**a],
            Term::And(ts) | Term::Or(ts) | Term::Distinct(ts) => ts.iter().collect(),
            Term::Implies(a, b)
            | Term::Eq(a, b)
            | Term::IntAdd(a, b)
            | Term::IntSub(a, b)
            | Term::IntMul(a, b)
            | Term::IntDiv(a, b)
            | Term::IntLt(a, b)
            | Term::IntLe(a, b)
            | Term::IntGt(a, b)
            | Term::IntGe(a, b)
            | Term::Select(a, b) => vec![&**a, &**b],
            Term::Store(a, b, c) => vec![&**a, &**b, &**c],
        }
    }

    /// All constant names referenced by this term, sorted.
    pub fn constants(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_constants(&mut out);
        out
    }

    fn collect_constants(&self, out: &mut BTreeSet<String>) {
        if let Term::Const(name) = self {
            out.insert(name.clone());
        }
        for child in self.children() {
            child.collect_constants(out);
        }
    }

    /// Returns `true` if the term multiplies or divides two non-literal
    /// operands, i.e. it leaves linear integer arithmetic.
    pub fn is_nonlinear(&self) -> bool {
        let own = match self {
            Term::IntMul(a, b) => !is_lit(a) && !is_lit(b),
            // `div` by a non-literal is non-linear even with a literal dividend.
            Term::IntDiv(_, b) => !is_lit(b),
            _ => false,
        };
        own || self.children().into_iter().any(Term::is_nonlinear)
    }

    /// Rebuild the term with every constant renamed through `rename`.
    pub fn rename_constants(&self, rename: &impl Fn(&str) -> String) -> Term {
        let r = |t: &Term| Box::new(t.rename_constants(rename));
        let rv = |ts: &Vec<Term>| -> Vec<Term> {
            ts.iter().map(|t| t.rename_constants(rename)).collect()
        };
        match self {
            Term::BoolLit(b) => Term::BoolLit(*b),
            Term::IntLit(n) => Term::IntLit(*n),
            Term::Const(name) => Term::Const(rename(name)),
            Term::Not(a) => Term::Not(r(a)),
            Term::And(ts) => Term::And(rv(ts)),
            Term::Or(ts) => Term::Or(rv(ts)),
            Term::Implies(a, b) => Term::Implies(r(a), r(b)),
            Term::Eq(a, b) => Term::Eq(r(a), r(b)),
            Term::Distinct(ts) => Term::Distinct(rv(ts)),
            Term::IntAdd(a, b) => Term::IntAdd(r(a), r(b)),
            Term::IntSub(a, b) => Term::IntSub(r(a), r(b)),
            Term::IntMul(a, b) => Term::IntMul(r(a), r(b)),
            Term::IntDiv(a, b) => Term::IntDiv(r(a), r(b)),
            Term::IntNeg(a) => Term::IntNeg(r(a)),
            Term::IntLt(a, b) => Term::IntLt(r(a), r(b)),
            Term::IntLe(a, b) => Term::IntLe(r(a), r(b)),
            Term::IntGt(a, b) => Term::IntGt(r(a), r(b)),
            Term::IntGe(a, b) => Term::IntGe(r(a), r(b)),
            Term::Select(a, b) => Term::Select(r(a), r(b)),
            Term::Store(a, b, c) => Term::Store(r(a), r(b), r(c)),
        }
    }
}

fn is_lit(term: &Term) -> bool {
    matches!(term, Term::IntLit(_))
}
