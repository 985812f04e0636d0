//! Constraint generation: SSA facts to SMT-LIB.
//!
//! Every definition becomes a guarded equality and every phi a pair of
//! implications:
//!
//! ```text
//! (assert (=> pc (= x@2 (+ x@1 1))))           ; Assign
//! (assert (=> pc (= a@1 (store a@0 i@1 v))))   ; ArrayWrite
//! (assert (=> c (= m t)))                      ; Phi
//! (assert (=> (not c) (= m f)))
//! ```
//!
//! Root-level definitions (path `true`) are emitted as plain equalities.
//! Obligations are not asserted; they become [`Goal`]s checked one at a
//! time as `encoding ∧ pc ∧ ¬cond`.

use std::collections::BTreeMap;

use minilang_fv_smtlib::{Command, Script, Sort, Term};

use crate::ast::{Location, VarKind};
use crate::ssa::{Fact, ObligationKind, SsaProgram};

/// A property to prove against a program encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub kind: ObligationKind,
    pub path: Term,
    pub cond: Term,
    pub loc: Location,
}

impl Goal {
    /// `pc ∧ ¬cond`: satisfiable exactly when the goal can fail.
    pub fn negation(&self) -> Vec<Term> {
        let mut terms = Vec::with_capacity(2);
        if !self.path.is_true() {
            terms.push(self.path.clone());
        }
        terms.push(Term::not(self.cond.clone()));
        terms
    }
}

/// The SMT encoding of one program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramEncoding {
    /// Every symbol with its sort, sorted by name.
    pub declarations: BTreeMap<String, Sort>,
    /// Definitions, in fact order.
    pub assertions: Vec<Term>,
    /// Obligations, in fact order.
    pub goals: Vec<Goal>,
}

/// Build the encoding of `ssa`.
pub fn encode(ssa: &SsaProgram) -> ProgramEncoding {
    let declarations = ssa
        .symbols
        .iter()
        .map(|(sym, kind)| (sym.smt_name(), sort_of(*kind)))
        .collect();

    let mut assertions = Vec::new();
    let mut goals = Vec::new();
    for fact in &ssa.facts {
        match fact {
            Fact::Assign { var, value, path } => {
                assertions.push(guarded(path, Term::equals(var.term(), value.clone())));
            }
            Fact::ArrayWrite {
                array,
                base,
                index,
                value,
                path,
            } => {
                let stored = Term::store(base.term(), index.clone(), value.clone());
                assertions.push(guarded(path, Term::equals(array.term(), stored)));
            }
            Fact::Phi {
                var,
                if_true,
                if_false,
                cond,
            } => {
                assertions.push(Term::implies(
                    cond.clone(),
                    Term::equals(var.term(), if_true.term()),
                ));
                assertions.push(Term::implies(
                    Term::not(cond.clone()),
                    Term::equals(var.term(), if_false.term()),
                ));
            }
            Fact::Obligation(ob) => goals.push(Goal {
                kind: ob.kind,
                path: ob.path.clone(),
                cond: ob.cond.clone(),
                loc: ob.loc,
            }),
        }
    }

    tracing::debug!(
        declarations = ssa.symbols.len(),
        assertions = assertions.len(),
        goals = goals.len(),
        "encoded program"
    );
    ProgramEncoding {
        declarations,
        assertions,
        goals,
    }
}

pub fn sort_of(kind: VarKind) -> Sort {
    match kind {
        VarKind::Scalar => Sort::Int,
        VarKind::Array => Sort::int_array(),
    }
}

fn guarded(path: &Term, body: Term) -> Term {
    if path.is_true() {
        body
    } else {
        Term::implies(path.clone(), body)
    }
}

/// Smallest standard logic covering the given declarations and terms.
pub fn select_logic<'a>(
    declarations: impl IntoIterator<Item = &'a Sort>,
    terms: impl IntoIterator<Item = &'a Term>,
) -> &'static str {
    let arrays = declarations.into_iter().any(Sort::is_array);
    let nonlinear = terms.into_iter().any(Term::is_nonlinear);
    match (arrays, nonlinear) {
        (false, false) => "QF_LIA",
        (false, true) => "QF_NIA",
        (true, false) => "QF_ALIA",
        (true, true) => "QF_ANIA",
    }
}

/// Script header: model production, logic, declarations.
pub fn preamble(logic: &str, declarations: &BTreeMap<String, Sort>) -> Script {
    let mut script = Script::new();
    script.push(Command::SetOption(
        "produce-models".to_string(),
        "true".to_string(),
    ));
    script.push(Command::SetLogic(logic.to_string()));
    for (name, sort) in declarations {
        script.declare(name.clone(), sort.clone());
    }
    script
}

impl ProgramEncoding {
    /// Logic needed for the encoding together with all of its goals.
    pub fn logic(&self) -> &'static str {
        let goal_terms = self.goals.iter().flat_map(|g| [&g.path, &g.cond]);
        select_logic(
            self.declarations.values(),
            self.assertions.iter().chain(goal_terms),
        )
    }

    /// Declarations and definitions, without any goal.
    pub fn to_script(&self) -> Script {
        let mut script = preamble(self.logic(), &self.declarations);
        for term in &self.assertions {
            script.assert(term.clone());
        }
        script
    }

    /// Query whose unsatisfiability proves `goal`.
    pub fn goal_script(&self, goal: &Goal) -> Script {
        let mut script = self.to_script();
        script.comment(format!("{} at {}", goal.kind, goal.loc));
        for term in goal.negation() {
            script.assert(term);
        }
        script.finish_query();
        script
    }

    /// [`ProgramEncoding::goal_script`] of goal `index`.
    pub fn goal_query(&self, index: usize) -> Option<Script> {
        self.goals.get(index).map(|goal| self.goal_script(goal))
    }

    /// A copy with every symbol renamed through `rename`.
    pub fn rename(&self, rename: &impl Fn(&str) -> String) -> ProgramEncoding {
        ProgramEncoding {
            declarations: self
                .declarations
                .iter()
                .map(|(name, sort)| (rename(name), sort.clone()))
                .collect(),
            assertions: self
                .assertions
                .iter()
                .map(|t| t.rename_constants(rename))
                .collect(),
            goals: self
                .goals
                .iter()
                .map(|g| Goal {
                    kind: g.kind,
                    path: g.path.rename_constants(rename),
                    cond: g.cond.rename_constants(rename),
                    loc: g.loc,
                })
                .collect(),
        }
    }

    /// Full SMT-LIB text: the definitions followed by every goal as a
    /// commented, negated assertion inside its own push/pop frame.
    pub fn dump(&self) -> String {
        let mut script = self.to_script();
        for goal in &self.goals {
            script.comment(format!("{} at {}", goal.kind, goal.loc));
            script.push(Command::Push(1));
            for term in goal.negation() {
                script.assert(term);
            }
            script.push(Command::CheckSat);
            script.push(Command::Pop(1));
        }
        script.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr as E, InputDecl, Program, Stmt as S};
    use crate::builder::build_ssa;

    fn encode_program(inputs: Vec<InputDecl>, body: Vec<S>) -> ProgramEncoding {
        encode(&build_ssa(&Program::new(inputs, body), 10).unwrap())
    }

    #[test]
    fn root_assignments_are_plain_equalities() {
        let enc = encode_program(
            vec![],
            vec![
                S::assign("x", E::int(1)),
                S::assign("y", E::int(2)),
                S::assign("z", E::add(E::var("x"), E::var("y"))),
                S::assert(E::eq(E::var("z"), E::int(3))),
            ],
        );
        let text: Vec<String> = enc.assertions.iter().map(Term::to_string).collect();
        assert_eq!(text, vec!["(= x@1 1)", "(= y@1 2)", "(= z@1 (+ x@1 y@1))"]);
        assert_eq!(enc.goals.len(), 1);
        assert_eq!(
            enc.declarations.keys().collect::<Vec<_>>(),
            vec!["x@1", "y@1", "z@1"]
        );
        assert_eq!(enc.logic(), "QF_LIA");
    }

    #[test]
    fn phi_becomes_two_implications() {
        let enc = encode_program(
            vec![InputDecl::scalar("x")],
            vec![S::if_then(
                E::gt(E::var("x"), E::int(0)),
                vec![S::assign("x", E::int(0))],
            )],
        );
        let text: Vec<String> = enc.assertions.iter().map(Term::to_string).collect();
        assert_eq!(
            text,
            vec![
                "(=> (> x@0 0) (= x@1 0))",
                "(=> (> x@0 0) (= x@2 x@1))",
                "(=> (not (> x@0 0)) (= x@2 x@0))",
            ]
        );
    }

    #[test]
    fn arrays_select_array_logic() {
        let enc = encode_program(
            vec![InputDecl::scalar("i")],
            vec![S::array_write("a", E::var("i"), E::int(5))],
        );
        assert_eq!(enc.declarations["a@0"], Sort::int_array());
        assert_eq!(
            enc.assertions[0].to_string(),
            "(= a@1 (store a@0 i@0 5))"
        );
        assert_eq!(enc.logic(), "QF_ALIA");
    }

    #[test]
    fn nonlinear_goal_selects_nonlinear_logic() {
        let enc = encode_program(
            vec![InputDecl::scalar("x")],
            vec![S::assign("y", E::div(E::int(10), E::var("x")))],
        );
        assert_eq!(enc.logic(), "QF_NIA");
        assert_eq!(select_logic([&Sort::int_array()], [&enc.assertions[0]]), "QF_ANIA");
    }

    #[test]
    fn goal_query_negates_condition_under_path() {
        let enc = encode_program(
            vec![InputDecl::scalar("x")],
            vec![S::if_then(
                E::gt(E::var("x"), E::int(0)),
                vec![S::assert(E::gt(E::var("x"), E::int(1))).at(2, 3)],
            )],
        );
        let text = enc.goal_query(0).unwrap().to_string();
        assert!(text.starts_with("(set-option :produce-models true)\n(set-logic QF_LIA)\n"));
        assert!(text.contains(";; assertion at 2:3\n"));
        assert!(text.contains("(assert (> x@0 0))\n(assert (not (> x@0 1)))\n"));
        assert!(text.ends_with("(check-sat)\n(get-model)\n"));
        assert!(enc.goal_query(1).is_none());
    }

    #[test]
    fn rename_prefixes_all_symbols() {
        let enc = encode_program(
            vec![InputDecl::scalar("x")],
            vec![
                S::assign("y", E::add(E::var("x"), E::int(1))),
                S::assert(E::gt(E::var("y"), E::var("x"))),
            ],
        );
        let renamed = enc.rename(&|n| if n == "x@0" { n.to_string() } else { format!("A.{n}") });
        assert_eq!(
            renamed.declarations.keys().collect::<Vec<_>>(),
            vec!["A.y@1", "x@0"]
        );
        assert_eq!(renamed.assertions[0].to_string(), "(= A.y@1 (+ x@0 1))");
        assert_eq!(renamed.goals[0].cond.to_string(), "(> A.y@1 x@0)");
    }

    #[test]
    fn dump_frames_every_goal() {
        let enc = encode_program(
            vec![InputDecl::scalar("x")],
            vec![
                S::assign("y", E::div(E::int(10), E::var("x"))).at(1, 1),
                S::assert(E::gt(E::var("y"), E::int(0))).at(2, 1),
            ],
        );
        let dump = enc.dump();
        assert_eq!(dump.matches("(push 1)").count(), 2);
        assert_eq!(dump.matches("(check-sat)").count(), 2);
        assert!(dump.contains(";; division by zero at 1:1\n"));
        assert!(dump.contains("(assert (not (distinct x@0 0)))"));
    }
}
