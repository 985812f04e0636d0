//! Composition of two programs into one equivalence query.
//!
//! Both programs are encoded on their own. Every symbol is then prefixed
//! with `A.` or `B.`, except version-0 symbols both programs have with the
//! same kind: those are the shared inputs and keep their plain name, so the
//! two programs read the same entry values. The query asserts both
//! encodings and that at least one output differs:
//!
//! ```text
//! encA ∧ encB ∧ (A.o1@k ≠ B.o1@m ∨ …)
//! ```

use std::collections::{BTreeMap, BTreeSet};

use minilang_fv_smtlib::{Script, Sort, Term};
use minilang_fv_solver::Model;

use crate::ast::{Program, VarKind};
use crate::error::{Side, VerifyError};
use crate::ssa::{SsaProgram, Symbol};
use crate::vcgen::{self, ProgramEncoding};
use crate::verdict::{Counterexample, OutputValues};

/// An output compared by the query, with its final symbol in each program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub name: String,
    pub kind: VarKind,
    pub a: Symbol,
    pub b: Symbol,
}

/// The names both programs are compared on.
///
/// `requested` names must be defined in both programs with the same kind.
/// Without a request, every name assigned in both programs is compared.
pub fn resolve_outputs(
    requested: Option<&[String]>,
    programs: (&Program, &Program),
    ssa: (&SsaProgram, &SsaProgram),
) -> Result<Vec<Output>, VerifyError> {
    let names: BTreeSet<String> = match requested {
        Some(names) => names.iter().cloned().collect(),
        None => {
            let in_b = programs.1.assigned_names();
            let common: BTreeSet<String> = programs
                .0
                .assigned_names()
                .into_iter()
                .filter(|n| in_b.contains(n))
                .collect();
            if common.is_empty() {
                return Err(VerifyError::Config(
                    "the programs assign no variable in common; name the outputs to compare"
                        .to_string(),
                ));
            }
            common
        }
    };

    let final_of = |side: Side, program: &SsaProgram, name: &str| {
        let sym = program
            .finals
            .get(name)
            .cloned()
            .ok_or_else(|| VerifyError::UnknownOutput {
                name: name.to_string(),
                side,
            })?;
        let kind = program.kind_of(name).unwrap_or_default();
        Ok::<_, VerifyError>((sym, kind))
    };

    names
        .into_iter()
        .map(|name| {
            let (a, kind_a) = final_of(Side::A, ssa.0, &name)?;
            let (b, kind_b) = final_of(Side::B, ssa.1, &name)?;
            if kind_a != kind_b {
                return Err(VerifyError::OutputKindMismatch {
                    name,
                    a: kind_a,
                    b: kind_b,
                });
            }
            Ok(Output {
                name,
                kind: kind_a,
                a,
                b,
            })
        })
        .collect()
}

/// Symbol naming across the two programs.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    /// SMT names of the shared version-0 symbols.
    shared: BTreeSet<String>,
}

impl Namespace {
    /// Shared symbols are the version-0 symbols of both programs that agree
    /// on kind.
    pub fn new(a: &SsaProgram, b: &SsaProgram) -> Self {
        let initial_b: BTreeMap<&Symbol, VarKind> = b.initial_symbols().collect();
        let shared = a
            .initial_symbols()
            .filter(|(sym, kind)| initial_b.get(sym) == Some(kind))
            .map(|(sym, _)| sym.smt_name())
            .collect();
        Self { shared }
    }

    pub fn is_shared(&self, smt_name: &str) -> bool {
        self.shared.contains(smt_name)
    }

    /// Name of `smt_name` of program `side` in the composed query.
    pub fn qualify(&self, side: Side, smt_name: &str) -> String {
        if self.is_shared(smt_name) {
            smt_name.to_string()
        } else {
            format!("{}{smt_name}", side.prefix())
        }
    }

    /// Check that renaming keeps every symbol distinct, and that only
    /// shared symbols coincide across the programs.
    pub fn check_collisions(
        &self,
        a: &ProgramEncoding,
        b: &ProgramEncoding,
    ) -> Result<(), VerifyError> {
        let mut owners: BTreeMap<String, Option<Side>> = BTreeMap::new();
        for (side, enc) in [(Side::A, a), (Side::B, b)] {
            for name in enc.declarations.keys() {
                let owner = if self.is_shared(name) { None } else { Some(side) };
                let qualified = self.qualify(side, name);
                match owners.insert(qualified.clone(), owner) {
                    None => {}
                    Some(None) if owner.is_none() && side == Side::B => {}
                    Some(_) => return Err(VerifyError::NamespaceCollision { name: qualified }),
                }
            }
        }
        Ok(())
    }
}

/// The composed equivalence query and what is needed to read its model.
#[derive(Debug, Clone)]
pub struct Composition {
    pub namespace: Namespace,
    pub outputs: Vec<Output>,
    pub declarations: BTreeMap<String, Sort>,
    pub script: Script,
}

/// Compose the encodings of two programs into the query
/// `encA ∧ encB ∧ some output differs`.
pub fn compose(
    ssa: (&SsaProgram, &SsaProgram),
    enc: (&ProgramEncoding, &ProgramEncoding),
    outputs: Vec<Output>,
) -> Result<Composition, VerifyError> {
    let namespace = Namespace::new(ssa.0, ssa.1);
    namespace.check_collisions(enc.0, enc.1)?;

    let renamed_a = enc.0.rename(&|n: &str| namespace.qualify(Side::A, n));
    let renamed_b = enc.1.rename(&|n: &str| namespace.qualify(Side::B, n));

    let mut declarations = renamed_a.declarations.clone();
    declarations.extend(renamed_b.declarations.clone());

    let mut differs: Vec<Term> = outputs
        .iter()
        .map(|o| {
            Term::Distinct(vec![
                Term::constant(namespace.qualify(Side::A, &o.a.smt_name())),
                Term::constant(namespace.qualify(Side::B, &o.b.smt_name())),
            ])
        })
        .collect();
    let goal = if differs.len() == 1 {
        differs.remove(0)
    } else {
        Term::Or(differs)
    };

    let logic = vcgen::select_logic(
        declarations.values(),
        renamed_a
            .assertions
            .iter()
            .chain(&renamed_b.assertions)
            .chain(std::iter::once(&goal)),
    );
    let mut script = vcgen::preamble(logic, &declarations);
    script.comment("program A");
    for term in renamed_a.assertions {
        script.assert(term);
    }
    script.comment("program B");
    for term in renamed_b.assertions {
        script.assert(term);
    }
    let names: Vec<&str> = outputs.iter().map(|o| o.name.as_str()).collect();
    script.comment(format!("some output differs: {}", names.join(", ")));
    script.assert(goal);
    script.finish_query();

    tracing::debug!(
        shared = namespace.shared.len(),
        outputs = outputs.len(),
        declarations = declarations.len(),
        logic,
        "composed equivalence query"
    );
    Ok(Composition {
        namespace,
        outputs,
        declarations,
        script,
    })
}

impl Composition {
    /// Split a model of the query into shared inputs, per-program inputs
    /// and output values.
    pub fn counterexample(
        &self,
        model: &Model,
        a: &SsaProgram,
        b: &SsaProgram,
    ) -> Counterexample {
        let mut cex = Counterexample::default();
        for (side, ssa) in [(Side::A, a), (Side::B, b)] {
            for (sym, _) in ssa.initial_symbols() {
                let smt_name = sym.smt_name();
                let Some(value) = model.value(&self.namespace.qualify(side, &smt_name)) else {
                    continue;
                };
                let target = if self.namespace.is_shared(&smt_name) {
                    &mut cex.shared_inputs
                } else if side == Side::A {
                    &mut cex.inputs_a
                } else {
                    &mut cex.inputs_b
                };
                target.insert(sym.name.clone(), value);
            }
        }
        cex.outputs = self
            .outputs
            .iter()
            .map(|o| OutputValues {
                name: o.name.clone(),
                a: model.value(&self.namespace.qualify(Side::A, &o.a.smt_name())),
                b: model.value(&self.namespace.qualify(Side::B, &o.b.smt_name())),
            })
            .collect();
        cex
    }
}
