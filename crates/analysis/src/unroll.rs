//! Bounded loop unrolling.
//!
//! A loop `while g { body }` becomes up to `K` guarded copies of the body.
//! Copy `k` runs under `pc ∧ g_1 ∧ … ∧ g_k`, where `g_k` is the guard
//! translated against the versions left by copy `k-1`. Unrolling stops
//! early once a guard folds to `false`. The copies are then joined from the
//! innermost outward,
//!
//! ```text
//! g_1 ? (g_2 ? (… S_K …) : S_1) : S_0
//! ```
//!
//! so after the loop every name holds the value from the deepest iteration
//! whose guard held. If the guard after the last copy is not provably false
//! the loop is recorded in the unroll caveat.

use minilang_fv_smtlib::Term;

use crate::ast::{Expr, Location, Stmt};
use crate::builder::SsaBuilder;
use crate::error::BuildError;

impl SsaBuilder {
    pub(crate) fn unroll(
        &mut self,
        cond: &Expr,
        body: &[Stmt],
        update: &[Stmt],
        pc: &Term,
        loc: Location,
    ) -> Result<(), BuildError> {
        let mut scopes = vec![self.table.snapshot()];
        let mut guards: Vec<(Term, Option<bool>)> = Vec::new();
        let mut iter_pc = pc.clone();
        let mut exited = false;

        for _ in 0..self.unroll_bound {
            // The guard is translated even when it folds, so divisions in
            // it are checked on the exit path too.
            let guard = self.bool_expr(cond, &iter_pc, loc)?;
            let known = self.fold_bool(cond);
            if known == Some(false) {
                exited = true;
                break;
            }
            iter_pc = iter_pc.conjoin(guard.clone());
            self.stmts(body, &iter_pc)?;
            self.stmts(update, &iter_pc)?;
            guards.push((guard, known));
            scopes.push(self.table.snapshot());
        }

        if !exited {
            self.bool_expr(cond, &iter_pc, loc)?;
            if self.fold_bool(cond) != Some(false) {
                tracing::warn!(
                    %loc,
                    bound = self.unroll_bound,
                    "loop guard may still hold after unrolling bound"
                );
                self.unbounded_loops.push(loc);
            }
        }

        let iterations = guards.len();
        let mut inner = scopes.pop().unwrap_or_default();
        while let Some((guard, known)) = guards.pop() {
            let outer = scopes.pop().unwrap_or_default();
            self.merge(&guard, known, &inner, &outer);
            inner = self.table.snapshot();
        }
        self.table.restore(inner);

        tracing::debug!(%loc, iterations, exited, "unrolled loop");
        Ok(())
    }
}
