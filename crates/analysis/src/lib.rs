//! # minilang-fv-analysis
//!
//! Bounded verification of programs in a small imperative language:
//! assertion validity for one program and output equivalence of two.
//!
//! The pipeline is
//!
//! 1. [`build_ssa`]: SSA construction with branch merging and bounded loop
//!    unrolling,
//! 2. [`encode`]: SMT-LIB constraints over integers and arrays,
//! 3. [`Verifier`]: one solver query per obligation (plus one composed
//!    query for equivalence), answers mapped to verdicts.
//!
//! ## Usage
//!
//! ```no_run
//! use minilang_fv_analysis::{Expr, Program, Stmt, Verifier, VerifyConfig};
//! use minilang_fv_solver::SolverConfig;
//!
//! let program = Program::new(
//!     vec![],
//!     vec![
//!         Stmt::assign("x", Expr::int(1)),
//!         Stmt::assign("y", Expr::add(Expr::var("x"), Expr::int(2))),
//!         Stmt::assert(Expr::eq(Expr::var("y"), Expr::int(3))),
//!     ],
//! );
//! let verifier =
//!     Verifier::with_solver(SolverConfig::auto_detect().unwrap(), VerifyConfig::default()).unwrap();
//! let report = verifier.check_assertions(&program).unwrap();
//! println!("{}", report.verdict);
//! ```

pub mod ast;
pub mod builder;
pub mod concrete;
pub mod config;
pub mod equivalence;
pub mod error;
pub mod ssa;
mod unroll;
pub mod vcgen;
pub mod verdict;
pub mod verify;
pub mod version;

pub use ast::{ArithOp, CmpOp, Expr, InputDecl, Location, Program, Stmt, VarKind};
pub use builder::build_ssa;
pub use config::VerifyConfig;
pub use error::{BuildError, Side, VerifyError};
pub use ssa::{Fact, ObligationKind, SsaProgram, Symbol, UnrollCaveat};
pub use vcgen::{ProgramEncoding, encode};
pub use verdict::{
    AssertionReport, AssertionVerdict, Counterexample, EquivalenceReport, EquivalenceVerdict,
    Failure, ObligationOutcome, ObligationResult, PairReport,
};
pub use verify::Verifier;
