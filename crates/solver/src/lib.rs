//! # minilang-fv-solver
//!
//! SMT solver interface for the verification pipeline.
//!
//! Solvers (Z3 or CVC5) run as external processes and exchange SMT-LIB2
//! text. Answers are parsed into [`SolverResult`]; `sat` answers carry a
//! [`Model`] whose integer and array values can be decoded.
//!
//! ## Usage
//!
//! ```no_run
//! use minilang_fv_solver::{CliSolver, SolverResult};
//!
//! let solver = CliSolver::with_default_config().unwrap();
//! let result = solver.check_sat_raw("
//!     (declare-const x Int)
//!     (assert (> x 0))
//!     (assert (< x 10))
//!     (check-sat)
//!     (get-model)
//! ").unwrap();
//!
//! match result {
//!     SolverResult::Sat(model) => println!("SAT: {model:?}"),
//!     SolverResult::Unsat => println!("UNSAT (proved)"),
//!     SolverResult::Unknown(reason) => println!("Unknown: {reason}"),
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod model;
mod parser;
pub mod result;
pub mod sexp;
pub mod solver;

pub use backend::{SolverBackend, create_backend, create_default_backend};
pub use config::{SolverConfig, SolverKind};
pub use error::SolverError;
pub use model::{ArrayValue, Model, ModelValue};
pub use parser::parse_solver_output;
pub use result::SolverResult;
pub use solver::CliSolver;
