//! # minilang-fv-smtlib
//!
//! SMT-LIB2 abstract syntax for the integer/array fragment used by the
//! verification pipeline, plus its text formatter (`Display` impls).

pub mod command;
pub mod formatter;
pub mod script;
pub mod sort;
pub mod term;

pub use command::Command;
pub use script::Script;
pub use sort::Sort;
pub use term::Term;
