//! minilang-fv driver library: argument handling, report rendering and
//! subcommand execution, exported for the binary and integration tests.

pub mod cli;
pub mod commands;
pub mod error;
pub mod json_output;
pub mod output;
