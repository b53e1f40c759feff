//! CLI module
//!
//! Command-line interface for running queries from definition files.
//!
//! # Commands
//!
//! - `fetch` - Run a query and stream its chunks as JSON lines
//! - `validate` - Check a definition file

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
