//! CLI module for flatdoc
//!
//! One-shot commands over a store described by a JSON configuration file:
//! - fetch, first, exists: read
//! - update, delete: mutate

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{execute, run, run_command};
pub use errors::{CliError, CliResult};
pub use io::{read_request, write_error, write_response, Request};
