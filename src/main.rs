//! flatdoc CLI entry point
//!
//! 1. Installs the log subscriber (stderr, filter from `FLATDOC_LOG`)
//! 2. Dispatches to the CLI module
//! 3. Exits non-zero on failure
//!
//! stdout carries only the JSON response.

use flatdoc::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_env("FLATDOC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}
