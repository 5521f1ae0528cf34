//! CLI argument definitions using clap
//!
//! Commands:
//! - flatdoc --config <path> fetch
//! - flatdoc --config <path> first
//! - flatdoc --config <path> exists
//! - flatdoc --config <path> update
//! - flatdoc --config <path> delete

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flatdoc - query and modify a store of JSON documents
#[derive(Parser, Debug)]
#[command(name = "flatdoc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the store configuration file
    #[arg(long, global = true, default_value = "./flatdoc.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Every command reads one JSON request from stdin
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print every matching document
    Fetch,

    /// Print the first matching document, or [] when nothing matches
    First,

    /// Print whether any document matches
    Exists,

    /// Apply "updates" to every matching document
    Update,

    /// Delete every matching document
    Delete,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Fetch => "fetch",
            Command::First => "first",
            Command::Exists => "exists",
            Command::Update => "update",
            Command::Delete => "delete",
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
