use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::data::LogLevel;

/// Track files by glob pattern and find out which ones changed since the last
/// snapshot.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(long, short, default_value = "warn", value_enum, global = true)]
    pub log_level: LogLevel,

    /// The tracking library to read and write
    #[clap(long, short = 'L', default_value = "impostr.json", global = true)]
    pub library: PathBuf,

    /// Write the library as compact JSON instead of indented
    #[clap(long, global = true)]
    pub compact: bool,

    /// Log what the cache loads, adds, prunes and rehashes (needs --log-level debug)
    #[clap(long, global = true)]
    pub diagnostics: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start tracking every file matched by the given glob patterns
    Track {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Drop missing files, rehash the rest and record what changed
    Update,
    /// Drop files that no longer exist
    Prune,
    /// Show changed and missing files without touching the library
    Status,
    /// Stop tracking the given files
    Remove {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print every tracked file with its hash
    List,
    /// Convert a library in the old array format to the current format
    Migrate,
}
