use std::path::PathBuf;

use crate::cli::{Cli, Command};
use crate::tracking::CacheOptions;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub library: PathBuf,
    pub options: CacheOptions,
    pub command: Command,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        let options = CacheOptions {
            pretty_json: !cli.compact,
            diagnostics: cli.diagnostics,
        };

        Self {
            library: cli.library,
            options,
            command: cli.command,
        }
    }
}
