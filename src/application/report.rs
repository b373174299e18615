//! Human readable output of the CLI commands.

use std::path::Path;

use colored::Colorize;
use supports_color::Stream;

use crate::paths::NormalizedPath;
use crate::tracking::{Drift, Entries, MigrationOutcome, TrackOutcome};

/// Enables colors only when stdout can show them.
pub fn configure_colors() {
    let supported = supports_color::on(Stream::Stdout).is_some();
    colored::control::set_override(supported);
}

pub fn print(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

pub fn tracked(pattern: &str, outcome: &TrackOutcome) -> Vec<String> {
    if outcome.matched == 0 {
        return vec![format!(
            "{} pattern '{}' matched no files",
            "warning:".yellow().bold(),
            pattern
        )];
    }

    let mut lines = labelled("tracked", &outcome.added, |s| s.green());
    if !outcome.skipped.is_empty() {
        lines.push(format!(
            "{} already tracked",
            outcome.skipped.len().to_string().dimmed()
        ));
    }
    lines
}

pub fn updated(changed: &[NormalizedPath], pruned: &[NormalizedPath]) -> Vec<String> {
    let mut lines = labelled("changed", changed, |s| s.yellow());
    lines.extend(labelled("pruned", pruned, |s| s.red()));
    if lines.is_empty() {
        lines.push("Nothing changed".dimmed().to_string());
    }
    lines
}

pub fn pruned(pruned: &[NormalizedPath]) -> Vec<String> {
    if pruned.is_empty() {
        return vec!["Nothing to prune".dimmed().to_string()];
    }
    labelled("pruned", pruned, |s| s.red())
}

pub fn drift(drift: &Drift) -> Vec<String> {
    if drift.is_clean() {
        return vec!["All tracked files are up to date".green().to_string()];
    }
    let mut lines = labelled("changed", &drift.changed, |s| s.yellow());
    lines.extend(labelled("missing", &drift.missing, |s| s.red()));
    lines
}

pub fn removed(path: &Path, key: Option<&NormalizedPath>) -> String {
    match key {
        Some(key) => format!("{} {}", "removed".red().bold(), key),
        None => format!(
            "{} {} is not tracked",
            "warning:".yellow().bold(),
            path.display()
        ),
    }
}

pub fn list(entries: &Entries) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No files are tracked".dimmed().to_string()];
    }
    entries
        .iter()
        .map(|(path, hash)| format!("{}  {}", hash.as_str().dimmed(), path))
        .collect()
}

pub fn migration(library: &Path, outcome: &MigrationOutcome) -> String {
    match outcome {
        MigrationOutcome::Migrated { entries } => format!(
            "{} {} entries in {}",
            "migrated".green().bold(),
            entries,
            library.display()
        ),
        MigrationOutcome::AlreadyCurrent { entries } => format!(
            "{} is already in the current format ({} entries)",
            library.display(),
            entries
        ),
    }
}

fn labelled(
    label: &str,
    paths: &[NormalizedPath],
    paint: impl Fn(&str) -> colored::ColoredString,
) -> Vec<String> {
    paths
        .iter()
        .map(|path| format!("{} {}", paint(label).bold(), path))
        .collect()
}
