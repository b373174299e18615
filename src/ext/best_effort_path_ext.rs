use std::path::{Path, PathBuf};

use crate::paths::lexical_absolute;

/// Renders a path for log and error messages.
///
/// Resolves symlinks when the path exists, otherwise falls back to an
/// absolute, lexically cleaned form. Never fails; a path that cannot be made
/// absolute is shown as given.
pub fn best_effort_path_display(path: &Path) -> String {
    match path.canonicalize() {
        Ok(canonical_path) => canonical_path.display().to_string(),
        Err(_) => lexical_absolute(path)
            .unwrap_or_else(|_| path.to_path_buf())
            .display()
            .to_string(),
    }
}

pub trait BestEffortPathExt {
    fn best_effort_path_display(&self) -> String;
}

impl BestEffortPathExt for Path {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(self)
    }
}

impl BestEffortPathExt for PathBuf {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(self)
    }
}

impl BestEffortPathExt for &str {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(Path::new(self))
    }
}

impl BestEffortPathExt for String {
    fn best_effort_path_display(&self) -> String {
        best_effort_path_display(Path::new(self))
    }
}
