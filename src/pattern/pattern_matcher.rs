use std::path::PathBuf;

use snafu::{ResultExt, Snafu};
use tracing::debug;

/// Expands a pattern into the files it currently matches.
pub trait PatternMatcher {
    /// Returns the matching files in the order the matcher produces them.
    /// Directories are never part of the result.
    async fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, PatternError>;
}

/// Shell style glob expansion (`*`, `?`, `[...]`, `**`).
///
/// Matches are returned in the sorted order produced by the `glob` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobMatcher;

impl PatternMatcher for GlobMatcher {
    async fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, PatternError> {
        debug!("Expanding pattern '{}'", pattern);
        let matches = glob::glob(pattern).context(InvalidPatternSnafu { pattern })?;

        let mut files = Vec::new();
        for entry in matches {
            let path = entry.context(UnreadableMatchSnafu { pattern })?;
            if path.is_file() {
                files.push(path);
            } else {
                debug!("Skipping non-file match {}", path.display());
            }
        }

        debug!("Pattern '{}' matched {} files", pattern, files.len());
        Ok(files)
    }
}

#[derive(Debug, Snafu)]
pub enum PatternError {
    #[snafu(display("Invalid pattern '{}'", pattern))]
    InvalidPatternError {
        pattern: String,
        source: glob::PatternError,
    },
    #[snafu(display("Failed to read a match of pattern '{}'", pattern))]
    UnreadableMatchError {
        pattern: String,
        source: glob::GlobError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use tempfile::TempDir;

    fn fixture_dir() -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for name in ["b.txt", "a.txt", "notes.md"] {
            std::fs::write(temp_dir.path().join(name), name).unwrap();
        }
        std::fs::create_dir(temp_dir.path().join("dir.txt")).unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        std::fs::write(temp_dir.path().join("nested/c.txt"), "c").unwrap();
        temp_dir
    }

    #[compio::test]
    async fn test_expand_returns_sorted_files_only() {
        let temp_dir = fixture_dir();
        let pattern = format!("{}/*.txt", temp_dir.path().display());

        let files = GlobMatcher.expand(&pattern).await.unwrap();

        assert_eq!(
            files,
            vec![temp_dir.path().join("a.txt"), temp_dir.path().join("b.txt")]
        );
    }

    #[compio::test]
    async fn test_expand_recursive_pattern() {
        let temp_dir = fixture_dir();
        let pattern = format!("{}/**/*.txt", temp_dir.path().display());

        let files = GlobMatcher.expand(&pattern).await.unwrap();

        assert_eq!(files.len(), 3);
        assert!(files.contains(&temp_dir.path().join("nested/c.txt")));
    }

    #[compio::test]
    async fn test_expand_without_matches_is_empty() {
        let temp_dir = fixture_dir();
        let pattern = format!("{}/*.rs", temp_dir.path().display());

        let files = GlobMatcher.expand(&pattern).await.unwrap();

        assert!(files.is_empty());
    }

    #[rstest]
    #[case("abc[def")]
    #[case("a/****/b")]
    #[compio::test]
    async fn test_expand_rejects_invalid_pattern(#[case] pattern: &str) {
        let result = GlobMatcher.expand(pattern).await;

        match result {
            Err(PatternError::InvalidPatternError { pattern: reported, .. }) => {
                assert_eq!(reported, pattern)
            }
            other => panic!("Expected InvalidPatternError, got {:?}", other),
        }
    }
}
