use std::{
    hash::Hasher,
    path::{Path, PathBuf},
};

use compio::fs;
use derive_more::Display;
use metrohash::MetroHash64;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::ext::{AsyncTryFrom, BestEffortPathExt};

/// Short fingerprint of a file's contents.
///
/// Rendered as the 16 lowercase hex digits of a 64-bit MetroHash. Meant for
/// change detection, not for integrity against tampering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = MetroHash64::default();
        hasher.write(bytes);
        Self(format!("{:016x}", hasher.finish()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty hash has never been computed. Only legacy libraries carry
    /// these.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsyncTryFrom<&Path> for ContentHash {
    type Error = FingerprintError;

    async fn async_try_from(path: &Path) -> Result<Self, Self::Error> {
        let metadata = path.metadata().context(PathSnafu {
            path: path.to_path_buf(),
        })?;

        if metadata.is_dir() {
            return Err(FingerprintError::DirectoryError {
                path: path.to_path_buf(),
            });
        }

        let bytes = fs::read(path).await.context(PathSnafu {
            path: path.to_path_buf(),
        })?;

        Ok(Self::of_bytes(&bytes))
    }
}

#[derive(Debug, Snafu)]
pub enum FingerprintError {
    #[snafu(display("Failed to read file {}", path.best_effort_path_display()))]
    PathError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("The supplied path {} is a directory", path.best_effort_path_display()))]
    DirectoryError { path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[compio::test]
    async fn test_content_hash_from_regular_file() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "test content").expect("Failed to write to temp file");

        let hash = ContentHash::async_try_from(temp_file.path())
            .await
            .expect("Failed to hash file");

        assert_eq!(hash.as_str().len(), 16);
        assert!(hash.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, ContentHash::of_bytes(b"test content\n"));
    }

    #[compio::test]
    async fn test_content_hash_from_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let result = ContentHash::async_try_from(temp_dir.path()).await;

        match result {
            Err(FingerprintError::DirectoryError { path }) => assert_eq!(path, temp_dir.path()),
            other => panic!("Expected DirectoryError, got {:?}", other),
        }
    }

    #[compio::test]
    async fn test_content_hash_from_nonexistent_file() {
        let nonexistent_path = Path::new("/this/path/does/not/exist.txt");

        let result = ContentHash::async_try_from(nonexistent_path).await;

        match result {
            Err(FingerprintError::PathError { path, .. }) => assert_eq!(path, nonexistent_path),
            other => panic!("Expected PathError, got {:?}", other),
        }
    }

    #[compio::test]
    async fn test_content_hash_changes_with_content() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "initial content").expect("Failed to write to temp file");
        temp_file.flush().unwrap();

        let first = ContentHash::async_try_from(temp_file.path()).await.unwrap();

        writeln!(temp_file, "additional content").expect("Failed to write to temp file");
        temp_file.flush().unwrap();

        let second = ContentHash::async_try_from(temp_file.path()).await.unwrap();

        assert_ne!(first, second);
    }

    #[compio::test]
    async fn test_identical_content_gives_identical_hash() {
        let mut temp_file1 = NamedTempFile::new().expect("Failed to create temp file 1");
        let mut temp_file2 = NamedTempFile::new().expect("Failed to create temp file 2");
        writeln!(temp_file1, "identical content").unwrap();
        writeln!(temp_file2, "identical content").unwrap();

        let hash1 = ContentHash::async_try_from(temp_file1.path()).await.unwrap();
        let hash2 = ContentHash::async_try_from(temp_file2.path()).await.unwrap();

        assert_eq!(hash1, hash2);
    }

    #[rstest]
    #[case("hello world")]
    #[case("")]
    #[case("special chars: äöü🚀")]
    #[case("multiline\ncontent\nwith\nnewlines")]
    #[compio::test]
    async fn test_content_hash_with_various_content(#[case] content: &str) {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        write!(temp_file, "{}", content).expect("Failed to write to temp file");
        temp_file.flush().unwrap();

        let hash = ContentHash::async_try_from(temp_file.path()).await.unwrap();

        assert_eq!(hash, ContentHash::of_bytes(content.as_bytes()));
        assert!(!hash.is_empty());
    }

    #[compio::test]
    async fn test_content_hash_large_file() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let large_content = "x".repeat(1024 * 1024);
        write!(temp_file, "{}", large_content).expect("Failed to write large content");
        temp_file.flush().unwrap();

        let hash = ContentHash::async_try_from(temp_file.path()).await;

        assert!(hash.is_ok(), "Failed to hash large file");
    }

    #[test]
    fn test_default_hash_is_empty() {
        assert!(ContentHash::default().is_empty());
        assert_eq!(ContentHash::default().to_string(), "");
    }

    #[test]
    fn test_fingerprint_error_display() {
        let path_error = FingerprintError::PathError {
            path: PathBuf::from("/this/path/does/not/exist.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        let directory_error = FingerprintError::DirectoryError {
            path: PathBuf::from("/tmp"),
        };

        let path_error_msg = path_error.to_string();
        let directory_error_msg = directory_error.to_string();

        assert!(path_error_msg.contains("Failed to read file"));
        assert!(path_error_msg.contains("/this/path/does/not/exist.txt"));
        assert!(directory_error_msg.contains("is a directory"));
        assert!(directory_error_msg.contains("tmp"));
    }
}
