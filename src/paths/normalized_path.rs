use std::{
    borrow::Borrow,
    env,
    path::{Component, Path, PathBuf},
};

use derive_more::Display;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

/// Canonical string form of a file location, used as the library key.
///
/// Two spellings of the same file (relative, with `..`, through a symlink)
/// resolve to the same `NormalizedPath`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// Resolves `raw` to its real path. Fails if the path does not exist.
    pub fn resolve(raw: impl AsRef<Path>) -> Result<Self, NormalizeError> {
        let raw = raw.as_ref();
        let real = raw.canonicalize().context(ResolveSnafu {
            path: raw.to_path_buf(),
        })?;
        Self::from_path_buf(real)
    }

    /// Key under which `raw` would be stored, without requiring the file to
    /// exist.
    ///
    /// Existing files resolve exactly like [`NormalizedPath::resolve`]. For a
    /// file that is gone the absolute, lexically cleaned form is used, which
    /// matches the key it was stored under as long as no symlink was
    /// involved.
    pub fn lookup(raw: impl AsRef<Path>) -> Option<Self> {
        let raw = raw.as_ref();
        match Self::resolve(raw) {
            Ok(key) => Some(key),
            Err(_) => lexical_absolute(raw)
                .ok()
                .and_then(|absolute| Self::from_path_buf(absolute).ok()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    fn from_path_buf(path: PathBuf) -> Result<Self, NormalizeError> {
        match path.into_os_string().into_string() {
            Ok(key) => Ok(Self(key)),
            Err(raw) => Err(NormalizeError::NonUtf8Error {
                path: PathBuf::from(raw),
            }),
        }
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl Borrow<str> for NormalizedPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<NormalizedPath> for String {
    fn from(path: NormalizedPath) -> Self {
        path.0
    }
}

/// Makes `path` absolute against the current directory and folds `.` and
/// `..` components without touching the filesystem.
pub fn lexical_absolute(path: &Path) -> Result<PathBuf, NormalizeError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().context(CurrentDirSnafu)?.join(path)
    };
    Ok(fold_components(&absolute))
}

fn fold_components(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // ".." never climbs above the root
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

#[derive(Debug, Snafu)]
pub enum NormalizeError {
    #[snafu(display("Failed to resolve path {}", path.display()))]
    ResolveError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Path {} is not valid UTF-8", path.display()))]
    NonUtf8Error { path: PathBuf },
    #[snafu(display("Failed to obtain current dir"))]
    CurrentDirError { source: std::io::Error },
}
