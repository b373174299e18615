use std::path::Path;

use snafu::{ResultExt, Snafu};

use crate::ext::AsyncTryFrom;
use crate::fingerprint::{ContentHash, FingerprintError};
use crate::paths::{NormalizeError, NormalizedPath};

/// A file together with the fingerprint of its contents at the time the
/// entry was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    path: NormalizedPath,
    hash: ContentHash,
}

impl TrackedEntry {
    pub fn new(path: NormalizedPath, hash: ContentHash) -> Self {
        Self { path, hash }
    }

    /// Normalizes `raw` and hashes the file it points to.
    pub async fn from_path(raw: impl AsRef<Path>) -> Result<Self, TrackedEntryError> {
        Self::async_try_from(raw.as_ref()).await
    }

    /// The key `raw` is stored under, without reading the file.
    pub fn key_for(raw: impl AsRef<Path>) -> Result<NormalizedPath, NormalizeError> {
        NormalizedPath::resolve(raw)
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn into_parts(self) -> (NormalizedPath, ContentHash) {
        (self.path, self.hash)
    }
}

impl AsyncTryFrom<&Path> for TrackedEntry {
    type Error = TrackedEntryError;

    async fn async_try_from(raw: &Path) -> Result<Self, Self::Error> {
        let path = Self::key_for(raw).context(NormalizeSnafu)?;
        let hash = ContentHash::async_try_from(path.as_path())
            .await
            .context(FingerprintSnafu)?;
        Ok(Self { path, hash })
    }
}

#[derive(Debug, Snafu)]
pub enum TrackedEntryError {
    #[snafu(display("Failed to normalize the path of a tracked file"))]
    NormalizeError { source: NormalizeError },
    #[snafu(display("Failed to fingerprint a tracked file"))]
    FingerprintError { source: FingerprintError },
}
