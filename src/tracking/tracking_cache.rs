use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, info, warn};

use crate::ext::{AsyncTryFrom, BestEffortPathExt};
use crate::fingerprint::{ContentHash, FingerprintError};
use crate::paths::{NormalizeError, NormalizedPath, lexical_absolute};
use crate::pattern::{GlobMatcher, PatternError, PatternMatcher};
use crate::tracking::library::{self, Entries, FreshReason, LoadOutcome, PendingWrite, PersistError};
use crate::tracking::{CacheOptions, TrackedEntry, TrackedEntryError};

const DEFAULT_LIBRARY_FILE_NAME: &str = "impostr.json";

/// Library location used when none is given: `impostr.json` in the current
/// directory.
pub fn default_library_path() -> PathBuf {
    PathBuf::from(DEFAULT_LIBRARY_FILE_NAME)
}

macro_rules! diagnostic {
    ($cache:expr, $($arg:tt)+) => {
        if $cache.options.diagnostics {
            debug!($($arg)+);
        }
    };
}

/// Files tracked by a pattern, what was new and what was already known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackOutcome {
    pub matched: usize,
    pub added: Vec<NormalizedPath>,
    pub skipped: Vec<NormalizedPath>,
}

/// Difference between the library and the files on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drift {
    pub changed: Vec<NormalizedPath>,
    pub missing: Vec<NormalizedPath>,
}

impl Drift {
    pub fn is_clean(&self) -> bool {
        self.changed.is_empty() && self.missing.is_empty()
    }
}

/// Path to hash mapping of tracked files, bound to one library file.
///
/// The library path is fixed when the cache is opened. All mutations happen
/// in memory; nothing reaches the disk until [`persist`](Self::persist) is
/// called and its pending write is awaited or detached.
#[derive(Debug)]
pub struct TrackingCache {
    library_path: PathBuf,
    entries: Entries,
    options: CacheOptions,
    load_outcome: LoadOutcome,
}

impl TrackingCache {
    /// Opens the library at `library_path`.
    ///
    /// A missing or unusable library is not an error: the cache starts empty
    /// and [`load_outcome`](Self::load_outcome) says why.
    pub async fn open(
        library_path: impl AsRef<Path>,
        options: CacheOptions,
    ) -> Result<Self, TrackingCacheError> {
        let library_path = library_path.as_ref();
        ensure!(!library_path.as_os_str().is_empty(), EmptyLibraryPathSnafu);
        let library_path = lexical_absolute(library_path).context(LibraryPathSnafu)?;

        let (entries, load_outcome) = library::load(&library_path).await;
        let cache = Self {
            library_path,
            entries,
            options,
            load_outcome,
        };

        match &cache.load_outcome {
            LoadOutcome::Loaded { entries } => {
                diagnostic!(
                    cache,
                    "Loaded {} entries from {}",
                    entries,
                    cache.library_path.display()
                );
            }
            LoadOutcome::Fresh {
                reason: FreshReason::LegacyFormat { entries },
            } => {
                warn!(
                    "{} holds {} entries in the legacy format; it will not be saved until it is migrated",
                    cache.library_path.display(),
                    entries
                );
            }
            LoadOutcome::Fresh { reason } => {
                diagnostic!(
                    cache,
                    "Starting with an empty library at {} ({:?})",
                    cache.library_path.display(),
                    reason
                );
            }
        }

        Ok(cache)
    }

    /// Opens `impostr.json` in the current directory.
    pub async fn open_default(options: CacheOptions) -> Result<Self, TrackingCacheError> {
        Self::open(default_library_path(), options).await
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries in the library file when it was found in the
    /// legacy format.
    pub fn legacy_entries(&self) -> Option<usize> {
        match self.load_outcome {
            LoadOutcome::Fresh {
                reason: FreshReason::LegacyFormat { entries },
            } => Some(entries),
            _ => None,
        }
    }

    pub fn hash_of(&self, path: impl AsRef<Path>) -> Option<&ContentHash> {
        self.tracked_key(path.as_ref())
            .and_then(|key| self.entries.get(&key))
    }

    pub fn is_tracking(&self, path: impl AsRef<Path>) -> bool {
        self.tracked_key(path.as_ref()).is_some()
    }

    /// Inserts `entry` unless its path is already tracked.
    ///
    /// Returns the inserted pair, or `None` when the path was present. An
    /// existing hash is never overwritten here.
    pub fn add_entry(&mut self, entry: TrackedEntry) -> Option<(NormalizedPath, ContentHash)> {
        if self.entries.contains_key(entry.path()) {
            diagnostic!(self, "Already tracking {}", entry.path());
            return None;
        }

        let (path, hash) = entry.into_parts();
        self.entries.insert(path.clone(), hash.clone());
        diagnostic!(self, "Tracking {} ({})", path, hash);
        Some((path, hash))
    }

    /// Stops tracking `path` and returns the key that was removed.
    ///
    /// The stored key form always matches; other spellings are normalized
    /// the same way as for [`is_tracking`](Self::is_tracking).
    pub fn remove_entry(&mut self, path: impl AsRef<Path>) -> Option<NormalizedPath> {
        let key = self.tracked_key(path.as_ref())?;
        self.entries.remove(&key);
        diagnostic!(self, "Stopped tracking {}", key);
        Some(key)
    }

    /// Tracks every file matched by the glob `pattern`.
    pub async fn track_by_pattern(
        &mut self,
        pattern: &str,
    ) -> Result<TrackOutcome, TrackingCacheError> {
        self.track_by_pattern_with(&GlobMatcher, pattern, |_| {})
            .await
    }

    /// Expands `pattern` with `matcher` and tracks each resulting file in
    /// order, skipping files that are already tracked. `on_complete` runs
    /// once with the updated entries after every file has been processed.
    ///
    /// A failure stops the batch; files tracked before it stay tracked.
    pub async fn track_by_pattern_with<M, F>(
        &mut self,
        matcher: &M,
        pattern: &str,
        on_complete: F,
    ) -> Result<TrackOutcome, TrackingCacheError>
    where
        M: PatternMatcher,
        F: FnOnce(&Entries),
    {
        let files = matcher
            .expand(pattern)
            .await
            .context(PatternExpansionSnafu { pattern })?;

        let mut outcome = TrackOutcome {
            matched: files.len(),
            ..TrackOutcome::default()
        };

        for file in files {
            if let Some(key) = self.tracked_key(&file) {
                outcome.skipped.push(key);
                continue;
            }

            let entry = TrackedEntry::from_path(&file)
                .await
                .context(TrackFileSnafu { path: file.clone() })?;
            let key = entry.path().clone();
            match self.add_entry(entry) {
                Some(_) => outcome.added.push(key),
                None => outcome.skipped.push(key),
            }
        }

        info!(
            "Pattern '{}' matched {} files, {} newly tracked",
            pattern,
            outcome.matched,
            outcome.added.len()
        );
        on_complete(&self.entries);

        Ok(outcome)
    }

    /// Removes entries whose file no longer exists and returns them in
    /// library order.
    pub fn prune_library(&mut self) -> Vec<NormalizedPath> {
        let missing = self
            .entries
            .keys()
            .filter(|key| !key.as_path().is_file())
            .cloned()
            .collect::<Vec<_>>();

        for key in &missing {
            self.entries.remove(key);
            diagnostic!(self, "Pruned {}", key);
        }

        missing
    }

    /// Prunes missing files, then rehashes the rest and returns the paths
    /// whose contents changed, in library order.
    ///
    /// Pruned paths are not part of the result. If any file cannot be read
    /// the update fails and no hash is changed.
    pub async fn update_library(&mut self) -> Result<Vec<NormalizedPath>, TrackingCacheError> {
        let pruned = self.prune_library();
        if !pruned.is_empty() {
            info!("Pruned {} missing files", pruned.len());
        }

        let mut refreshed = Vec::new();
        for (key, stored) in self.entries.iter() {
            let current = Self::rehash(key).await?;
            if &current != stored {
                refreshed.push((key.clone(), current));
            }
        }

        let mut changed = Vec::with_capacity(refreshed.len());
        for (key, hash) in refreshed {
            diagnostic!(self, "{} changed to {}", key, hash);
            if let Some(stored) = self.entries.get_mut(&key) {
                *stored = hash;
            }
            changed.push(key);
        }

        info!("{} tracked files changed", changed.len());
        Ok(changed)
    }

    /// Compares the library with the disk without modifying anything.
    pub async fn drift(&self) -> Result<Drift, TrackingCacheError> {
        let mut drift = Drift::default();

        for (key, stored) in self.entries.iter() {
            if !key.as_path().is_file() {
                drift.missing.push(key.clone());
                continue;
            }
            if &Self::rehash(key).await? != stored {
                drift.changed.push(key.clone());
            }
        }

        Ok(drift)
    }

    /// Serializes the current entries and returns the write that stores
    /// them at the library path.
    ///
    /// Fails while the library file still holds unmigrated legacy entries.
    pub fn persist(&self) -> Result<PendingWrite, PersistError> {
        if let Some(entries) = self.legacy_entries() {
            return Err(PersistError::LegacyLibraryError {
                path: self.library_path.clone(),
                entries,
            });
        }

        let bytes = library::serialize(&self.entries, self.options.pretty_json)?;
        diagnostic!(
            self,
            "Persisting {} entries to {}",
            self.entries.len(),
            self.library_path.best_effort_path_display()
        );
        Ok(PendingWrite::new(self.library_path.clone(), bytes))
    }

    async fn rehash(key: &NormalizedPath) -> Result<ContentHash, TrackingCacheError> {
        ContentHash::async_try_from(key.as_path())
            .await
            .context(RehashSnafu { path: key.clone() })
    }

    fn tracked_key(&self, path: &Path) -> Option<NormalizedPath> {
        let stored = path
            .to_str()
            .and_then(|raw| self.entries.get_key_value(raw));
        if let Some((key, _)) = stored {
            return Some(key.clone());
        }
        NormalizedPath::lookup(path).filter(|key| self.entries.contains_key(key))
    }
}

#[derive(Debug, Snafu)]
pub enum TrackingCacheError {
    #[snafu(display("The library path is empty"))]
    EmptyLibraryPathError,
    #[snafu(display("Failed to resolve the library path"))]
    LibraryPathError { source: NormalizeError },
    #[snafu(display("Failed to expand pattern '{}'", pattern))]
    PatternExpansionError {
        pattern: String,
        source: PatternError,
    },
    #[snafu(display("Failed to track {}", path.best_effort_path_display()))]
    TrackFileError {
        path: PathBuf,
        source: TrackedEntryError,
    },
    #[snafu(display("Failed to rehash tracked file {}", path))]
    RehashError {
        path: NormalizedPath,
        source: FingerprintError,
    },
}
