//! On-disk form of the tracking library.
//!
//! The library is a JSON object mapping normalized paths to content hashes.
//! Older libraries stored an array of `{ "path", "hash" }` objects; those are
//! only read by [`migrate_legacy`], never by the regular loader.

use std::future::IntoFuture;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use compio::fs;
use compio::runtime::spawn;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures_channel::oneshot;
use hashlink::LinkedHashMap;
use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use tracing::{debug, info, warn};

use crate::ext::BestEffortPathExt;
use crate::fingerprint::ContentHash;
use crate::paths::NormalizedPath;

/// Tracked paths and their hashes, in insertion order.
pub type Entries = LinkedHashMap<NormalizedPath, ContentHash>;

/// How the library was obtained when a cache was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { entries: usize },
    Fresh { reason: FreshReason },
}

/// Why a cache started with an empty mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreshReason {
    Missing,
    Unreadable { message: String },
    Malformed { message: String },
    /// The file holds the legacy array form; run a migration to keep it.
    LegacyFormat { entries: usize },
}

#[derive(Debug)]
enum LibraryDocument {
    Mapping(Entries),
    Legacy(Vec<LegacyEntry>),
}

impl LibraryDocument {
    /// Picks the shape from the top-level JSON value, so a parse error
    /// describes what is wrong with that shape.
    fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(bytes)?;
        if value.is_array() {
            serde_json::from_value(value).map(Self::Legacy)
        } else {
            serde_json::from_value(value).map(Self::Mapping)
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegacyEntry {
    path: NormalizedPath,
    #[serde(default)]
    hash: ContentHash,
}

/// Reads the library at `path`. Never fails; anything unusable yields an
/// empty mapping and the reason why.
pub(crate) async fn load(path: &Path) -> (Entries, LoadOutcome) {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return fresh(FreshReason::Missing);
        }
        Err(err) => {
            return fresh(FreshReason::Unreadable {
                message: err.to_string(),
            });
        }
    };

    match LibraryDocument::parse(&bytes) {
        Ok(LibraryDocument::Mapping(entries)) => {
            let outcome = LoadOutcome::Loaded {
                entries: entries.len(),
            };
            (entries, outcome)
        }
        Ok(LibraryDocument::Legacy(legacy)) => fresh(FreshReason::LegacyFormat {
            entries: legacy.len(),
        }),
        Err(err) => fresh(FreshReason::Malformed {
            message: err.to_string(),
        }),
    }
}

fn fresh(reason: FreshReason) -> (Entries, LoadOutcome) {
    (Entries::new(), LoadOutcome::Fresh { reason })
}

pub(crate) fn serialize(entries: &Entries, pretty: bool) -> Result<Vec<u8>, PersistError> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(entries)
    } else {
        serde_json::to_vec(entries)
    };
    bytes.context(SerializeSnafu)
}

/// A serialized snapshot of the library waiting to be written.
///
/// The snapshot is taken when the `PendingWrite` is created, so the cache
/// it came from can keep changing. Await it to perform the write, or
/// [`detach`](PendingWrite::detach) it to let the runtime write it in the
/// background.
#[derive(Debug)]
#[must_use = "the library is only written once the pending write is awaited or detached"]
pub struct PendingWrite {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl PendingWrite {
    pub(crate) fn new(path: PathBuf, bytes: Vec<u8>) -> Self {
        Self { path, bytes }
    }

    /// The file this write targets.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the snapshot, replacing any existing file, and returns the
    /// path written to.
    pub async fn write(self) -> Result<PathBuf, PersistError> {
        let PendingWrite { path, bytes } = self;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.context(CreateDirSnafu {
                path: parent.to_path_buf(),
            })?;
        }

        let size = bytes.len();
        fs::write(&path, bytes)
            .await
            .0
            .context(WriteSnafu { path: path.clone() })?;
        debug!("Wrote {} bytes to {}", size, path.display());

        Ok(path)
    }

    /// Spawns the write on the current runtime.
    ///
    /// The returned receiver resolves with the outcome once the write is
    /// done. Dropping it does not cancel the write; failures are still
    /// logged.
    pub fn detach(self) -> oneshot::Receiver<Result<PathBuf, PersistError>> {
        let (sender, receiver) = oneshot::channel();

        spawn(async move {
            let result = self.write().await;
            if let Err(err) = &result {
                warn!("Background library write failed: {}", err);
            }
            if sender.send(result).is_err() {
                debug!("Nobody is waiting for the library write result");
            }
        })
        .detach();

        receiver
    }
}

impl IntoFuture for PendingWrite {
    type Output = Result<PathBuf, PersistError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        self.write().boxed_local()
    }
}

/// Result of [`migrate_legacy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The legacy array was rewritten as a mapping.
    Migrated { entries: usize },
    /// The library already was a mapping and was left untouched.
    AlreadyCurrent { entries: usize },
}

/// Rewrites a legacy array library at `path` in the mapping form.
///
/// When a path occurs more than once the first occurrence wins, matching the
/// at-most-once rule for adding entries.
pub async fn migrate_legacy(path: &Path, pretty: bool) -> Result<MigrationOutcome, MigrateError> {
    let bytes = fs::read(path).await.context(ReadSnafu {
        path: path.to_path_buf(),
    })?;
    let document = LibraryDocument::parse(&bytes).context(ParseSnafu {
        path: path.to_path_buf(),
    })?;

    let legacy = match document {
        LibraryDocument::Mapping(entries) => {
            debug!("{} is already a mapping", path.best_effort_path_display());
            return Ok(MigrationOutcome::AlreadyCurrent {
                entries: entries.len(),
            });
        }
        LibraryDocument::Legacy(legacy) => legacy,
    };

    let mut entries = Entries::new();
    for LegacyEntry { path: key, hash } in legacy {
        if entries.contains_key(&key) {
            warn!("Dropping duplicate legacy entry for {}", key);
            continue;
        }
        entries.insert(key, hash);
    }

    let migrated = entries.len();
    let bytes = serialize(&entries, pretty).context(WriteMigratedSnafu)?;
    PendingWrite::new(path.to_path_buf(), bytes)
        .write()
        .await
        .context(WriteMigratedSnafu)?;
    info!(
        "Migrated {} legacy entries in {}",
        migrated,
        path.best_effort_path_display()
    );

    Ok(MigrationOutcome::Migrated { entries: migrated })
}

#[derive(Debug, Snafu)]
pub enum PersistError {
    #[snafu(display(
        "{} holds {} entries in the legacy format; run `impostr migrate` before changing it",
        path.best_effort_path_display(),
        entries
    ))]
    LegacyLibraryError { path: PathBuf, entries: usize },
    #[snafu(display("Failed to serialize the library"))]
    SerializeError { source: serde_json::Error },
    #[snafu(display("Failed to create directory {}", path.best_effort_path_display()))]
    CreateDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write the library to {}", path.best_effort_path_display()))]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Snafu)]
pub enum MigrateError {
    #[snafu(display("Failed to read the library {}", path.best_effort_path_display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("The library {} is neither a mapping nor a legacy array", path.best_effort_path_display()))]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[snafu(display("Failed to write the migrated library"))]
    WriteMigratedError { source: PersistError },
}
