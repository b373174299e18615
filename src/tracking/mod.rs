//! The tracking cache: which files are tracked, their last known content
//! hashes, and how that mapping is reconciled with the disk and persisted.

mod cache_options;
pub mod library;
mod tracked_entry;
mod tracking_cache;

pub use cache_options::CacheOptions;
pub use library::{
    Entries, FreshReason, LoadOutcome, MigrateError, MigrationOutcome, PendingWrite, PersistError,
    migrate_legacy,
};
pub use tracked_entry::{TrackedEntry, TrackedEntryError};
pub use tracking_cache::{Drift, TrackOutcome, TrackingCache, TrackingCacheError, default_library_path};
