use std::path::PathBuf;

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::{RuntimeConfig, report};
use crate::cli::Command;
use crate::tracking::{
    MigrateError, PersistError, TrackingCache, TrackingCacheError, migrate_legacy,
};

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        debug!("Runtime config: {:?}", app_config);

        match &app_config.command {
            Command::Track { patterns } => {
                let mut cache = Self::open_for_change(&app_config).await?;
                for pattern in patterns {
                    let outcome = cache
                        .track_by_pattern(pattern)
                        .await
                        .context(TrackSnafu)?;
                    report::print(&report::tracked(pattern, &outcome));
                }
                Self::persist(&cache).await?;
            }
            Command::Update => {
                let mut cache = Self::open_for_change(&app_config).await?;
                let pruned = cache.prune_library();
                let changed = cache.update_library().await.context(UpdateSnafu)?;
                report::print(&report::updated(&changed, &pruned));
                Self::persist(&cache).await?;
            }
            Command::Prune => {
                let mut cache = Self::open_for_change(&app_config).await?;
                let pruned = cache.prune_library();
                report::print(&report::pruned(&pruned));
                Self::persist(&cache).await?;
            }
            Command::Status => {
                let cache = Self::open(&app_config).await?;
                let drift = cache.drift().await.context(StatusSnafu)?;
                report::print(&report::drift(&drift));
            }
            Command::Remove { paths } => {
                let mut cache = Self::open_for_change(&app_config).await?;
                for path in paths {
                    let removed = cache.remove_entry(path);
                    println!("{}", report::removed(path, removed.as_ref()));
                }
                Self::persist(&cache).await?;
            }
            Command::List => {
                let cache = Self::open(&app_config).await?;
                report::print(&report::list(cache.entries()));
            }
            Command::Migrate => {
                let outcome = migrate_legacy(&app_config.library, app_config.options.pretty_json)
                    .await
                    .context(MigrationSnafu)?;
                println!("{}", report::migration(&app_config.library, &outcome));
            }
        }

        Ok(())
    }

    async fn open(app_config: &RuntimeConfig) -> Result<TrackingCache, ApplicationError> {
        TrackingCache::open(&app_config.library, app_config.options)
            .await
            .context(OpenSnafu)
    }

    /// Opens the library for a command that saves it afterwards. A legacy
    /// library is refused up front instead of failing after the work is done.
    async fn open_for_change(app_config: &RuntimeConfig) -> Result<TrackingCache, ApplicationError> {
        let cache = Self::open(app_config).await?;
        if let Some(entries) = cache.legacy_entries() {
            return LegacyLibrarySnafu {
                path: cache.library_path().to_path_buf(),
                entries,
            }
            .fail();
        }
        Ok(cache)
    }

    async fn persist(cache: &TrackingCache) -> Result<(), ApplicationError> {
        let written = cache
            .persist()
            .context(PersistLibrarySnafu)?
            .await
            .context(PersistLibrarySnafu)?;
        info!("Saved {} entries to {}", cache.len(), written.display());
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while opening the library"))]
    OpenError { source: TrackingCacheError },
    #[snafu(display(
        "{} holds {} entries in the legacy format; run `impostr migrate` first",
        path.display(),
        entries
    ))]
    LegacyLibraryError { path: PathBuf, entries: usize },
    #[snafu(display("Critical failure encountered while tracking files"))]
    TrackError { source: TrackingCacheError },
    #[snafu(display("Critical failure encountered while updating the library"))]
    UpdateError { source: TrackingCacheError },
    #[snafu(display("Critical failure encountered while checking tracked files"))]
    StatusError { source: TrackingCacheError },
    #[snafu(display("Critical failure encountered while saving the library"))]
    PersistLibraryError { source: PersistError },
    #[snafu(display("Critical failure encountered while migrating the library"))]
    MigrationError { source: MigrateError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{CacheOptions, LoadOutcome};
    use rstest::*;
    use tempfile::TempDir;

    fn config(library: PathBuf, command: Command) -> RuntimeConfig {
        RuntimeConfig {
            library,
            options: CacheOptions::default(),
            command,
        }
    }

    #[compio::test]
    async fn test_track_then_update_persists_library() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let library = temp_dir.path().join("impostr.json");
        let file = temp_dir.path().join("a.txt");
        std::fs::write(&file, "alpha").unwrap();
        let pattern = format!("{}/*.txt", temp_dir.path().display());

        Application::run(config(library.clone(), Command::Track { patterns: vec![pattern] }))
            .await
            .unwrap();
        std::fs::write(&file, "alpha, edited").unwrap();
        Application::run(config(library.clone(), Command::Update))
            .await
            .unwrap();

        let cache = TrackingCache::open(&library, CacheOptions::default())
            .await
            .unwrap();
        assert_eq!(cache.load_outcome(), &LoadOutcome::Loaded { entries: 1 });
        assert_eq!(
            cache.hash_of(&file),
            Some(&crate::fingerprint::ContentHash::of_bytes(b"alpha, edited"))
        );
    }

    #[compio::test]
    async fn test_status_does_not_write_library() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let library = temp_dir.path().join("impostr.json");

        Application::run(config(library.clone(), Command::Status))
            .await
            .unwrap();

        assert!(!library.exists());
    }

    #[compio::test]
    async fn test_remove_persists_without_entry() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let library = temp_dir.path().join("impostr.json");
        let file = temp_dir.path().join("a.txt");
        std::fs::write(&file, "alpha").unwrap();
        let pattern = format!("{}/*.txt", temp_dir.path().display());
        Application::run(config(library.clone(), Command::Track { patterns: vec![pattern] }))
            .await
            .unwrap();

        Application::run(config(library.clone(), Command::Remove { paths: vec![file.clone()] }))
            .await
            .unwrap();

        let cache = TrackingCache::open(&library, CacheOptions::default())
            .await
            .unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.load_outcome(), &LoadOutcome::Loaded { entries: 0 });
    }

    #[compio::test]
    async fn test_invalid_pattern_is_a_track_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let library = temp_dir.path().join("impostr.json");

        let result = Application::run(config(
            library.clone(),
            Command::Track {
                patterns: vec!["abc[def".to_string()],
            },
        ))
        .await;

        assert!(matches!(result, Err(ApplicationError::TrackError { .. })));
        assert!(!library.exists());
    }

    #[rstest]
    #[case::track(Command::Track { patterns: vec!["*.txt".to_string()] })]
    #[case::update(Command::Update)]
    #[case::prune(Command::Prune)]
    #[case::remove(Command::Remove { paths: vec![PathBuf::from("/old/a.txt")] })]
    #[compio::test]
    async fn test_changing_commands_keep_legacy_library(#[case] command: Command) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let library = temp_dir.path().join("impostr.json");
        let legacy = r#"[{"path": "/old/a.txt", "hash": "deadbeefdeadbeef"}]"#;
        std::fs::write(&library, legacy).unwrap();

        let result = Application::run(config(library.clone(), command)).await;

        match result {
            Err(ApplicationError::LegacyLibraryError { path, entries }) => {
                assert_eq!(path, library);
                assert_eq!(entries, 1);
            }
            other => panic!("Expected LegacyLibraryError, got {:?}", other),
        }
        assert_eq!(std::fs::read_to_string(&library).unwrap(), legacy);
    }

    #[compio::test]
    async fn test_legacy_library_can_be_tracked_after_migration() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let library = temp_dir.path().join("impostr.json");
        std::fs::write(&library, r#"[{"path": "/old/a.txt", "hash": "deadbeefdeadbeef"}]"#).unwrap();
        std::fs::write(temp_dir.path().join("n.txt"), "new").unwrap();
        let pattern = format!("{}/*.txt", temp_dir.path().display());

        Application::run(config(library.clone(), Command::Migrate))
            .await
            .unwrap();
        Application::run(config(library.clone(), Command::Track { patterns: vec![pattern] }))
            .await
            .unwrap();

        let cache = TrackingCache::open(&library, CacheOptions::default())
            .await
            .unwrap();
        assert_eq!(cache.load_outcome(), &LoadOutcome::Loaded { entries: 2 });
        assert!(cache.is_tracking("/old/a.txt"));
        assert!(cache.is_tracking(temp_dir.path().join("n.txt")));
    }

    #[compio::test]
    async fn test_migrate_missing_library_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let result = Application::run(config(
            temp_dir.path().join("impostr.json"),
            Command::Migrate,
        ))
        .await;

        assert!(matches!(result, Err(ApplicationError::MigrationError { .. })));
    }
}
