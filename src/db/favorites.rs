use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    error::{AppError, AppResult},
    models::FavoritesMap,
};

/// Version stamp written into every favorites file
const FILE_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct FavoritesDocumentRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    favorites: &'a FavoritesMap,
}

#[derive(Deserialize)]
struct FavoritesDocument {
    version: u32,
    favorites: FavoritesMap,
}

/// Result of reading the favorites file at session start
///
/// Loading never fails outright: a corrupt or unreadable file yields an
/// empty map and the error that caused it, so the session can still start.
#[derive(Debug)]
pub struct LoadOutcome {
    pub favorites: FavoritesMap,
    pub error: Option<AppError>,
}

/// Single-file persistence for the favorites map
///
/// Every save rewrites the whole file. There is no locking: two processes
/// sharing one file overwrite each other and the last write wins.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    path: PathBuf,
}

impl FavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted map, falling back to an empty one on any failure
    pub fn load(&self) -> LoadOutcome {
        match self.try_load() {
            Ok(favorites) => LoadOutcome {
                favorites,
                error: None,
            },
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Starting with empty favorites"
                );
                LoadOutcome {
                    favorites: FavoritesMap::new(),
                    error: Some(e),
                }
            }
        }
    }

    /// Loads the persisted map; a missing or blank file is an empty map
    pub fn try_load(&self) -> AppResult<FavoritesMap> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No favorites file yet");
                return Ok(FavoritesMap::new());
            }
            Err(e) => {
                return Err(AppError::Load(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        if raw.trim().is_empty() {
            return Ok(FavoritesMap::new());
        }

        let document: FavoritesDocument = serde_json::from_str(&raw).map_err(|e| {
            AppError::Load(format!("cannot parse {}: {}", self.path.display(), e))
        })?;

        if document.version != FILE_FORMAT_VERSION {
            return Err(AppError::Load(format!(
                "unsupported favorites file version {} (expected {})",
                document.version, FILE_FORMAT_VERSION
            )));
        }

        tracing::info!(
            path = %self.path.display(),
            sources = document.favorites.len(),
            "Loaded favorites"
        );

        Ok(document.favorites)
    }

    /// Overwrites the file with the entire map
    pub fn persist(&self, favorites: &FavoritesMap) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Persist(format!("cannot create {}: {}", parent.display(), e))
            })?;
        }

        let document = FavoritesDocumentRef {
            version: FILE_FORMAT_VERSION,
            saved_at: Utc::now(),
            favorites,
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| AppError::Persist(format!("cannot serialize favorites: {}", e)))?;

        std::fs::write(&self.path, json).map_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "Favorites write failed");
            AppError::Persist(format!("cannot write {}: {}", self.path.display(), e))
        })?;

        tracing::info!(
            path = %self.path.display(),
            sources = favorites.len(),
            "Favorites saved"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn store_in(dir: &tempfile::TempDir) -> FavoritesStore {
        FavoritesStore::new(dir.path().join("favorites.json"))
    }

    #[test]
    fn test_missing_file_loads_empty_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = store_in(&dir).load();

        assert!(outcome.favorites.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_blank_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "").unwrap();

        let outcome = store.load();
        assert!(outcome.favorites.is_empty());
        assert!(outcome.error.is_none());
    }

    #[test]
    fn test_corrupt_file_loads_empty_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "\u{80}\u{2}not json").unwrap();

        let outcome = store.load();
        assert!(outcome.favorites.is_empty());
        assert!(matches!(outcome.error, Some(AppError::Load(_))));
    }

    #[test]
    fn test_unknown_version_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"version": 7, "favorites": {}}"#).unwrap();

        assert!(matches!(store.try_load(), Err(AppError::Load(_))));
    }

    #[test]
    fn test_round_trip_empty_map() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_ok!(store.persist(&FavoritesMap::new()));
        assert_eq!(assert_ok!(store.try_load()), FavoritesMap::new());
    }

    #[test]
    fn test_round_trip_with_empty_sets() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut map = FavoritesMap::new();
        map.add_favorites("Inception", ["Interstellar", "Tenet"]);
        map.add_favorites("Heat", Vec::<String>::new());
        map.add_favorites("Alien", ["Aliens"]);

        assert_ok!(store.persist(&map));
        assert_eq!(assert_ok!(store.try_load()), map);
    }

    #[test]
    fn test_first_run_add_persist_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut map = store.load().favorites;
        assert!(map.is_empty());

        map.add_favorites("Inception", ["Interstellar"]);
        store.persist(&map).unwrap();

        let reloaded = FavoritesStore::new(store.path()).load();
        assert!(reloaded.error.is_none());
        assert_eq!(
            reloaded.favorites.get("Inception").unwrap(),
            &["Interstellar"]
        );
        assert_eq!(reloaded.favorites.len(), 1);
    }

    #[test]
    fn test_persist_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FavoritesStore::new(dir.path().join("processed_data").join("favorites.json"));

        store.persist(&FavoritesMap::new()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_persist_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut map = FavoritesMap::new();
        map.add_favorites("Inception", ["Interstellar", "Tenet"]);
        store.persist(&map).unwrap();

        map.remove_favorite("Tenet");
        store.persist(&map).unwrap();

        assert_eq!(store.try_load().unwrap(), map);
    }

    #[test]
    fn test_persist_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // The target is an existing directory, so the write must fail
        let store = FavoritesStore::new(dir.path());

        let err = assert_err!(store.persist(&FavoritesMap::new()));
        assert!(matches!(err, AppError::Persist(_)));
    }

    #[test]
    fn test_file_is_inspectable_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut map = FavoritesMap::new();
        map.add_favorites("Inception", ["Interstellar"]);
        store.persist(&map).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["favorites"]["Inception"][0], "Interstellar");
        assert!(value["saved_at"].is_string());
    }
}
