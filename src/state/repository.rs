use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::PersistenceError;
use super::{AggregationStore, IngestionCursor};

/// Everything reloaded at startup: mailbox cursor plus card aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestState {
    #[serde(default)]
    pub cursor: IngestionCursor,
    #[serde(default)]
    pub store: AggregationStore,
}

pub trait Repository {
    /// Loads the saved state. A store that was never written yields a zeroed
    /// state; one that exists but cannot be read or parsed is an error.
    fn load(&self) -> Result<IngestState, PersistenceError>;

    fn save(&self, state: &IngestState) -> Result<(), PersistenceError>;
}

/// State kept as a single pretty-printed JSON document.
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileRepository { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Repository for JsonFileRepository {
    fn load(&self) -> Result<IngestState, PersistenceError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No cache at {}, starting from an empty state", self.path.display());
                return Ok(IngestState::default());
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let state = serde_json::from_str::<IngestState>(&content).map_err(|source| PersistenceError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        info!("Cache loaded: last UID {}, {} order(s), {} card(s)",
              state.cursor.last_position, state.cursor.order_count, state.store.total());
        Ok(state)
    }

    fn save(&self, state: &IngestState) -> Result<(), PersistenceError> {
        write_json(&self.path, "cache", state)
    }
}

/// Wraps a repository so that nothing is ever written (dry-run mode).
pub struct ReadOnlyRepository<R: Repository>(pub R);

impl<R: Repository> Repository for ReadOnlyRepository<R> {
    fn load(&self) -> Result<IngestState, PersistenceError> {
        self.0.load()
    }

    fn save(&self, _state: &IngestState) -> Result<(), PersistenceError> {
        Ok(())
    }
}

/// Serializes `value` as pretty JSON, creating the parent directory if needed.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    what: &'static str,
    value: &T,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|source| PersistenceError::Serialize { what, source })?;
    write_file(path, &json)
}

/// Replaces `path` atomically: the content goes to a temporary file in the
/// same directory, which is then renamed over the target.
pub(crate) fn write_file(path: &Path, content: &str) -> Result<(), PersistenceError> {
    let dir = match path.parent().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|source| PersistenceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            dir
        }
        None => Path::new("."),
    };

    let io_error = |source: io::Error| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(content.as_bytes()).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::ResolvedItem;

    #[test]
    fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("cache.json"));

        assert_eq!(repo.load().unwrap(), IngestState::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path().join("nested").join("cache.json"));

        let mut state = IngestState::default();
        state.cursor.advance(
            17,
            chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            true,
            chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        );
        state.store.record(&[ResolvedItem {
            name: "Mew ex".to_string(),
            set: "sv3pt5".to_string(),
            number: "151".to_string(),
            image_url: "https://images.pokemontcg.io/sv3pt5/151_hires.png".to_string(),
        }]);

        repo.save(&state).unwrap();

        assert_eq!(repo.load().unwrap(), state);
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("nested")).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_an_error_and_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();

        match JsonFileRepository::new(&path).load() {
            Err(PersistenceError::Corrupt { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected a corrupt cache error, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_unreadable_file_is_not_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::create_dir(&path).unwrap();

        assert!(matches!(
            JsonFileRepository::new(&path).load(),
            Err(PersistenceError::Read { .. })
        ));
    }

    #[test]
    fn test_save_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.html");

        write_file(&path, "<p>a much longer first version</p>").unwrap();
        write_file(&path, "<p>b</p>").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<p>b</p>");
    }

    #[test]
    fn test_legacy_cache_fields_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"cursor": {"last_position": 9, "order_count": 2, "today_count": 0, "today_date": null}}"#).unwrap();

        let state = JsonFileRepository::new(&path).load().unwrap();

        assert_eq!(state.cursor.last_position, 9);
        assert!(state.store.all_items.is_empty());
    }

    #[test]
    fn test_read_only_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let repo = ReadOnlyRepository(JsonFileRepository::new(&path));

        repo.save(&IngestState::default()).unwrap();

        assert!(!path.exists());
    }
}
