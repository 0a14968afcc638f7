use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::jobs::domain::run_result::RunResult;
use crate::jobs::domain::run_store::{RunStore, RunStoreError};

/// Run store backed by a directory with one `<id>.json` file per run.
///
/// Writes go to a temporary sibling first and are renamed into place, so
/// a reader in another process never sees a half-written record.
pub struct JsonFileRunStore {
    dir: PathBuf,
}

impl JsonFileRunStore {
    /// Opens the store, creating `dir` if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RunStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| RunStoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> Option<PathBuf> {
        is_valid_id(id).then(|| self.dir.join(format!("{id}.json")))
    }
}

/// Ids become file names, so only a conservative character set is allowed.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

impl RunStore for JsonFileRunStore {
    fn put(&self, id: &str, result: RunResult) -> Result<(), RunStoreError> {
        let path = self
            .record_path(id)
            .ok_or_else(|| RunStoreError::InvalidId(id.to_string()))?;
        let json = serde_json::to_vec(&result).map_err(|source| RunStoreError::Json {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| RunStoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| RunStoreError::Io { path, source })
    }

    fn get(&self, id: &str) -> Result<Option<RunResult>, RunStoreError> {
        let Some(path) = self.record_path(id) else {
            return Ok(None);
        };
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(RunStoreError::Io { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| RunStoreError::Json { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::domain::run_result::RunStatus;
    use crate::presence::domain::appearance_interval::AppearanceInterval;

    #[test]
    fn test_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRunStore::open(dir.path()).unwrap();
        let result = RunResult::done(vec![AppearanceInterval::rounded(1.2, 3.4)]);

        store.put("run-1", result.clone()).unwrap();

        assert_eq!(store.get("run-1").unwrap(), Some(result));
        let text = fs::read_to_string(dir.path().join("run-1.json")).unwrap();
        assert_eq!(text, r#"{"status":"done","appearances":[[1.2,3.4]]}"#);
    }

    #[test]
    fn test_reopened_store_sees_earlier_runs() {
        let dir = tempfile::tempdir().unwrap();
        JsonFileRunStore::open(dir.path())
            .unwrap()
            .put("abc", RunResult::failed("no face"))
            .unwrap();

        let reopened = JsonFileRunStore::open(dir.path()).unwrap();
        let result = reopened.get("abc").unwrap().unwrap();
        assert_eq!(result.status(), RunStatus::Failed);
        assert_eq!(result.error(), Some("no face"));
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("runs").join("nested");
        let store = JsonFileRunStore::open(&nested).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_unknown_id_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRunStore::open(dir.path()).unwrap();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRunStore::open(dir.path()).unwrap();

        assert!(matches!(
            store.put("../escape", RunResult::queued()),
            Err(RunStoreError::InvalidId(_))
        ));
        assert!(store.get("../escape").unwrap().is_none());
    }

    #[test]
    fn test_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileRunStore::open(dir.path()).unwrap();
        store.put("a", RunResult::queued()).unwrap();
        store.put("a", RunResult::processing()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json".to_string()]);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let store = JsonFileRunStore::open(dir.path()).unwrap();
        assert!(matches!(store.get("bad"), Err(RunStoreError::Json { .. })));
    }
}
