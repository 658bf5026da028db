use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::storage::{CacheError, CacheStorage};

const EXTENSION: &str = "json";

/// One file per key inside a directory.
///
/// Each write goes to its own uniquely named temporary file in the same
/// directory and is then renamed over the entry, so a crash never leaves a
/// half-written entry and concurrent writers never share a temporary file.
#[derive(Debug, Clone)]
pub struct FileCacheStorage {
    dir: PathBuf,
}

impl FileCacheStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under the platform cache directory (`<cache_dir>/settings-sync`).
    ///
    /// # Errors
    /// Returns `CacheError::Unavailable` when the platform has no cache directory.
    pub fn in_default_location() -> Result<Self, CacheError> {
        dirs::cache_dir()
            .map(|dir| Self::new(dir.join("settings-sync")))
            .ok_or_else(|| CacheError::Unavailable("no platform cache directory".to_owned()))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, CacheError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(CacheError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.{EXTENSION}")))
    }
}

impl CacheStorage for FileCacheStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| CacheError::Io(e.error))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CacheError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_owned());
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCacheStorage::new(dir.path().join("nested"));

        assert_eq!(storage.get_item("settings_a").unwrap(), None);
        storage.set_item("settings_a", "{\"x\":1}").unwrap();
        assert_eq!(
            storage.get_item("settings_a").unwrap().as_deref(),
            Some("{\"x\":1}")
        );
        assert_eq!(storage.keys().unwrap(), vec!["settings_a".to_owned()]);

        storage.remove_item("settings_a").unwrap();
        storage.remove_item("settings_a").unwrap();
        assert_eq!(storage.get_item("settings_a").unwrap(), None);
    }

    #[test]
    fn keys_ignore_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        let storage = FileCacheStorage::new(dir.path());
        storage.set_item("settings_b", "{}").unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["settings_b".to_owned()]);
    }

    #[test]
    fn path_traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCacheStorage::new(dir.path());

        assert!(matches!(
            storage.set_item("../escape", "{}"),
            Err(CacheError::InvalidKey(_))
        ));
    }

    #[test]
    fn concurrent_writers_to_same_key_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let large = "a".repeat(200_000);
        let small = "abc".to_owned();

        for _ in 0..50 {
            let writers: Vec<_> = [large.clone(), small.clone()]
                .into_iter()
                .map(|value| {
                    let storage = FileCacheStorage::new(dir.path());
                    std::thread::spawn(move || storage.set_item("settings_x", &value))
                })
                .collect();
            for writer in writers {
                writer.join().unwrap().unwrap();
            }

            let stored = FileCacheStorage::new(dir.path())
                .get_item("settings_x")
                .unwrap()
                .unwrap();
            assert!(stored == large || stored == small);
        }

        let storage = FileCacheStorage::new(dir.path());
        assert_eq!(storage.keys().unwrap(), vec!["settings_x".to_owned()]);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_directory_has_no_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCacheStorage::new(dir.path().join("never-created"));
        assert!(storage.keys().unwrap().is_empty());
    }
}
