use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::{app_config_path, config_env_dirs, ConfigError, APP_DIR};

/// Key the theme preference lives under unless configured otherwise.
pub const THEME_STORAGE_KEY: &str = "theme";
const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("failed to read preferences: {path}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write preferences: {path}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to parse preferences")]
    Parse(#[from] serde_json::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl From<ConfigError> for StorageError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::MissingHomeDirectory => StorageError::MissingHomeDirectory,
        }
    }
}

/// Durable string key-value slots.
pub trait PreferenceStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> StorageResult<()>;
}

/// Preferences kept as a JSON object on disk. Only string values are read
/// back; entries of any other type are carried through writes untouched.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn with_default_path() -> StorageResult<Self> {
        let (xdg_config_home, home) = config_env_dirs();
        let path = app_config_path(
            APP_DIR,
            PREFERENCES_FILE,
            xdg_config_home.as_deref(),
            home.as_deref(),
        )?;
        Ok(Self::with_path(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_entries(&self) -> StorageResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let serialized = fs::read_to_string(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&serialized)?)
    }
}

impl PreferenceStore for JsonFileStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.load_entries()?;
        Ok(entries.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        // Other keys survive a rewrite; a corrupt file is replaced.
        let mut entries = self.load_entries().unwrap_or_else(|err| {
            tracing::warn!(?err, path = %self.path.display(), "discarding unreadable preferences");
            Map::new()
        });
        entries.insert(key.to_string(), Value::String(value.to_string()));

        let serialized = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, serialized).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(key, value, path = %self.path.display(), "preference written");
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl PreferenceStore for MemoryStore {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: PreferenceStore + ?Sized> PreferenceStore for Box<T> {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> StorageResult<()> {
        (**self).write(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_root() -> PathBuf {
        let mut path = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let pid = std::process::id();
        path.push(format!("folio-storage-{pid}-{nanos}"));
        path
    }

    fn with_temp_root<F: FnOnce(&Path)>(f: F) {
        let root = fixture_root();
        fs::create_dir_all(&root).unwrap();
        f(&root);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn file_store_reads_none_when_missing() {
        with_temp_root(|root| {
            let store = JsonFileStore::with_path(root.join("preferences.json"));
            assert_eq!(store.read(THEME_STORAGE_KEY).unwrap(), None);
        });
    }

    #[test]
    fn file_store_write_then_read() {
        with_temp_root(|root| {
            let mut store = JsonFileStore::with_path(root.join("nested/preferences.json"));
            store.write(THEME_STORAGE_KEY, "dark").unwrap();
            assert_eq!(
                store.read(THEME_STORAGE_KEY).unwrap().as_deref(),
                Some("dark")
            );

            store.write(THEME_STORAGE_KEY, "light").unwrap();
            assert_eq!(
                store.read(THEME_STORAGE_KEY).unwrap().as_deref(),
                Some("light")
            );
        });
    }

    #[test]
    fn file_store_write_keeps_other_keys() {
        with_temp_root(|root| {
            let path = root.join("preferences.json");
            fs::write(&path, r#"{ "language": "en", "theme": "auto" }"#).unwrap();

            let mut store = JsonFileStore::with_path(&path);
            store.write(THEME_STORAGE_KEY, "dark").unwrap();

            assert_eq!(store.read("language").unwrap().as_deref(), Some("en"));
            assert_eq!(
                store.read(THEME_STORAGE_KEY).unwrap().as_deref(),
                Some("dark")
            );
        });
    }

    #[test]
    fn file_store_reads_string_next_to_non_string_siblings() {
        with_temp_root(|root| {
            let path = root.join("preferences.json");
            fs::write(&path, r#"{ "theme": "dark", "visits": 3 }"#).unwrap();

            let store = JsonFileStore::with_path(&path);
            assert_eq!(
                store.read(THEME_STORAGE_KEY).unwrap().as_deref(),
                Some("dark")
            );
            assert_eq!(store.read("visits").unwrap(), None);
        });
    }

    #[test]
    fn file_store_write_keeps_non_string_siblings() {
        with_temp_root(|root| {
            let path = root.join("preferences.json");
            fs::write(
                &path,
                r#"{ "theme": "dark", "visits": 3, "seen": { "intro": true } }"#,
            )
            .unwrap();

            let mut store = JsonFileStore::with_path(&path);
            store.write(THEME_STORAGE_KEY, "auto").unwrap();

            let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(saved["theme"], Value::from("auto"));
            assert_eq!(saved["visits"], Value::from(3));
            assert_eq!(saved["seen"]["intro"], Value::from(true));
        });
    }

    #[test]
    fn file_store_treats_non_string_value_as_missing() {
        with_temp_root(|root| {
            let path = root.join("preferences.json");
            fs::write(&path, r#"{ "theme": 1 }"#).unwrap();
            let store = JsonFileStore::with_path(&path);
            assert_eq!(store.read(THEME_STORAGE_KEY).unwrap(), None);
        });
    }

    #[test]
    fn file_store_rejects_invalid_payload_on_read() {
        with_temp_root(|root| {
            let path = root.join("preferences.json");
            fs::write(&path, "{ invalid ").unwrap();
            let store = JsonFileStore::with_path(&path);
            assert!(matches!(
                store.read(THEME_STORAGE_KEY),
                Err(StorageError::Parse(_))
            ));
        });
    }

    #[test]
    fn file_store_write_replaces_corrupt_file() {
        with_temp_root(|root| {
            let path = root.join("preferences.json");
            fs::write(&path, "{ invalid ").unwrap();
            let mut store = JsonFileStore::with_path(&path);
            store.write(THEME_STORAGE_KEY, "light").unwrap();
            assert_eq!(
                store.read(THEME_STORAGE_KEY).unwrap().as_deref(),
                Some("light")
            );
        });
    }

    #[test]
    fn memory_store_round_trips_values() {
        let mut store = MemoryStore::with_entry(THEME_STORAGE_KEY, "dark");
        assert_eq!(store.get(THEME_STORAGE_KEY), Some("dark"));
        store.write(THEME_STORAGE_KEY, "auto").unwrap();
        assert_eq!(
            store.read(THEME_STORAGE_KEY).unwrap().as_deref(),
            Some("auto")
        );
        assert_eq!(store.read("missing").unwrap(), None);
    }
}
