// Copyright (c) For The Record Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::error::{RecordError, RecordResult};
use crate::types::SearchSettings;
use for_the_record_config::Config;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

impl Config for SearchSettings {}

/// Persists [`SearchSettings`] between sessions.
pub trait SettingsStore: Send + Sync {
    /// Never fails: a missing or unreadable store yields the defaults.
    fn load(&self) -> SearchSettings;

    fn save(&self, settings: &SearchSettings) -> RecordResult<()>;

    /// Persists and returns the defaults.
    fn reset(&self) -> RecordResult<SearchSettings> {
        let defaults = SearchSettings::default();
        self.save(&defaults)?;
        Ok(defaults)
    }
}

/// JSON file holding `{blockCount, eventCacheEnabled}`.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> SearchSettings {
        if !self.path.exists() {
            return SearchSettings::default();
        }
        SearchSettings::load(&self.path).unwrap_or_else(|e| {
            tracing::warn!(
                "Ignoring unreadable settings at {}: {:#}",
                self.path.display(),
                e
            );
            SearchSettings::default()
        })
    }

    fn save(&self, settings: &SearchSettings) -> RecordResult<()> {
        Config::save(settings, &self.path).map_err(|e| RecordError::SettingsError(format!("{:#}", e)))
    }
}

#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<SearchSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> SearchSettings {
        self.settings.lock().unwrap().unwrap_or_default()
    }

    fn save(&self, settings: &SearchSettings) -> RecordResult<()> {
        *self.settings.lock().unwrap() = Some(*settings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));
        assert_eq!(store.load(), SearchSettings::default());

        let settings = SearchSettings::new(500, true);
        store.save(&settings).unwrap();
        assert_eq!(store.load(), settings);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!({ "blockCount": 500, "eventCacheEnabled": true })
        );
    }

    #[test]
    fn test_reset_restores_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("nested").join("settings.json"));
        store.save(&SearchSettings::new(20, true)).unwrap();

        let defaults = store.reset().unwrap();
        assert_eq!(defaults, SearchSettings::new(1000, false));
        assert_eq!(store.load(), defaults);
    }

    #[test]
    fn test_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(FileSettingsStore::new(path).load(), SearchSettings::default());
    }

    #[test]
    fn test_unwritable_path_is_settings_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be overwritten with a file
        let store = FileSettingsStore::new(dir.path());
        let err = store.save(&SearchSettings::default()).unwrap_err();
        assert_eq!(err.error_type(), "settings_error");
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySettingsStore::new();
        assert_eq!(store.load(), SearchSettings::default());
        store.save(&SearchSettings::new(10, true)).unwrap();
        assert_eq!(store.load(), SearchSettings::new(10, true));
        assert_eq!(store.reset().unwrap(), SearchSettings::default());
        assert_eq!(store.load(), SearchSettings::default());
    }
}
