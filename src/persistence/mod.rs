//! Display preference persistence
//!
//! A narrow key-value side channel for consumer settings such as the selected
//! chart range. Nothing in the acquisition core reads or writes it, and every
//! failure here degrades to a default with a warning.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::analytics::TimeRange;

/// Key holding the last selected chart range
pub const CHART_TIME_RANGE_KEY: &str = "chartTimeRange";

/// String key-value storage for display preferences
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Preferences kept in a single JSON object file
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.read_map()?;
        Ok(map.get(key).and_then(Value::as_str).map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("preference write lock poisoned"))?;

        // A corrupt file is replaced rather than blocking every future write
        let mut map = self.read_map().unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable preferences file");
            Map::new()
        });
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map)?;
        debug!(key, value, path = %self.path.display(), "Preference saved");
        Ok(())
    }
}

/// Process-local preferences, lost on exit
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| anyhow::anyhow!("preference lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow::anyhow!("preference lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Stored chart range, or `24H` when absent, unparsable or unreadable
pub fn load_time_range(store: &dyn PreferenceStore) -> TimeRange {
    match store.get(CHART_TIME_RANGE_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring stored chart time range");
            TimeRange::default()
        }),
        Ok(None) => TimeRange::default(),
        Err(e) => {
            warn!(error = %e, "Failed to read chart time range preference");
            TimeRange::default()
        }
    }
}

/// Persist the chart range. Failures are logged and reported as `false`.
pub fn save_time_range(store: &dyn PreferenceStore, range: TimeRange) -> bool {
    match store.set(CHART_TIME_RANGE_KEY, range.as_str()) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, range = %range, "Failed to save chart time range preference");
            false
        }
    }
}
