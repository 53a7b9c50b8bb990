use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{KvStore, StoreError, StoreValue};

/// Store backed by a single JSON object on disk
///
/// `flush` writes a sibling `.tmp` file and renames it over the save, so a
/// crash mid-write leaves the previous save intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, StoreValue>,
    dirty: bool,
}

impl JsonFileStore {
    /// Open `path`, starting empty if it does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let json = fs::read_to_string(&path)?;
            let values: BTreeMap<String, StoreValue> = serde_json::from_str(&json)?;
            log::info!("Loaded {} keys from {}", values.len(), path.display());
            values
        } else {
            log::info!("No save at {}, starting fresh", path.display());
            BTreeMap::new()
        };
        Ok(Self {
            path,
            values,
            dirty: false,
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<StoreValue> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: StoreValue) {
        if self.values.get(key) != Some(&value) {
            self.values.insert(key.to_string(), value);
            self.dirty = true;
        }
    }

    fn remove(&mut self, key: &str) {
        if self.values.remove(key).is_some() {
            self.dirty = true;
        }
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        log::debug!("Saved {} keys to {}", self.values.len(), self.path.display());
        Ok(())
    }
}
