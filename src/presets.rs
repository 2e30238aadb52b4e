//! Preset persistence.
//!
//! Presets are a fixed subset of a generator's fields saved as a JSON object
//! under a fixed key. Storage sits behind [`KeyValueStore`] so the preset
//! logic runs the same against files or memory.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::fields::FieldSet;
use crate::generator::GeneratorKind;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("{0} has no presets")]
    Unsupported(GeneratorKind),
    #[error("failed to encode presets: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// String key/value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, value).map_err(|source| StoreError::Write { path, source })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Write { path, source }),
        }
    }
}

/// In-memory store, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Saved preset values, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresetRecord {
    values: Vec<(String, String)>,
}

impl PresetRecord {
    #[cfg(test)]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == id)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Write the preset fields of `fields` to the store, replacing any earlier
/// record for that generator.
pub fn save(store: &mut dyn KeyValueStore, fields: &FieldSet) -> Result<(), PresetError> {
    let kind = fields.kind();
    let contract = kind
        .preset_contract()
        .ok_or(PresetError::Unsupported(kind))?;

    let mut object = Map::new();
    for id in contract.fields {
        object.insert((*id).to_string(), Value::String(fields.get(id).to_string()));
    }
    let json = serde_json::to_string(&Value::Object(object))?;

    store.set(contract.key, &json)?;
    info!(kind = %kind, key = contract.key, "presets_saved");
    Ok(())
}

/// Read the preset record for `kind`.
///
/// Missing, unreadable or malformed records all come back empty; the caller
/// never sees an error.
pub fn load(store: &dyn KeyValueStore, kind: GeneratorKind) -> PresetRecord {
    let Some(contract) = kind.preset_contract() else {
        return PresetRecord::default();
    };

    let raw = match store.get(contract.key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key = contract.key, "presets_absent");
            return PresetRecord::default();
        }
        Err(e) => {
            warn!(key = contract.key, error = %e, "presets_read_failed");
            return PresetRecord::default();
        }
    };

    let object = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            warn!(key = contract.key, "presets_not_an_object");
            return PresetRecord::default();
        }
        Err(e) => {
            warn!(key = contract.key, error = %e, "presets_parse_failed");
            return PresetRecord::default();
        }
    };

    let values = contract
        .fields
        .iter()
        .map(|id| {
            let value = object.get(*id).and_then(Value::as_str).unwrap_or("");
            ((*id).to_string(), value.to_string())
        })
        .collect();
    debug!(key = contract.key, "presets_loaded");
    PresetRecord { values }
}

/// Delete the stored record for `kind`.
pub fn clear(store: &mut dyn KeyValueStore, kind: GeneratorKind) -> Result<(), PresetError> {
    let contract = kind
        .preset_contract()
        .ok_or(PresetError::Unsupported(kind))?;
    store.remove(contract.key)?;
    info!(kind = %kind, key = contract.key, "presets_cleared");
    Ok(())
}
