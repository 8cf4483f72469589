//! Signal persistence: which signals to save, where, and how snapshots are
//! filtered and merged back.

use crate::config::PersistConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Storage type (local or session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// localStorage - persists across browser sessions
    #[default]
    Local,
    /// sessionStorage - cleared when browser tab closes
    Session,
}

/// Storage error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Storage is not available (e.g., in incognito mode)
    #[error("storage not available")]
    NotAvailable,
    /// Storage quota exceeded
    #[error("storage quota exceeded")]
    QuotaExceeded,
    /// Access denied
    #[error("storage access denied")]
    AccessDenied,
    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// String key-value storage such as `localStorage`.
pub trait KeyValueStore {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// The framework's reactive signal tree, seen as JSON.
pub trait SignalStore {
    /// Current values of every signal.
    fn snapshot(&self) -> Value;

    /// Merge `patch` into the signals, creating missing ones.
    fn merge(&self, patch: Value);
}

/// What a `data-persist` attribute asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistSpec {
    /// Where to store
    pub storage: StorageType,
    /// Storage key
    pub key: String,
    /// Dotted signal paths to keep; empty keeps everything
    pub paths: Vec<String>,
}

impl PersistSpec {
    /// Resolve from the attribute's key suffix, value and modifiers.
    ///
    /// `data-persist:prefs__session="theme, layout.sidebar"` gives key
    /// `prefs`, session storage and two paths.
    #[must_use]
    pub fn parse(
        key: Option<&str>,
        value: &str,
        modifiers: &[String],
        config: &PersistConfig,
    ) -> Self {
        let storage = if modifiers.iter().any(|m| m.eq_ignore_ascii_case("session")) {
            StorageType::Session
        } else {
            config.storage
        };
        let key = key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(&config.key)
            .to_string();
        let paths = value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect();
        Self { storage, key, paths }
    }

    /// Keep only the configured paths of `signals`.
    #[must_use]
    pub fn filter(&self, signals: &Value) -> Value {
        filter_paths(signals, &self.paths)
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |node, segment| node.as_object()?.get(segment))
}

fn insert_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut node = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            node.insert(segment.to_string(), value);
            return;
        }
        let child = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        let Value::Object(map) = child else { return };
        node = map;
    }
}

/// Copy of `signals` reduced to `paths`; an empty list keeps everything.
///
/// Paths that do not exist are skipped.
#[must_use]
pub fn filter_paths(signals: &Value, paths: &[String]) -> Value {
    if paths.is_empty() {
        return signals.clone();
    }
    let mut out = Map::new();
    for path in paths {
        if let Some(found) = lookup(signals, path) {
            insert_path(&mut out, path, found.clone());
        }
    }
    Value::Object(out)
}

/// Deep-merge `patch` into `target`: objects merge key by key, anything else
/// replaces.
pub fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(into), Value::Object(from)) => {
            for (key, value) in from {
                match into.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        into.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Read the stored snapshot for `spec` and merge it into `signals`.
///
/// Returns whether anything was restored. Missing or corrupt entries are
/// ignored.
pub fn restore(store: &dyn KeyValueStore, spec: &PersistSpec, signals: &dyn SignalStore) -> bool {
    let Some(raw) = store.get(&spec.key) else {
        return false;
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(saved) if !saved.is_object() => {
            log::debug!("ignoring stored signals under `{}`: not an object", spec.key);
            false
        }
        Ok(saved) => {
            let saved = spec.filter(&saved);
            if saved.as_object().map_or(false, Map::is_empty) {
                return false;
            }
            signals.merge(saved);
            true
        }
        Err(err) => {
            log::debug!("ignoring stored signals under `{}`: {err}", spec.key);
            false
        }
    }
}

/// Serialize the filtered snapshot of `signals` for `spec`.
pub fn encode(spec: &PersistSpec, signals: &dyn SignalStore) -> Result<String, StorageError> {
    serde_json::to_string(&spec.filter(&signals.snapshot()))
        .map_err(|e| StorageError::SerializationError(e.to_string()))
}
