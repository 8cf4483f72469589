//! localStorage / sessionStorage for the persist plugin.
//!
//! In WASM this goes to the real web storage. Elsewhere it is an in-memory
//! map so the plugin wiring can be tested natively.

#[cfg(not(target_arch = "wasm32"))]
use std::collections::HashMap;
use tether_core::{KeyValueStore, StorageError, StorageType};

/// Browser storage of one type.
#[derive(Debug)]
pub struct BrowserStorage {
    storage_type: StorageType,
    /// In-memory fallback for non-WASM environments
    #[cfg(not(target_arch = "wasm32"))]
    memory: std::sync::Mutex<HashMap<String, String>>,
}

impl Default for BrowserStorage {
    fn default() -> Self {
        Self::new(StorageType::Local)
    }
}

impl BrowserStorage {
    /// Create a storage handle.
    #[must_use]
    pub fn new(storage_type: StorageType) -> Self {
        Self {
            storage_type,
            #[cfg(not(target_arch = "wasm32"))]
            memory: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// `localStorage`.
    #[must_use]
    pub fn local() -> Self {
        Self::new(StorageType::Local)
    }

    /// `sessionStorage`.
    #[must_use]
    pub fn session() -> Self {
        Self::new(StorageType::Session)
    }

    /// Which storage this is.
    #[must_use]
    pub const fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    /// Read a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            self.web_storage()?.get_item(key).ok()?
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.memory.lock().ok()?.get(key).cloned()
        }
    }

    /// Write a value.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        #[cfg(target_arch = "wasm32")]
        {
            self.web_storage()
                .ok_or(StorageError::NotAvailable)?
                .set_item(key, value)
                .map_err(|_| StorageError::QuotaExceeded)
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.memory
                .lock()
                .map_err(|_| StorageError::AccessDenied)?
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn web_storage(&self) -> Option<web_sys::Storage> {
        let window = web_sys::window()?;
        match self.storage_type {
            StorageType::Local => window.local_storage().ok()?,
            StorageType::Session => window.session_storage().ok()?,
        }
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::get(self, key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::set(self, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_new() {
        assert_eq!(BrowserStorage::default().storage_type(), StorageType::Local);
        assert_eq!(BrowserStorage::local().storage_type(), StorageType::Local);
        assert_eq!(BrowserStorage::session().storage_type(), StorageType::Session);
    }

    #[test]
    fn test_storage_set_get() {
        let storage = BrowserStorage::local();
        assert_eq!(storage.get("prefs"), None);
        storage.set("prefs", r#"{"dark":true}"#).unwrap();
        assert_eq!(storage.get("prefs").as_deref(), Some(r#"{"dark":true}"#));
        storage.set("prefs", "{}").unwrap();
        assert_eq!(storage.get("prefs").as_deref(), Some("{}"));
    }

    #[test]
    fn test_storage_as_key_value_store() {
        let storage = BrowserStorage::session();
        let store: &dyn KeyValueStore = &storage;
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        assert_eq!(store.get("missing"), None);
    }
}
