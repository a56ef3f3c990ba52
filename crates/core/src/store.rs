//! Key/value persistence for the cart.
//!
//! The cart is mirrored to a single named slot after every mutation. The
//! slot lives wherever the client keeps durable state: the visitor's session
//! in the storefront, a file on disk for the CLI, or a `HashMap` in tests.
//! [`KeyValueStore`] abstracts over those backends and [`CartStore`] adds the
//! JSON encoding of the cart sequence on top.
//!
//! Writes overwrite the previous value in full. No atomicity is promised
//! beyond what the backend itself provides.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cart::CartEntry;

/// Slot name under which the cart sequence is stored.
pub const CART_KEY: &str = "cart";

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Value could not be encoded.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Key contains characters the backend cannot store.
    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    /// Backend is not reachable (e.g. session store failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous string key/value storage.
pub trait KeyValueStore {
    /// Read a slot. `Ok(None)` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite a slot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Delete a slot. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.slots.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.slots.remove(key);
        Ok(())
    }
}

/// Directory backend: each key is a `<key>.json` file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the storage directory. It is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Cart slot adapter: loads and saves the cart sequence as JSON.
#[derive(Debug, Clone)]
pub struct CartStore<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Adapter over `backend` using the standard [`CART_KEY`] slot.
    #[must_use]
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, CART_KEY)
    }

    /// Adapter over `backend` using a custom slot name.
    #[must_use]
    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn backend(&self) -> &S {
        &self.backend
    }

    /// Give back the backend.
    pub fn into_inner(self) -> S {
        self.backend
    }

    /// Read the stored cart.
    ///
    /// Never fails: a missing slot, an unreadable backend or malformed
    /// contents all yield an empty cart.
    #[must_use]
    pub fn load(&self) -> Vec<CartEntry> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to read cart slot");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<CartEntry>>(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding malformed cart data");
                Vec::new()
            }
        }
    }

    /// Overwrite the stored cart with `entries`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if encoding or the backend write fails.
    pub fn save(&mut self, entries: &[CartEntry]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(entries)?;
        self.backend.set(&self.key, raw)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::ProductId;

    fn sample() -> Vec<CartEntry> {
        vec![
            CartEntry::new(ProductId::new(1), "Turmeric", Decimal::from(100), 2)
                .unwrap()
                .with_image("/static/img/turmeric.jpg"),
            CartEntry::new(ProductId::new(2), "Cardamom", Decimal::new(34_950, 2), 1)
                .unwrap()
                .with_weight("50g"),
        ]
    }

    #[test]
    fn test_load_missing_slot_is_empty() {
        let store = CartStore::new(MemoryStore::new());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let mut store = CartStore::new(MemoryStore::new());
        store.save(&sample()).unwrap();
        assert_eq!(store.load(), sample());
    }

    #[test]
    fn test_malformed_data_is_treated_as_empty() {
        let mut backend = MemoryStore::new();
        backend.set(CART_KEY, "{not json".to_string()).unwrap();
        assert!(CartStore::new(backend).load().is_empty());
    }

    #[test]
    fn test_invalid_entry_is_treated_as_malformed() {
        let mut backend = MemoryStore::new();
        backend
            .set(
                CART_KEY,
                r#"[{"id":1,"name":"Cumin","price":-5,"quantity":1}]"#.to_string(),
            )
            .unwrap();
        assert!(CartStore::new(backend).load().is_empty());
    }

    #[test]
    fn test_save_overwrites_previous_value() {
        let mut store = CartStore::new(MemoryStore::new());
        store.save(&sample()).unwrap();
        store.save(&[]).unwrap();
        assert!(store.load().is_empty());
        assert_eq!(store.backend().get(CART_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CartStore::new(FileStore::new(dir.path().join("nested")));
        store.save(&sample()).unwrap();

        let reopened = CartStore::new(FileStore::new(dir.path().join("nested")));
        assert_eq!(reopened.load(), sample());
        assert!(dir.path().join("nested").join("cart.json").exists());
    }

    #[test]
    fn test_file_store_missing_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert_eq!(store.get("cart").unwrap(), None);
        store.set("cart", "[]".to_string()).unwrap();
        store.remove("cart").unwrap();
        store.remove("cart").unwrap();
        assert_eq!(store.get("cart").unwrap(), None);
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(matches!(
            store.get("../etc/passwd"),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_custom_key() {
        let mut backend = MemoryStore::new();
        let mut store = CartStore::with_key(&mut backend, "wishlist");
        store.save(&sample()).unwrap();
        assert_eq!(store.key(), "wishlist");
        assert!(backend.get("wishlist").unwrap().is_some());
        assert!(backend.get(CART_KEY).unwrap().is_none());
    }

    fn arb_entry() -> impl Strategy<Value = CartEntry> {
        (
            any::<i32>(),
            "[A-Za-z ]{1,24}",
            0..10_000_000i64,
            1..1_000u32,
            prop::option::of("[0-9]{1,4}(g|kg)"),
            "(/static/img/[a-z]{1,12}\\.jpg)?",
        )
            .prop_map(|(id, name, paise, quantity, weight, image)| {
                let entry = CartEntry::new(ProductId::new(id), name, Decimal::new(paise, 2), quantity)
                    .unwrap()
                    .with_image(image);
                match weight {
                    Some(weight) => entry.with_weight(weight),
                    None => entry,
                }
            })
    }

    proptest! {
        #[test]
        fn prop_save_then_load_round_trips(entries in prop::collection::vec(arb_entry(), 0..20)) {
            let mut store = CartStore::new(MemoryStore::new());
            store.save(&entries).unwrap();
            prop_assert_eq!(store.load(), entries);
        }
    }
}
