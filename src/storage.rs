//! Storage
//!
//! The persistence boundary: a pluggable key-value backend and the adapter
//! that serializes the cart into one named slot. All storage failures here
//! are recoverable; the worst outcome anywhere in this module is an empty
//! cart, never a crashed caller.

use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::{Arc, RwLock},
};

use thiserror::Error;
use tracing::warn;

use crate::{cart::Cart, items::LineItem};

/// Slot key the serialized cart lives under.
pub const CART_KEY: &str = "cart";

/// Errors from the storage boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Filesystem failure from a file-backed store.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The cart could not be serialized for writing.
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// A durable string key-value store, the cart's sole I/O boundary.
///
/// Implementations model a per-browser storage slot: reads and writes are
/// expected to complete immediately or fail immediately, and concurrent
/// writers resolve by last-write-wins.
pub trait StorageBackend: Send + Sync {
    /// Read the value under `key`, or `None` if the key has never been set.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value in full.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written, for
    /// example when its quota is exhausted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`. Deleting an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend.
///
/// `Clone` shares the underlying slots, so two stores built over clones of
/// one `MemoryBackend` model two tabs sharing a single browser store. Tests
/// use this instead of any real storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        MemoryBackend::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self
            .slots
            .read()
            .map_err(|_| StorageError::Unavailable("slot lock poisoned".into()))?;

        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StorageError::Unavailable("slot lock poisoned".into()))?;

        slots.insert(key.to_string(), value.to_string());

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StorageError::Unavailable("slot lock poisoned".into()))?;

        slots.remove(key);

        Ok(())
    }
}

/// File-backed store keeping one file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`. The directory is created lazily on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileBackend { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// The persistence adapter: serializes the cart to and from one named slot.
///
/// The stored form is a JSON array of line items, field names and order
/// preserved, so `load(save(cart))` round-trips exactly for any valid cart.
#[derive(Debug)]
pub struct CartSlot<B> {
    backend: B,
    key: String,
}

impl<B: StorageBackend> CartSlot<B> {
    /// Create an adapter over `backend` using the default [`CART_KEY`] slot.
    pub fn new(backend: B) -> Self {
        CartSlot::with_key(backend, CART_KEY)
    }

    /// Create an adapter bound to a custom slot key.
    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        CartSlot {
            backend,
            key: key.into(),
        }
    }

    /// Load the cart, degrading to an empty cart on any failure.
    ///
    /// The cart is a convenience cache, not a source of truth, so an
    /// unreachable or corrupt store is logged and swallowed here rather
    /// than surfaced to the caller.
    pub fn load(&self) -> Cart {
        match self.try_load() {
            Ok(cart) => cart,
            Err(err) => {
                warn!(error = %err, "cart storage unavailable, starting empty");
                Cart::new()
            }
        }
    }

    /// Load the cart, surfacing backend failures.
    ///
    /// A missing slot yields an empty cart. A corrupt value is still
    /// swallowed (logged, then treated as empty): corruption means the
    /// stored cart is unrecoverable either way, while a backend error may
    /// be transient and worth distinguishing.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    pub fn try_load(&self) -> Result<Cart, StorageError> {
        let Some(raw) = self.backend.get(&self.key)? else {
            return Ok(Cart::new());
        };

        match serde_json::from_str::<Vec<LineItem>>(&raw) {
            Ok(items) => Ok(Cart::from_items(items)),
            Err(err) => {
                warn!(error = %err, "discarding corrupt stored cart");
                Ok(Cart::new())
            }
        }
    }

    /// Serialize and write the cart, replacing the slot in full.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if serialization or the write fails. The
    /// caller's in-memory cart is unaffected either way.
    pub fn save(&self, cart: &Cart) -> Result<(), StorageError> {
        let raw = serde_json::to_string(cart)?;

        self.backend.set(&self.key, &raw)
    }

    /// Remove the slot entirely, leaving the state a fresh load would see
    /// on a first visit.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be written.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.backend.remove(&self.key)
    }
}
