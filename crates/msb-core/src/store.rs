//! Persistence seam for the bot's mutable tables.
//!
//! Every table (file cache, emoji index, text replacements) is owned by a
//! struct that talks to disk only through [`Store`], so tests can swap in a
//! [`MemoryStore`].

use std::{
    fs,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use serde::{de::DeserializeOwned, Serialize};

use crate::{errors::Error, Result};

pub trait Store<T>: Send + Sync {
    /// Read the persisted table. `Ok(None)` means nothing has been persisted yet.
    fn load(&self) -> Result<Option<T>>;

    /// Replace the persisted table with `value`.
    fn save(&self, value: &T) -> Result<()>;
}

/// Load a table, falling back to `T::default()` when it is missing or corrupt.
///
/// Corrupt state is never fatal: it is logged and the table starts empty.
pub fn load_or_default<T: Default>(store: &dyn Store<T>) -> T {
    match store.load() {
        Ok(Some(v)) => v,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(error = %e, "persisted state unreadable, starting empty");
            T::default()
        }
    }
}

/// Whole-file JSON store. Every `save` rewrites the file synchronously.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> Store<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<T>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let txt = fs::read_to_string(&self.path)?;
        if txt.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&txt)
            .map(Some)
            .map_err(|e| Error::Malformed {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    fn save(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let txt = serde_json::to_string(value)?;
        fs::write(&self.path, txt)?;
        Ok(())
    }
}

/// In-memory store that counts writes. Used by tests and dry runs.
pub struct MemoryStore<T> {
    value: Mutex<Option<T>>,
    writes: AtomicUsize,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            value: Mutex::new(None),
            writes: AtomicUsize::new(0),
        }
    }
}

impl<T> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: T) -> Self {
        Self {
            value: Mutex::new(Some(value)),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl<T: Clone> MemoryStore<T> {
    pub fn snapshot(&self) -> Option<T> {
        self.value.lock().ok().and_then(|v| v.clone())
    }
}

impl<T> Store<T> for MemoryStore<T>
where
    T: Clone + Send,
{
    fn load(&self) -> Result<Option<T>> {
        let guard = self
            .value
            .lock()
            .map_err(|_| Error::External("memory store poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, value: &T) -> Result<()> {
        let mut guard = self
            .value
            .lock()
            .map_err(|_| Error::External("memory store poisoned".to_string()))?;
        *guard = Some(value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// `Arc<S>` forwards to `S`, so a test can keep a handle on the store it injects.
impl<T, S> Store<T> for std::sync::Arc<S>
where
    S: Store<T> + ?Sized,
{
    fn load(&self) -> Result<Option<T>> {
        (**self).load()
    }

    fn save(&self, value: &T) -> Result<()> {
        (**self).save(value)
    }
}
