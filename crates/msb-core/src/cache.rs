use std::collections::BTreeMap;

use sha2::{Digest, Sha512};

use crate::{
    errors::Error,
    messaging::port::MessagingPort,
    store::{load_or_default, Store},
    Result,
};

/// SHA-512 hex digest → remote resource handle.
pub type CacheEntries = BTreeMap<String, String>;

/// Content-addressed upload cache.
///
/// A digest, once written, always maps to the same handle. The table is
/// written through to its store after every new entry.
pub struct ContentCache {
    entries: CacheEntries,
    store: Box<dyn Store<CacheEntries>>,
}

impl ContentCache {
    pub fn open(store: Box<dyn Store<CacheEntries>>) -> Self {
        let entries = load_or_default(store.as_ref());
        tracing::debug!(entries = entries.len(), "file cache loaded");
        Self { entries, store }
    }

    pub fn digest(data: &[u8]) -> String {
        hex::encode(Sha512::digest(data))
    }

    pub fn get(&self, digest: &str) -> Option<&str> {
        self.entries.get(digest).map(String::as_str)
    }

    /// Insert a new entry. Returns `false` (and changes nothing) when the
    /// digest is already known.
    pub fn put(&mut self, digest: String, handle: String) -> bool {
        if self.entries.contains_key(&digest) {
            return false;
        }
        self.entries.insert(digest, handle);
        true
    }

    pub fn flush(&self) -> Result<()> {
        self.store.save(&self.entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the handle for `data`, uploading it only when its digest is unknown.
    ///
    /// A failed upload leaves the cache untouched.
    pub async fn upload(
        &mut self,
        uploader: &dyn MessagingPort,
        data: Vec<u8>,
        filename: &str,
    ) -> Result<String> {
        let digest = Self::digest(&data);
        if let Some(handle) = self.get(&digest) {
            tracing::debug!(filename, "file cache hit");
            return Ok(handle.to_string());
        }

        let handle = match uploader.upload(data, filename).await {
            Ok(h) if !h.is_empty() => h,
            Ok(_) => return Err(Error::UploadFailed("empty content uri".to_string())),
            Err(Error::UploadFailed(reason)) => return Err(Error::UploadFailed(reason)),
            Err(e) => return Err(Error::UploadFailed(e.to_string())),
        };

        self.put(digest, handle.clone());
        if let Err(e) = self.flush() {
            // The upload itself succeeded; keep serving the handle from memory.
            tracing::error!(error = %e, "failed to persist file cache");
        }
        tracing::info!(filename, handle = %handle, "uploaded file");
        Ok(handle)
    }
}
