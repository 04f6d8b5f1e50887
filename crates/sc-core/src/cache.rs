//! Histogram cache port.
//!
//! Read-through/write-through: the engine asks the cache first, computes
//! from raw data on a miss, and persists the canonical histogram. Entries
//! are never auto-invalidated — new raw data does not refresh a cache;
//! callers delete stale entries explicitly. Concurrent writers race
//! last-writer-wins, which is safe because the histogram is deterministic
//! for the same input and the write is idempotent.

use sc_common::Result;
use sc_math::Histogram;

use crate::model::HISTOGRAM_FILE;
use crate::store::ObjectStore;

/// Cache port injected into the metrics engine.
pub trait HistogramCache {
    /// The cached histogram for `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Histogram>>;

    /// Persist the canonical histogram for `key`, overwriting.
    fn put(&self, key: &str, hist: &Histogram) -> Result<()>;

    /// Drop the entry for `key`. Absent entries are a no-op.
    fn invalidate(&self, key: &str) -> Result<()>;
}

/// Store-backed cache: one `histogram.json` per model path, holding
/// `{"probs": [...], "trues": [...], "totals": [...]}`.
pub struct StoreCache<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> StoreCache<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    fn cache_path(key: &str) -> String {
        if key.is_empty() {
            HISTOGRAM_FILE.to_string()
        } else {
            format!("{}/{}", key.trim_end_matches('/'), HISTOGRAM_FILE)
        }
    }
}

impl HistogramCache for StoreCache<'_> {
    fn get(&self, key: &str) -> Result<Option<Histogram>> {
        match self.store.read(&Self::cache_path(key))? {
            // Deserialization re-validates the shape invariants, so a
            // corrupted cache file surfaces as an error instead of flowing
            // into the metrics as garbage.
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, key: &str, hist: &Histogram) -> Result<()> {
        let bytes = serde_json::to_vec(hist)?;
        self.store.write(&Self::cache_path(key), &bytes)
    }

    fn invalidate(&self, key: &str) -> Result<()> {
        self.store.remove(&Self::cache_path(key))
    }
}
