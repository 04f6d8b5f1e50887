//! Model catalog and per-model blobs.
//!
//! A model is a storage directory. Discovery is by listing: a `scores.tsv`
//! defines a plain model; a directory carrying both `actuals.tsv` and
//! `scores_benchmark.tsv` defines a benchmarked model. The engine never
//! destroys models itself; deletion is a storage operation exposed here for
//! the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sc_common::Result;

use crate::store::ObjectStore;

/// Scores file defining a plain model.
pub const SCORES_FILE: &str = "scores.tsv";
/// Ground-truth table of a benchmarked model.
pub const ACTUALS_FILE: &str = "actuals.tsv";
/// Scores table of a benchmarked model.
pub const BENCHMARK_SCORES_FILE: &str = "scores_benchmark.tsv";
/// Serialized histogram cache entry.
pub const HISTOGRAM_FILE: &str = "histogram.json";
/// Free-text notes blob.
pub const NOTES_FILE: &str = "notes.txt";
/// Free-text metadata blob.
pub const METADATA_FILE: &str = "metadata.txt";

/// How a model's observations are sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// A single scores file holding predictions and outcomes together.
    Plain,
    /// Separate actuals and scores tables joined by observation id.
    Benchmarked,
}

/// A discovered model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    /// Model directory, relative to the store root.
    pub path: String,
    pub kind: ModelKind,
    /// Last-modified time of the defining data file(s).
    pub modified: Option<DateTime<Utc>>,
}

/// Model discovery over an object store.
pub struct ModelCatalog<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> ModelCatalog<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// All models, sorted by path.
    ///
    /// A directory holding both a scores file and a benchmark pair counts
    /// as plain; the scores file is the primary definition.
    pub fn list(&self) -> Result<Vec<ModelEntry>> {
        use std::collections::BTreeMap;

        #[derive(Default)]
        struct DirFlags {
            scores: Option<DateTime<Utc>>,
            actuals: Option<DateTime<Utc>>,
            benchmark: Option<DateTime<Utc>>,
        }

        let mut dirs: BTreeMap<String, DirFlags> = BTreeMap::new();
        for (path, modified) in self.store.list_with_modified("")? {
            let (dir, filename) = match path.rsplit_once('/') {
                Some((dir, filename)) => (dir.to_string(), filename),
                None => (String::new(), path.as_str()),
            };
            let flags = dirs.entry(dir).or_default();
            match filename {
                SCORES_FILE => flags.scores = Some(modified),
                ACTUALS_FILE => flags.actuals = Some(modified),
                BENCHMARK_SCORES_FILE => flags.benchmark = Some(modified),
                _ => {}
            }
        }

        let mut models = Vec::new();
        for (dir, flags) in dirs {
            if let Some(modified) = flags.scores {
                models.push(ModelEntry {
                    path: dir,
                    kind: ModelKind::Plain,
                    modified: Some(modified),
                });
            } else if let (Some(a), Some(b)) = (flags.actuals, flags.benchmark) {
                models.push(ModelEntry {
                    path: dir,
                    kind: ModelKind::Benchmarked,
                    modified: Some(a.max(b)),
                });
            }
        }
        Ok(models)
    }

    /// Models whose path contains `needle`.
    pub fn search(&self, needle: &str) -> Result<Vec<ModelEntry>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|entry| entry.path.contains(needle))
            .collect())
    }

    /// The model at exactly `path`, if discovered.
    pub fn find(&self, path: &str) -> Result<Option<ModelEntry>> {
        let path = path.trim_end_matches('/');
        Ok(self.list()?.into_iter().find(|entry| entry.path == path))
    }
}

/// Per-model blob access: notes, metadata, deletion.
pub struct ModelData<'a> {
    store: &'a dyn ObjectStore,
    path: String,
}

impl<'a> ModelData<'a> {
    pub fn new(store: &'a dyn ObjectStore, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn blob_path(&self, file: &str) -> String {
        if self.path.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.path.trim_end_matches('/'), file)
        }
    }

    /// Free-text notes; `None` if never written.
    pub fn notes(&self) -> Result<Option<String>> {
        self.read_text(NOTES_FILE)
    }

    pub fn set_notes(&self, text: &str) -> Result<()> {
        self.store.write(&self.blob_path(NOTES_FILE), text.as_bytes())
    }

    /// Free-text metadata; `None` if never written.
    pub fn metadata(&self) -> Result<Option<String>> {
        self.read_text(METADATA_FILE)
    }

    pub fn set_metadata(&self, text: &str) -> Result<()> {
        self.store
            .write(&self.blob_path(METADATA_FILE), text.as_bytes())
    }

    /// Remove the model directory and everything under it.
    pub fn delete(&self) -> Result<()> {
        self.store.remove(&self.path)
    }

    fn read_text(&self, file: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .read(&self.blob_path(file))?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .write("models/beta/scores.tsv", b"actual\tpred_score\n")
            .unwrap();
        store
            .write("models/alpha/scores.tsv", b"actual\tpred_score\n")
            .unwrap();
        store.write("models/alpha/notes.txt", b"first run").unwrap();
        store
            .write("models/joined/actuals.tsv", b"id\tactual\n")
            .unwrap();
        store
            .write("models/joined/scores_benchmark.tsv", b"id\tpred_score\n")
            .unwrap();
        // A stray blob does not define a model.
        store.write("models/empty/readme.md", b"nothing").unwrap();
        store
    }

    #[test]
    fn discovers_models_sorted_by_path() {
        let store = seeded_store();
        let catalog = ModelCatalog::new(&store);
        let models = catalog.list().unwrap();
        let paths: Vec<&str> = models.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["models/alpha", "models/beta", "models/joined"]);
        assert_eq!(models[0].kind, ModelKind::Plain);
        assert_eq!(models[2].kind, ModelKind::Benchmarked);
        assert!(models.iter().all(|m| m.modified.is_some()));
    }

    #[test]
    fn benchmark_pair_requires_both_files() {
        let store = MemoryStore::new();
        store
            .write("models/half/actuals.tsv", b"id\tactual\n")
            .unwrap();
        let catalog = ModelCatalog::new(&store);
        assert!(catalog.list().unwrap().is_empty());
    }

    #[test]
    fn search_filters_by_substring() {
        let store = seeded_store();
        let catalog = ModelCatalog::new(&store);
        let hits = catalog.search("alph").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "models/alpha");
    }

    #[test]
    fn find_matches_exact_path() {
        let store = seeded_store();
        let catalog = ModelCatalog::new(&store);
        assert!(catalog.find("models/beta").unwrap().is_some());
        assert!(catalog.find("models/beta/").unwrap().is_some());
        assert!(catalog.find("models/bet").unwrap().is_none());
    }

    #[test]
    fn notes_absent_then_roundtrip() {
        let store = MemoryStore::new();
        let model = ModelData::new(&store, "models/a");
        assert_eq!(model.notes().unwrap(), None);
        model.set_notes("solid baseline").unwrap();
        assert_eq!(model.notes().unwrap().as_deref(), Some("solid baseline"));
        // Writes overwrite.
        model.set_notes("revised").unwrap();
        assert_eq!(model.notes().unwrap().as_deref(), Some("revised"));
    }

    #[test]
    fn metadata_is_independent_of_notes() {
        let store = MemoryStore::new();
        let model = ModelData::new(&store, "models/a");
        model.set_metadata("trained 2026-08-01").unwrap();
        assert_eq!(model.notes().unwrap(), None);
        assert_eq!(
            model.metadata().unwrap().as_deref(),
            Some("trained 2026-08-01")
        );
    }

    #[test]
    fn delete_removes_the_model_subtree() {
        let store = seeded_store();
        ModelData::new(&store, "models/alpha").delete().unwrap();
        let catalog = ModelCatalog::new(&store);
        let paths: Vec<String> = catalog.list().unwrap().into_iter().map(|m| m.path).collect();
        assert_eq!(paths, vec!["models/beta", "models/joined"]);
        assert_eq!(store.read("models/alpha/notes.txt").unwrap(), None);
    }
}
