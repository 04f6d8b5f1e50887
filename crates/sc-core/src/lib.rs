//! Scorecard core — the histogram-based metrics engine.
//!
//! Wires the pure numeric core (`sc-math`) to the outside world:
//! - An abstract object-store port with local and in-memory backends
//! - A dataset adapter normalizing raw score files to observations
//! - A read-through/write-through histogram cache
//! - Model discovery by storage listing, plus notes and metadata blobs
//! - The metrics engine tying it all together
//!
//! Presentation (charts, tables, web) and remote object-store backends are
//! external collaborators; they see only `MetricsResult` values and the
//! `ObjectStore` trait.

pub mod cache;
pub mod dataset;
pub mod engine;
pub mod logging;
pub mod model;
pub mod store;

pub use cache::{HistogramCache, StoreCache};
pub use dataset::{BenchmarkScores, ObservationSource, PlainScores};
pub use engine::MetricsEngine;
pub use model::{ModelCatalog, ModelData, ModelEntry, ModelKind};
pub use store::{LocalStore, MemoryStore, ObjectStore};
