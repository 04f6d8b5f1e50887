//! Scorecard math core.
//!
//! Pure numeric primitives for binary-classifier evaluation:
//! - Quantized score histograms (the compact, cacheable summary)
//! - Ranked threshold metrics derived from a histogram
//! - Resampling strategies for confidence-band visualization
//!
//! This crate performs no I/O. Callers own persistence and data loading.

pub mod histogram;
pub mod metrics;
pub mod resample;

pub use histogram::{Histogram, HistogramError, Observation, BIN_COUNT};
pub use metrics::{BrierDecomposition, MetricsError, MetricsResult};
pub use resample::{poisson_perturb, resample_rows, ResampleStrategy};
