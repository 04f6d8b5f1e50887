//! Dataset adapter: raw score files to observation sets.
//!
//! Three tab-separated shapes are normalized to one observation per
//! true/false unit:
//! - Per-observation rows: `actual`, `pred_score` columns.
//! - Aggregated rows: `score`, `trues`, `falses` columns, expanded row by
//!   row. Detected by the presence of a `trues` column.
//! - Benchmarked pair: an actuals table (`id`, `actual`) joined to a scores
//!   table (`id`, `pred_score`) by id. Duplicate ids or mismatched id sets
//!   are data-integrity errors raised before any join work.
//!
//! Rows with missing, unparseable, or out-of-range fields are dropped, not
//! errors. Header problems are errors: a file that cannot declare its shape
//! is malformed.

use std::collections::BTreeMap;

use sc_common::{Error, Result};
use sc_math::Observation;
use tracing::debug;

use crate::model::{ACTUALS_FILE, BENCHMARK_SCORES_FILE, SCORES_FILE};
use crate::store::ObjectStore;

/// Strategy seam for the metrics engine: where observations come from.
pub trait ObservationSource {
    /// The model path this source feeds (also the cache key).
    fn model_path(&self) -> &str;

    /// Load and normalize the raw data into observations.
    fn load(&self, store: &dyn ObjectStore) -> Result<Vec<Observation>>;
}

/// Loads `<model>/scores.tsv` in either raw shape.
#[derive(Debug, Clone)]
pub struct PlainScores {
    model_path: String,
}

impl PlainScores {
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
        }
    }
}

impl ObservationSource for PlainScores {
    fn model_path(&self) -> &str {
        &self.model_path
    }

    fn load(&self, store: &dyn ObjectStore) -> Result<Vec<Observation>> {
        let path = blob_path(&self.model_path, SCORES_FILE);
        let bytes = store
            .read(&path)?
            .ok_or_else(|| Error::MissingScores(self.model_path.clone()))?;
        parse_scores_tsv(&bytes, &path)
    }
}

/// Joins `<model>/actuals.tsv` to `<model>/scores_benchmark.tsv` by id.
#[derive(Debug, Clone)]
pub struct BenchmarkScores {
    model_path: String,
}

impl BenchmarkScores {
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
        }
    }
}

impl ObservationSource for BenchmarkScores {
    fn model_path(&self) -> &str {
        &self.model_path
    }

    fn load(&self, store: &dyn ObjectStore) -> Result<Vec<Observation>> {
        let actuals_path = blob_path(&self.model_path, ACTUALS_FILE);
        let scores_path = blob_path(&self.model_path, BENCHMARK_SCORES_FILE);
        let actuals = store
            .read(&actuals_path)?
            .ok_or_else(|| Error::MissingScores(self.model_path.clone()))?;
        let scores = store
            .read(&scores_path)?
            .ok_or_else(|| Error::MissingScores(self.model_path.clone()))?;
        join_benchmark(&actuals, &actuals_path, &scores, &scores_path)
    }
}

fn blob_path(model_path: &str, file: &str) -> String {
    if model_path.is_empty() {
        file.to_string()
    } else {
        format!("{}/{}", model_path.trim_end_matches('/'), file)
    }
}

/// Parse a scores file, detecting the raw shape from its header.
pub fn parse_scores_tsv(bytes: &[u8], file: &str) -> Result<Vec<Observation>> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| Error::MalformedHeader {
        file: file.to_string(),
        reason: "empty file".to_string(),
    })?;
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let column = |name: &str| columns.iter().position(|c| *c == name);

    let mut observations = Vec::new();
    let mut dropped = 0usize;

    if let Some(trues_idx) = column("trues") {
        // Aggregated shape: each row expands to trues + falses observations.
        let score_idx = require_column(file, &column("score"), "score")?;
        let falses_idx = require_column(file, &column("falses"), "falses")?;
        for line in lines {
            let fields: Vec<&str> = line.split('\t').collect();
            let parsed = (
                field_f64(&fields, score_idx),
                field_u64(&fields, trues_idx),
                field_u64(&fields, falses_idx),
            );
            let (Some(score), Some(trues), Some(falses)) = parsed else {
                dropped += 1;
                continue;
            };
            observations.reserve((trues + falses) as usize);
            for _ in 0..trues {
                observations.push(Observation::new(score, true));
            }
            for _ in 0..falses {
                observations.push(Observation::new(score, false));
            }
        }
    } else {
        let actual_idx = require_column(file, &column("actual"), "actual")?;
        let pred_idx = require_column(file, &column("pred_score"), "pred_score")?;
        for line in lines {
            let fields: Vec<&str> = line.split('\t').collect();
            let parsed = (field_bool(&fields, actual_idx), field_f64(&fields, pred_idx));
            let (Some(actual), Some(predicted)) = parsed else {
                dropped += 1;
                continue;
            };
            observations.push(Observation::new(predicted, actual));
        }
    }

    if dropped > 0 {
        debug!(file, dropped, "dropped incomplete rows");
    }
    Ok(observations)
}

/// Inner-join an actuals table to a scores table by id.
pub fn join_benchmark(
    actuals_bytes: &[u8],
    actuals_file: &str,
    scores_bytes: &[u8],
    scores_file: &str,
) -> Result<Vec<Observation>> {
    let actuals = parse_keyed_table(actuals_bytes, actuals_file, "actual", field_bool)?;
    let scores = parse_keyed_table(scores_bytes, scores_file, "pred_score", field_f64)?;

    let only_in_actuals = actuals.keys().filter(|id| !scores.contains_key(*id)).count();
    let only_in_scores = scores.keys().filter(|id| !actuals.contains_key(*id)).count();
    if only_in_actuals > 0 || only_in_scores > 0 {
        return Err(Error::IdSetMismatch {
            only_in_actuals,
            only_in_scores,
        });
    }

    Ok(actuals
        .iter()
        .map(|(id, &actual)| Observation::new(scores[id], actual))
        .collect())
}

/// Parse a two-column keyed table (`id` plus one value column) into a map.
/// A repeated id among parseable rows is a data-integrity error.
fn parse_keyed_table<T>(
    bytes: &[u8],
    file: &str,
    value_name: &str,
    parse_value: fn(&[&str], usize) -> Option<T>,
) -> Result<BTreeMap<String, T>> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| Error::MalformedHeader {
        file: file.to_string(),
        reason: "empty file".to_string(),
    })?;
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let column = |name: &str| columns.iter().position(|c| *c == name);
    let id_idx = require_column(file, &column("id"), "id")?;
    let value_idx = require_column(file, &column(value_name), value_name)?;

    let mut table = BTreeMap::new();
    for line in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        let id = match fields.get(id_idx).map(|s| s.trim()) {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        let Some(value) = parse_value(&fields, value_idx) else {
            continue;
        };
        if table.insert(id.to_string(), value).is_some() {
            return Err(Error::DuplicateId {
                table: file.to_string(),
                id: id.to_string(),
            });
        }
    }
    Ok(table)
}

fn require_column(file: &str, position: &Option<usize>, name: &str) -> Result<usize> {
    position.ok_or_else(|| Error::MalformedHeader {
        file: file.to_string(),
        reason: format!("missing required column '{}'", name),
    })
}

// Scores are probabilities; anything outside [0, 1] (or non-finite) is a
// broken row and drops like any other unparseable field, so no mass is ever
// fabricated in the boundary bins.
fn field_f64(fields: &[&str], idx: usize) -> Option<f64> {
    let value: f64 = fields.get(idx)?.trim().parse().ok()?;
    (value.is_finite() && (0.0..=1.0).contains(&value)).then_some(value)
}

fn field_u64(fields: &[&str], idx: usize) -> Option<u64> {
    fields.get(idx)?.trim().parse().ok()
}

fn field_bool(fields: &[&str], idx: usize) -> Option<bool> {
    match fields.get(idx)?.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}
