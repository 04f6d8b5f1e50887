//! Ranked metrics derived from a score histogram.
//!
//! Every ranked metric is a classification-threshold metric: the value at
//! bin `i` describes a classifier that selects everything scored at or above
//! that bin's threshold. Cumulative sums therefore run from the highest bin
//! down. Ratios with a zero denominator are `None`, never zero — the two
//! mean different things and must not be conflated downstream.

use serde::{Deserialize, Serialize};

use crate::histogram::Histogram;

/// Errors from metric derivation.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// Log-loss is undefined when a bin with observations carries a
    /// probability of exactly 0 or 1. The histogrammer never produces such a
    /// bin; this only fires on hand-edited cache input.
    LogDomain { bin: usize, prob: f64 },
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::LogDomain { bin, prob } => write!(
                f,
                "log-loss undefined: bin {} has probability {} with observations",
                bin, prob
            ),
        }
    }
}

impl std::error::Error for MetricsError {}

/// Brier score decomposition (Murphy): `score = reliability - resolution + uncertainty`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrierDecomposition {
    /// Mean squared gap between bin probability and observed rate.
    pub reliability: f64,
    /// How far per-bin observed rates move away from the base rate.
    pub resolution: f64,
    /// Variance of the outcome itself: `base_rate * (1 - base_rate)`.
    pub uncertainty: f64,
}

impl BrierDecomposition {
    /// Overall Brier score.
    pub fn score(&self) -> f64 {
        self.reliability - self.resolution + self.uncertainty
    }
}

/// Read-only metrics view over a histogram.
///
/// Ranked sequences are indexed identically to the histogram bins; entry `i`
/// describes selection at threshold `thresholds[i]` and above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    /// Bin probabilities, read as classification thresholds.
    pub thresholds: Vec<f64>,
    /// Observation count per bin.
    pub score_distribution: Vec<u64>,
    /// True-observation count per bin.
    pub trues: Vec<u64>,
    /// Cumulative precision at each threshold.
    pub precisions: Vec<Option<f64>>,
    /// Cumulative recall (TPR) at each threshold.
    pub recalls: Vec<Option<f64>>,
    /// Cumulative false-positive rate at each threshold.
    pub fprs: Vec<Option<f64>>,
    /// Per-bin (non-cumulative) precision.
    pub marginal_precisions: Vec<Option<f64>>,
    /// Log-loss over the quantized bins; `None` for an empty histogram.
    pub logloss: Option<f64>,
    /// Brier decomposition; `None` for an empty histogram.
    pub brier: Option<BrierDecomposition>,
    /// Trapezoidal AUC over the anchored ROC curve; `None` when the
    /// observation set has no positives or no negatives.
    pub auc: Option<f64>,
}

impl MetricsResult {
    /// Derive the full metrics view from a histogram.
    pub fn from_histogram(hist: &Histogram) -> Result<Self, MetricsError> {
        let recalls = recalls(hist);
        let fprs = fprs(hist);
        let auc = auc(&fprs, &recalls);
        Ok(MetricsResult {
            thresholds: hist.probs().to_vec(),
            score_distribution: hist.totals().to_vec(),
            trues: hist.trues().to_vec(),
            precisions: precisions(hist),
            recalls,
            fprs,
            marginal_precisions: marginal_precisions(hist),
            logloss: log_loss(hist)?,
            brier: brier(hist),
            auc,
        })
    }
}

/// Cumulative recall per bin: trues selected at-or-above the bin's
/// threshold over all trues. `None` everywhere when there are no trues.
pub fn recalls(hist: &Histogram) -> Vec<Option<f64>> {
    let all_trues = hist.total_trues();
    let mut out = vec![None; hist.len()];
    let mut selected = 0u64;
    for i in (0..hist.len()).rev() {
        selected += hist.trues()[i];
        if all_trues > 0 {
            out[i] = Some(selected as f64 / all_trues as f64);
        }
    }
    out
}

/// Cumulative false-positive rate per bin: falses selected at-or-above the
/// bin's threshold over all falses. `None` everywhere when there are no falses.
pub fn fprs(hist: &Histogram) -> Vec<Option<f64>> {
    let all_falses = hist.total_falses();
    let mut out = vec![None; hist.len()];
    let mut selected = 0u64;
    for i in (0..hist.len()).rev() {
        selected += hist.totals()[i] - hist.trues()[i];
        if all_falses > 0 {
            out[i] = Some(selected as f64 / all_falses as f64);
        }
    }
    out
}

/// Cumulative precision per bin: trues selected at-or-above the bin's
/// threshold over everything selected. `None` where nothing is selected.
pub fn precisions(hist: &Histogram) -> Vec<Option<f64>> {
    let mut out = vec![None; hist.len()];
    let mut trues = 0u64;
    let mut selected = 0u64;
    for i in (0..hist.len()).rev() {
        trues += hist.trues()[i];
        selected += hist.totals()[i];
        if selected > 0 {
            out[i] = Some(trues as f64 / selected as f64);
        }
    }
    out
}

/// Per-bin precision: `trues[i] / totals[i]`, `None` for empty bins.
pub fn marginal_precisions(hist: &Histogram) -> Vec<Option<f64>> {
    hist.trues()
        .iter()
        .zip(hist.totals())
        .map(|(&t, &n)| {
            if n > 0 {
                Some(t as f64 / n as f64)
            } else {
                None
            }
        })
        .collect()
}

/// Log-loss over bin midpoints.
///
/// `None` for an empty histogram. Errors if a bin with observations carries
/// a probability of exactly 0 or 1, where the cross-entropy diverges.
pub fn log_loss(hist: &Histogram) -> Result<Option<f64>, MetricsError> {
    let n = hist.total_count();
    if n == 0 {
        return Ok(None);
    }
    let mut loss = 0.0;
    for i in 0..hist.len() {
        let total = hist.totals()[i];
        if total == 0 {
            continue;
        }
        let p = hist.probs()[i];
        if p <= 0.0 || p >= 1.0 {
            return Err(MetricsError::LogDomain { bin: i, prob: p });
        }
        let trues = hist.trues()[i] as f64;
        let falses = (total - hist.trues()[i]) as f64;
        loss += trues * p.ln() + falses * (1.0 - p).ln();
    }
    Ok(Some(-loss / n as f64))
}

/// Brier decomposition into reliability, resolution, and uncertainty.
/// `None` for an empty histogram.
pub fn brier(hist: &Histogram) -> Option<BrierDecomposition> {
    let n = hist.total_count();
    if n == 0 {
        return None;
    }
    let n = n as f64;
    let base_rate = hist.total_trues() as f64 / n;
    let mut reliability = 0.0;
    let mut resolution = 0.0;
    for i in 0..hist.len() {
        let total = hist.totals()[i];
        if total == 0 {
            continue;
        }
        let weight = total as f64;
        let observed_rate = hist.trues()[i] as f64 / weight;
        reliability += weight * (hist.probs()[i] - observed_rate).powi(2);
        resolution += weight * (observed_rate - base_rate).powi(2);
    }
    Some(BrierDecomposition {
        reliability: reliability / n,
        resolution: resolution / n,
        uncertainty: base_rate * (1.0 - base_rate),
    })
}

/// Trapezoidal AUC over the ROC curve.
///
/// Points run from the highest threshold (smallest FPR) to the lowest,
/// anchored at (0,0) and (1,1). This is a numeric approximation over the
/// quantized curve, not exact AUC. `None` if any point is undefined.
pub fn auc(fprs: &[Option<f64>], tprs: &[Option<f64>]) -> Option<f64> {
    debug_assert_eq!(fprs.len(), tprs.len());
    let mut xs = Vec::with_capacity(fprs.len() + 2);
    let mut ys = Vec::with_capacity(tprs.len() + 2);
    xs.push(0.0);
    ys.push(0.0);
    for i in (0..fprs.len()).rev() {
        xs.push(fprs[i]?);
        ys.push(tprs[i]?);
    }
    xs.push(1.0);
    ys.push(1.0);

    let mut area = 0.0;
    for k in 1..xs.len() {
        area += (xs[k] - xs[k - 1]) * (ys[k] + ys[k - 1]) / 2.0;
    }
    Some(area)
}
