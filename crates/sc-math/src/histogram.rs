//! Quantized score histograms.
//!
//! An observation set is summarized into a fixed number of probability bins,
//! giving an O(1)-size representation that every downstream metric is derived
//! from. Bins are half-open `[i/B, (i+1)/B)` with the last bin closed at 1.0,
//! so each observation lands in exactly one bin and `sum(totals)` equals the
//! observation count.

use serde::{Deserialize, Serialize};

/// Number of probability bins in every histogram.
pub const BIN_COUNT: usize = 100;

/// A single scored outcome: what the model predicted and what happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Predicted probability of the positive class (0.0 to 1.0).
    pub predicted: f64,
    /// Ground truth outcome.
    pub actual: bool,
}

impl Observation {
    pub fn new(predicted: f64, actual: bool) -> Self {
        Self { predicted, actual }
    }
}

/// Errors from histogram construction.
#[derive(Debug, Clone, PartialEq)]
pub enum HistogramError {
    /// The three sequences have different lengths.
    LengthMismatch {
        probs: usize,
        trues: usize,
        totals: usize,
    },
    /// A bin claims more true observations than total observations.
    CountExceedsTotal { bin: usize, trues: u64, total: u64 },
    /// A bin probability is outside [0, 1] or not finite.
    ProbOutOfRange { bin: usize, prob: f64 },
    /// Bin probabilities are not strictly ascending.
    ProbsNotAscending { bin: usize },
}

impl std::fmt::Display for HistogramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistogramError::LengthMismatch {
                probs,
                trues,
                totals,
            } => write!(
                f,
                "sequence lengths differ: probs={}, trues={}, totals={}",
                probs, trues, totals
            ),
            HistogramError::CountExceedsTotal { bin, trues, total } => write!(
                f,
                "bin {} has {} trues but only {} observations",
                bin, trues, total
            ),
            HistogramError::ProbOutOfRange { bin, prob } => {
                write!(f, "bin {} probability {} is outside [0, 1]", bin, prob)
            }
            HistogramError::ProbsNotAscending { bin } => {
                write!(f, "bin probabilities are not ascending at bin {}", bin)
            }
        }
    }
}

impl std::error::Error for HistogramError {}

/// Fixed-bin-count quantized summary of an observation set.
///
/// Three equal-length sequences indexed by bin: the bin's representative
/// probability (midpoint of its edges), the count of true observations, and
/// the count of all observations. Fields are private; every constructed
/// value satisfies the shape invariants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    probs: Vec<f64>,
    trues: Vec<u64>,
    totals: Vec<u64>,
}

/// Wire shape for deserialization; validated before becoming a `Histogram`.
#[derive(Deserialize)]
struct RawHistogram {
    probs: Vec<f64>,
    trues: Vec<u64>,
    totals: Vec<u64>,
}

impl<'de> Deserialize<'de> for Histogram {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawHistogram::deserialize(deserializer)?;
        Histogram::from_parts(raw.probs, raw.trues, raw.totals).map_err(serde::de::Error::custom)
    }
}

impl Histogram {
    /// Build a validated histogram from its three sequences.
    pub fn from_parts(
        probs: Vec<f64>,
        trues: Vec<u64>,
        totals: Vec<u64>,
    ) -> Result<Self, HistogramError> {
        if probs.len() != trues.len() || probs.len() != totals.len() {
            return Err(HistogramError::LengthMismatch {
                probs: probs.len(),
                trues: trues.len(),
                totals: totals.len(),
            });
        }
        for (i, &p) in probs.iter().enumerate() {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return Err(HistogramError::ProbOutOfRange { bin: i, prob: p });
            }
            if i > 0 && p <= probs[i - 1] {
                return Err(HistogramError::ProbsNotAscending { bin: i });
            }
        }
        for i in 0..trues.len() {
            if trues[i] > totals[i] {
                return Err(HistogramError::CountExceedsTotal {
                    bin: i,
                    trues: trues[i],
                    total: totals[i],
                });
            }
        }
        Ok(Self {
            probs,
            trues,
            totals,
        })
    }

    /// Construct without validation. Callers must uphold the invariants.
    pub(crate) fn from_parts_unchecked(probs: Vec<f64>, trues: Vec<u64>, totals: Vec<u64>) -> Self {
        debug_assert_eq!(probs.len(), trues.len());
        debug_assert_eq!(probs.len(), totals.len());
        Self {
            probs,
            trues,
            totals,
        }
    }

    /// Quantize an observation set into `BIN_COUNT` bins.
    ///
    /// Single pass: each observation buckets by `floor(p * B)`, clamped to
    /// the last bin so a prediction of exactly 1.0 is still counted.
    /// Predictions outside [0, 1] clamp to the boundary bins.
    pub fn from_observations(observations: &[Observation]) -> Self {
        let mut trues = vec![0u64; BIN_COUNT];
        let mut totals = vec![0u64; BIN_COUNT];
        for obs in observations {
            let p = obs.predicted.clamp(0.0, 1.0);
            let bin = ((p * BIN_COUNT as f64) as usize).min(BIN_COUNT - 1);
            totals[bin] += 1;
            if obs.actual {
                trues[bin] += 1;
            }
        }
        let probs = (0..BIN_COUNT)
            .map(|i| (2 * i + 1) as f64 / (2 * BIN_COUNT) as f64)
            .collect();
        Self {
            probs,
            trues,
            totals,
        }
    }

    /// Representative probability of each bin (midpoint of its edges).
    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Count of true observations per bin.
    pub fn trues(&self) -> &[u64] {
        &self.trues
    }

    /// Count of all observations per bin.
    pub fn totals(&self) -> &[u64] {
        &self.totals
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Total observation count N.
    pub fn total_count(&self) -> u64 {
        self.totals.iter().sum()
    }

    /// Total count of true observations across all bins.
    pub fn total_trues(&self) -> u64 {
        self.trues.iter().sum()
    }

    /// Total count of false observations across all bins.
    pub fn total_falses(&self) -> u64 {
        self.total_count() - self.total_trues()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn obs(pairs: &[(f64, bool)]) -> Vec<Observation> {
        pairs
            .iter()
            .map(|&(predicted, actual)| Observation { predicted, actual })
            .collect()
    }

    #[test]
    fn empty_observation_set() {
        let hist = Histogram::from_observations(&[]);
        assert_eq!(hist.len(), BIN_COUNT);
        assert_eq!(hist.total_count(), 0);
        assert_eq!(hist.total_trues(), 0);
    }

    #[test]
    fn bin_midpoints() {
        let hist = Histogram::from_observations(&[]);
        assert!((hist.probs()[0] - 0.005).abs() < 1e-12);
        assert!((hist.probs()[50] - 0.505).abs() < 1e-12);
        assert!((hist.probs()[99] - 0.995).abs() < 1e-12);
    }

    #[test]
    fn counts_land_in_expected_bins() {
        // Interior values sit safely inside their bin; decimal literals that
        // fall exactly on an edge belong in edge_value_counts_once_in_upper_bin.
        let hist = Histogram::from_observations(&obs(&[
            (0.0, false),
            (0.009, true),
            (0.575, true),
            (0.571, false),
            (1.0, true),
        ]));
        assert_eq!(hist.totals()[0], 2);
        assert_eq!(hist.trues()[0], 1);
        assert_eq!(hist.totals()[57], 2);
        assert_eq!(hist.trues()[57], 1);
        // 1.0 clamps into the last bin rather than overflowing
        assert_eq!(hist.totals()[99], 1);
        assert_eq!(hist.trues()[99], 1);
    }

    #[test]
    fn bucketing_follows_the_f64_value_not_the_decimal_literal() {
        // The f64 nearest to 0.57 is just below 0.57, so floor-bucketing
        // puts it in bin 56. Asserting this here keeps other tests honest
        // about which literals are safe to use as bin anchors.
        assert!(0.57f64 * 100.0 < 57.0);
        let hist = Histogram::from_observations(&obs(&[(0.57, true)]));
        assert_eq!(hist.totals()[56], 1);
        assert_eq!(hist.totals()[57], 0);
    }

    #[test]
    fn edge_value_counts_once_in_upper_bin() {
        // Pins the half-open bin policy: a score exactly on an interior
        // edge belongs to the bin it opens, and is never double-counted.
        let hist = Histogram::from_observations(&obs(&[(0.5, true)]));
        assert_eq!(hist.totals()[50], 1);
        assert_eq!(hist.totals()[49], 0);
        assert_eq!(hist.total_count(), 1);
    }

    #[test]
    fn from_parts_rejects_length_mismatch() {
        let err = Histogram::from_parts(vec![0.5], vec![1, 2], vec![3]).unwrap_err();
        assert!(matches!(err, HistogramError::LengthMismatch { .. }));
    }

    #[test]
    fn from_parts_rejects_trues_above_totals() {
        let err = Histogram::from_parts(vec![0.5], vec![4], vec![3]).unwrap_err();
        assert!(matches!(
            err,
            HistogramError::CountExceedsTotal { bin: 0, .. }
        ));
    }

    #[test]
    fn from_parts_rejects_bad_probs() {
        let err = Histogram::from_parts(vec![1.5], vec![0], vec![0]).unwrap_err();
        assert!(matches!(err, HistogramError::ProbOutOfRange { bin: 0, .. }));

        let err = Histogram::from_parts(vec![0.7, 0.3], vec![0, 0], vec![0, 0]).unwrap_err();
        assert!(matches!(err, HistogramError::ProbsNotAscending { bin: 1 }));
    }

    #[test]
    fn serde_roundtrip_is_bit_identical() {
        let hist = Histogram::from_observations(&obs(&[
            (0.1, false),
            (0.5, true),
            (0.5, false),
            (0.95, true),
        ]));
        let json = serde_json::to_string(&hist).unwrap();
        let back: Histogram = serde_json::from_str(&json).unwrap();
        assert_eq!(back.probs(), hist.probs());
        assert_eq!(back.trues(), hist.trues());
        assert_eq!(back.totals(), hist.totals());
    }

    #[test]
    fn deserialize_rejects_invalid_shape() {
        let json = r#"{"probs":[0.5],"trues":[2],"totals":[1]}"#;
        assert!(serde_json::from_str::<Histogram>(json).is_err());
    }

    proptest! {
        #[test]
        fn totals_sum_to_n(preds in proptest::collection::vec((0.0f64..=1.0, any::<bool>()), 0..500)) {
            let observations: Vec<Observation> = preds
                .iter()
                .map(|&(p, a)| Observation { predicted: p, actual: a })
                .collect();
            let hist = Histogram::from_observations(&observations);
            prop_assert_eq!(hist.total_count(), observations.len() as u64);
            for i in 0..hist.len() {
                prop_assert!(hist.trues()[i] <= hist.totals()[i]);
            }
        }

        #[test]
        fn every_observation_lands_in_its_edge_bin(p in 0.0f64..1.0) {
            let hist = Histogram::from_observations(&[Observation { predicted: p, actual: true }]);
            let expected = ((p * BIN_COUNT as f64) as usize).min(BIN_COUNT - 1);
            prop_assert_eq!(hist.totals()[expected], 1);
        }
    }
}
