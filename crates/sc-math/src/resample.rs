//! Resampling strategies for confidence-band visualization.
//!
//! Two strategies, selectable per call:
//! - `Rows`: draw N observations with replacement from the raw set and
//!   re-histogram. Statistically faithful; needs the raw data.
//! - `Poisson`: redraw each bin's true and false counts from Poisson
//!   distributions centered on the observed counts. Cheap, histogram-only.
//!
//! Resampled histograms are visualization artifacts and are never persisted.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::histogram::{Histogram, Observation};

/// Which resampling strategy to use for bootstrap draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleStrategy {
    /// Resample raw observations with replacement (default).
    #[default]
    Rows,
    /// Per-bin Poisson perturbation of the histogram counts.
    Poisson,
}

impl std::str::FromStr for ResampleStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rows" | "row" | "bootstrap" => Ok(ResampleStrategy::Rows),
            "poisson" | "bins" => Ok(ResampleStrategy::Poisson),
            _ => Err(format!("unknown resample strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for ResampleStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResampleStrategy::Rows => write!(f, "rows"),
            ResampleStrategy::Poisson => write!(f, "poisson"),
        }
    }
}

/// Draw N observations uniformly with replacement and re-histogram.
pub fn resample_rows<R: Rng + ?Sized>(observations: &[Observation], rng: &mut R) -> Histogram {
    if observations.is_empty() {
        return Histogram::from_observations(&[]);
    }
    let n = observations.len();
    let drawn: Vec<Observation> = (0..n)
        .map(|_| observations[rng.random_range(0..n)])
        .collect();
    Histogram::from_observations(&drawn)
}

/// Perturb a histogram in place of true resampling: each bin's true and
/// false counts are redrawn from Poisson distributions with the observed
/// counts as means. Trades statistical fidelity for speed when the raw
/// observations are unavailable.
pub fn poisson_perturb<R: Rng + ?Sized>(hist: &Histogram, rng: &mut R) -> Histogram {
    let mut trues = Vec::with_capacity(hist.len());
    let mut totals = Vec::with_capacity(hist.len());
    for i in 0..hist.len() {
        let t = poisson(hist.trues()[i] as f64, rng);
        let f = poisson((hist.totals()[i] - hist.trues()[i]) as f64, rng);
        trues.push(t);
        totals.push(t + f);
    }
    Histogram::from_parts_unchecked(hist.probs().to_vec(), trues, totals)
}

/// Large-mean cutover for the Poisson sampler.
const POISSON_INVERSION_LIMIT: f64 = 30.0;

/// Sample from Poisson(lambda).
///
/// Knuth's product-of-uniforms method below `POISSON_INVERSION_LIMIT`; a
/// rounded normal approximation above it, where the distribution is close
/// to N(lambda, lambda) and bin counts are large enough that the rounding
/// error is irrelevant for confidence bands.
fn poisson<R: Rng + ?Sized>(lambda: f64, rng: &mut R) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    if lambda < POISSON_INVERSION_LIMIT {
        let limit = (-lambda).exp();
        let mut k = 0u64;
        let mut product = 1.0;
        loop {
            product *= rng.random::<f64>();
            if product <= limit {
                return k;
            }
            k += 1;
        }
    }
    // Box-Muller; 1 - u keeps the argument of ln strictly positive.
    let u1 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    let draw = lambda + lambda.sqrt() * z;
    if draw < 0.0 {
        0
    } else {
        draw.round() as u64
    }
}
