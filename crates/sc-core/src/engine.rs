//! The metrics engine: histogram construction with cache-through semantics
//! and metric derivation with optional bootstrap resampling.
//!
//! Composition over inheritance: the engine is parameterized by an
//! `ObservationSource` (plain scores vs benchmarked join), so the two
//! loading strategies stay independently testable and the engine itself
//! never knows which one it is running.
//!
//! Everything here is synchronous and side-effect-free except the one cache
//! write after the first computation of the canonical histogram. Concurrent
//! computations of the same model may race on that write; the content is
//! deterministic for the same input, so last-writer-wins is acceptable.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use sc_common::{Error, Result};
use sc_math::{
    poisson_perturb, resample_rows, Histogram, MetricsResult, Observation, ResampleStrategy,
};

use crate::cache::HistogramCache;
use crate::dataset::ObservationSource;
use crate::store::ObjectStore;

/// Histogram-based metrics engine for one model.
pub struct MetricsEngine<'a, S: ObservationSource> {
    store: &'a dyn ObjectStore,
    cache: &'a dyn HistogramCache,
    source: S,
}

impl<'a, S: ObservationSource> MetricsEngine<'a, S> {
    pub fn new(store: &'a dyn ObjectStore, cache: &'a dyn HistogramCache, source: S) -> Self {
        Self {
            store,
            cache,
            source,
        }
    }

    /// The canonical histogram, cache-through.
    ///
    /// A cached entry wins unconditionally; it is never refreshed because
    /// new raw data arrived. Callers invalidate explicitly when they know
    /// the data changed.
    pub fn build_histogram(&self) -> Result<Histogram> {
        Ok(self.histogram_with_observations()?.0)
    }

    /// Cache-through histogram, handing back the raw observations when the
    /// miss path had to load them anyway so callers can reuse them.
    fn histogram_with_observations(&self) -> Result<(Histogram, Option<Vec<Observation>>)> {
        let key = self.source.model_path();
        if let Some(hist) = self.cache.get(key)? {
            debug!(model = key, "histogram cache hit");
            return Ok((hist, None));
        }
        debug!(model = key, "histogram cache miss, computing from raw data");
        let observations = self.source.load(self.store)?;
        let hist = Histogram::from_observations(&observations);
        self.cache.put(key, &hist)?;
        Ok((hist, Some(observations)))
    }

    /// Canonical metrics first, then `bootstrap` resampled variants.
    ///
    /// Row resampling needs the raw observations; when those are gone but a
    /// cached histogram survives, it degrades to per-bin Poisson
    /// perturbation rather than failing. Resampled histograms are never
    /// written to the cache.
    pub fn compute_metrics(
        &self,
        bootstrap: usize,
        strategy: ResampleStrategy,
        seed: u64,
    ) -> Result<Vec<MetricsResult>> {
        let (hist, loaded) = self.histogram_with_observations()?;
        let mut results = vec![MetricsResult::from_histogram(&hist)?];
        if bootstrap == 0 {
            return Ok(results);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        match strategy {
            ResampleStrategy::Rows => {
                // Observations loaded on the cache-miss path are reused; a
                // cache hit is the only case that loads here.
                let observations = match loaded {
                    Some(observations) => Ok(observations),
                    None => self.source.load(self.store),
                };
                match observations {
                    Ok(observations) => {
                        for _ in 0..bootstrap {
                            let drawn = resample_rows(&observations, &mut rng);
                            results.push(MetricsResult::from_histogram(&drawn)?);
                        }
                    }
                    Err(Error::MissingScores(model)) => {
                        warn!(
                            model,
                            "raw scores unavailable, falling back to poisson perturbation"
                        );
                        self.push_poisson(&hist, bootstrap, &mut rng, &mut results)?;
                    }
                    Err(e) => return Err(e),
                }
            }
            ResampleStrategy::Poisson => {
                self.push_poisson(&hist, bootstrap, &mut rng, &mut results)?;
            }
        }
        Ok(results)
    }

    /// Drop the cached histogram so the next computation starts from raw data.
    pub fn delete_cache(&self) -> Result<()> {
        self.cache.invalidate(self.source.model_path())
    }

    fn push_poisson(
        &self,
        hist: &Histogram,
        bootstrap: usize,
        rng: &mut StdRng,
        results: &mut Vec<MetricsResult>,
    ) -> Result<()> {
        for _ in 0..bootstrap {
            let drawn = poisson_perturb(hist, rng);
            results.push(MetricsResult::from_histogram(&drawn)?);
        }
        Ok(())
    }
}
