//! The Gaussian Mixture Model EM driver.

use rand::prelude::*;

use super::component::Mixture;
use super::util;
use crate::error::{Error, Result};
use crate::stats::SufficientStatistics;

/// Convergence tolerance for the log-likelihood.
///
/// An epoch converges when the absolute change is within `EPSILON` or the
/// relative change is within `EPSILON³`.
const EPSILON: f64 = 1e-3;

/// Parameters to rehydrate one mixture component from, as produced by a
/// previous [`GaussianMixtureModel::mixtures`] export.
#[derive(Debug, Clone)]
pub struct MixtureParams {
    /// Mixing weight.
    pub weight: f64,
    /// Mean vector.
    pub mean: Vec<f64>,
    /// Full covariance matrix.
    pub covariance: Vec<Vec<f64>>,
}

/// Read-only snapshot of one fitted mixture component.
///
/// This is the persistence surface of the model: callers may serialize it
/// however they like and later rebuild the model with
/// [`GaussianMixtureModel::from_mixtures`].
#[derive(Debug, Clone)]
pub struct MixtureEstimate {
    /// Cluster index, matching the labels returned by
    /// [`GaussianMixtureModel::get_cluster`].
    pub id: usize,
    /// Mixing weight.
    pub weight: f64,
    /// Mean vector.
    pub mean: Vec<f64>,
    /// Full covariance matrix.
    pub covariance: Vec<Vec<f64>>,
}

impl From<MixtureEstimate> for MixtureParams {
    fn from(estimate: MixtureEstimate) -> Self {
        Self {
            weight: estimate.weight,
            mean: estimate.mean,
            covariance: estimate.covariance,
        }
    }
}

/// Gaussian Mixture Model trained by Expectation-Maximization.
///
/// The caller drives the EM loop: each call to [`train`] runs an E-step
/// over a batch of samples (accumulating responsibility-weighted
/// statistics), and [`maximize_parameters`] runs the M-step, replacing
/// every component from its accumulator and reporting the epoch's
/// log-likelihood. Repeat until [`has_converged`] or an external iteration
/// budget runs out; the convergence flag is advisory, nothing here bounds
/// the loop.
///
/// ```rust
/// use gmix::GaussianMixtureModel;
///
/// let data = vec![
///     vec![0.0, 0.2], vec![0.2, 0.0], vec![0.1, 0.3], vec![0.3, 0.1],
///     vec![5.0, 5.2], vec![5.2, 5.0], vec![5.1, 5.3], vec![5.3, 5.1],
/// ];
///
/// let mut model = GaussianMixtureModel::new(2, 2).unwrap().with_seed(42);
/// for _ in 0..50 {
///     model.train(&data).unwrap();
///     model.maximize_parameters().unwrap();
///     if model.has_converged() {
///         break;
///     }
/// }
/// let label = model.get_cluster(&data[0]).unwrap();
/// assert!(label < 2);
/// ```
///
/// [`train`]: GaussianMixtureModel::train
/// [`maximize_parameters`]: GaussianMixtureModel::maximize_parameters
/// [`has_converged`]: GaussianMixtureModel::has_converged
#[derive(Debug, Clone)]
pub struct GaussianMixtureModel {
    k: usize,
    d: usize,
    /// Current component parameters; empty until the first M-step when the
    /// model was constructed with [`GaussianMixtureModel::new`].
    mixtures: Vec<Mixture>,
    /// Per-cluster E-step accumulators, reset every M-step.
    accumulators: Vec<SufficientStatistics>,
    /// Σ responsibility per cluster for the current epoch.
    responsibility_totals: Vec<f64>,
    log_likelihood: f64,
    previous_log_likelihood: f64,
    samples_seen_this_epoch: usize,
    initialized: bool,
    converged: bool,
    rng: StdRng,
}

impl GaussianMixtureModel {
    /// Create an untrained model with `k` clusters over `d` dimensions.
    ///
    /// The first [`train`] call assigns random positive responsibilities,
    /// so every cluster starts the first epoch non-empty.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `k` or `d` is zero.
    ///
    /// [`train`]: GaussianMixtureModel::train
    pub fn new(k: usize, d: usize) -> Result<Self> {
        if k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        if d == 0 {
            return Err(Error::InvalidParameter {
                name: "d",
                message: "must be at least 1",
            });
        }

        Ok(Self {
            k,
            d,
            mixtures: Vec::new(),
            accumulators: (0..k).map(|_| SufficientStatistics::new(d)).collect(),
            responsibility_totals: vec![0.0; k],
            log_likelihood: 0.0,
            previous_log_likelihood: f64::NAN,
            samples_seen_this_epoch: 0,
            initialized: false,
            converged: false,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Seed the random initial responsibilities for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Rebuild a previously trained model from stored mixture parameters.
    ///
    /// The model starts initialized: [`train`] evaluates densities
    /// immediately and [`get_cluster`] works before any further training.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] for an empty list,
    /// [`Error::InvalidParameter`] for zero-dimensional means or a
    /// negative/non-finite weight,
    /// [`Error::DimensionMismatch`] for inconsistent dimensionalities, and
    /// [`Error::InvalidCovariance`] if any covariance is not
    /// positive-definite.
    ///
    /// [`train`]: GaussianMixtureModel::train
    /// [`get_cluster`]: GaussianMixtureModel::get_cluster
    pub fn from_mixtures(params: Vec<MixtureParams>) -> Result<Self> {
        if params.is_empty() {
            return Err(Error::EmptyInput);
        }
        let d = params[0].mean.len();
        if d == 0 {
            return Err(Error::InvalidParameter {
                name: "mean",
                message: "must have at least one dimension",
            });
        }

        let k = params.len();
        let mut mixtures = Vec::with_capacity(k);
        for p in params {
            if p.mean.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: p.mean.len(),
                });
            }
            mixtures.push(Mixture::new(p.weight, p.mean, p.covariance)?);
        }

        Ok(Self {
            k,
            d,
            mixtures,
            accumulators: (0..k).map(|_| SufficientStatistics::new(d)).collect(),
            responsibility_totals: vec![0.0; k],
            log_likelihood: 0.0,
            previous_log_likelihood: f64::NAN,
            samples_seen_this_epoch: 0,
            initialized: true,
            converged: false,
            rng: StdRng::from_os_rng(),
        })
    }

    /// Number of clusters.
    pub fn cluster_count(&self) -> usize {
        self.k
    }

    /// Sample dimensionality.
    pub fn dimensions(&self) -> usize {
        self.d
    }

    /// Whether the last M-step met the convergence criterion.
    ///
    /// Advisory only: training past convergence is allowed, just pointless.
    pub fn has_converged(&self) -> bool {
        self.converged
    }

    /// E-step: fold a batch of samples into the per-cluster accumulators.
    ///
    /// May be called any number of times before a
    /// [`maximize_parameters`]; the epoch covers everything accumulated
    /// since the last M-step.
    ///
    /// For each sample, unnormalized responsibilities are the per-cluster
    /// weighted densities (or `1 + uniform(0, 1)` on the very first epoch,
    /// before any parameters exist). When every density underflows to zero
    /// (or the total is not finite, which a sample with non-finite
    /// components can cause), the sample is deterministically assigned to
    /// the cluster minimizing the dot product with its mean, with
    /// responsibility `f64::MIN_POSITIVE`, so the responsibility
    /// distribution is always defined. The epoch log-likelihood accumulates
    /// `ln Σt` as-is, including the underflowed fallback contribution.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if any sample's length differs from
    /// `d`, in which case nothing is accumulated.
    ///
    /// [`maximize_parameters`]: GaussianMixtureModel::maximize_parameters
    pub fn train(&mut self, samples: &[Vec<f64>]) -> Result<()> {
        // Whole-batch validation up front, so a bad row cannot leave the
        // epoch partially accumulated.
        for x in samples {
            if x.len() != self.d {
                return Err(Error::DimensionMismatch {
                    expected: self.d,
                    found: x.len(),
                });
            }
        }

        let mut responsibilities = vec![0.0; self.k];

        for x in samples {
            if self.initialized {
                for (t, mixture) in responsibilities.iter_mut().zip(&self.mixtures) {
                    *t = mixture.weighted_pdf(x)?;
                }
            } else {
                for t in responsibilities.iter_mut() {
                    *t = 1.0 + self.rng.random::<f64>();
                }
            }

            let mut total: f64 = responsibilities.iter().sum();
            if !(total > 0.0) {
                let nearest = self.fallback_cluster(x);
                responsibilities.fill(0.0);
                responsibilities[nearest] = f64::MIN_POSITIVE;
                total = f64::MIN_POSITIVE;
            }

            for (j, &t) in responsibilities.iter().enumerate() {
                let w = t / total;
                self.responsibility_totals[j] += w;
                self.accumulators[j].add_weighted_sample(x, w)?;
            }
            self.log_likelihood += total.ln();
            self.samples_seen_this_epoch += 1;
        }

        Ok(())
    }

    /// M-step: refit every cluster from its accumulator and close the epoch.
    ///
    /// Each cluster's new weight is its responsibility share of the epoch,
    /// and its new mean/covariance come from its accumulator; accumulators
    /// and responsibility totals are then reset. All `k` replacement
    /// components are constructed before any state is committed, so a
    /// failure leaves the model unchanged and still usable.
    ///
    /// Returns this epoch's log-likelihood score, which is `NaN` for the
    /// very first epoch of a [`new`]-constructed model (there is no
    /// previous epoch to compare against, so the first epoch can neither
    /// be scored for convergence nor reported).
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] if no samples were accumulated this epoch;
    /// [`Error::InvalidCovariance`] if some cluster's accumulated
    /// covariance is not positive-definite (typically a collapsed or
    /// starved cluster).
    ///
    /// [`new`]: GaussianMixtureModel::new
    pub fn maximize_parameters(&mut self) -> Result<f64> {
        if self.samples_seen_this_epoch == 0 {
            return Err(Error::EmptyInput);
        }
        let n = self.samples_seen_this_epoch as f64;

        let mut replacements = Vec::with_capacity(self.k);
        for j in 0..self.k {
            let weight = self.responsibility_totals[j] / n;
            let mean = self.accumulators[j].mean();
            let covariance = self.accumulators[j].covariance();
            replacements.push(Mixture::new(weight, mean, covariance)?);
        }

        self.mixtures = replacements;
        for accumulator in &mut self.accumulators {
            accumulator.reset();
        }
        self.responsibility_totals.fill(0.0);

        let epoch_score = self.log_likelihood;
        let absolute_diff = epoch_score - self.previous_log_likelihood;
        let relative_diff = (1.0 - self.previous_log_likelihood / epoch_score).abs();
        self.converged = self.initialized
            && (absolute_diff.abs() <= EPSILON || relative_diff < EPSILON.powi(3));

        // The first epoch of a fresh model has nothing to compare against.
        self.previous_log_likelihood = if self.initialized {
            epoch_score
        } else {
            f64::NAN
        };
        self.log_likelihood = 0.0;
        self.samples_seen_this_epoch = 0;
        self.initialized = true;

        Ok(self.previous_log_likelihood)
    }

    /// Index of the cluster assigning the highest weighted density.
    ///
    /// If every density is zero (or undefined), falls back to the same
    /// minimum-dot-product heuristic as the E-step, so a valid index is
    /// always produced.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] before the first M-step or rehydration;
    /// [`Error::DimensionMismatch`] for a sample of the wrong length.
    pub fn get_cluster(&self, sample: &[f64]) -> Result<usize> {
        if self.mixtures.is_empty() {
            return Err(Error::NotInitialized);
        }
        if sample.len() != self.d {
            return Err(Error::DimensionMismatch {
                expected: self.d,
                found: sample.len(),
            });
        }

        let mut best = None;
        let mut best_pdf = 0.0;
        for (j, mixture) in self.mixtures.iter().enumerate() {
            let pdf = mixture.weighted_pdf(sample)?;
            if pdf > best_pdf {
                best_pdf = pdf;
                best = Some(j);
            }
        }

        Ok(best.unwrap_or_else(|| self.fallback_cluster(sample)))
    }

    /// Like [`get_cluster`], but judged on the sub-Gaussians projected onto
    /// `variable_indices`; `sample` holds one value per projected
    /// dimension, in index order.
    ///
    /// # Errors
    ///
    /// As [`get_cluster`], plus [`Error::InvalidParameter`] for an empty
    /// or out-of-range index set and [`Error::InvalidCovariance`] if some
    /// projected covariance is not positive-definite.
    ///
    /// [`get_cluster`]: GaussianMixtureModel::get_cluster
    pub fn get_marginal_cluster(&self, variable_indices: &[usize], sample: &[f64]) -> Result<usize> {
        if self.mixtures.is_empty() {
            return Err(Error::NotInitialized);
        }

        let mut best = None;
        let mut best_pdf = 0.0;
        for (j, mixture) in self.mixtures.iter().enumerate() {
            let pdf = mixture.marginal_weighted_pdf(variable_indices, sample)?;
            if pdf > best_pdf {
                best_pdf = pdf;
                best = Some(j);
            }
        }

        if let Some(j) = best {
            return Ok(j);
        }

        // Fallback projected onto the requested dimensions.
        let nearest = self
            .mixtures
            .iter()
            .enumerate()
            .map(|(j, mixture)| {
                let projected: Vec<f64> =
                    variable_indices.iter().map(|&i| mixture.mean()[i]).collect();
                (j, util::finite_dot(sample, &projected))
            })
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(j, _)| j)
            .unwrap_or(0);
        Ok(nearest)
    }

    /// Normalized responsibilities of every cluster for one sample, using
    /// the current parameters (a read-only E-step for a single sample).
    ///
    /// Applies the same underflow fallback as [`train`], so the returned
    /// distribution always sums to 1.
    ///
    /// # Errors
    ///
    /// [`Error::NotInitialized`] before the first M-step or rehydration;
    /// [`Error::DimensionMismatch`] for a sample of the wrong length.
    ///
    /// [`train`]: GaussianMixtureModel::train
    pub fn responsibilities(&self, sample: &[f64]) -> Result<Vec<f64>> {
        if self.mixtures.is_empty() {
            return Err(Error::NotInitialized);
        }
        if sample.len() != self.d {
            return Err(Error::DimensionMismatch {
                expected: self.d,
                found: sample.len(),
            });
        }

        let mut weights: Vec<f64> = self
            .mixtures
            .iter()
            .map(|mixture| mixture.weighted_pdf(sample))
            .collect::<Result<_>>()?;
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            for w in &mut weights {
                *w /= total;
            }
        } else {
            let nearest = self.fallback_cluster(sample);
            weights.fill(0.0);
            weights[nearest] = 1.0;
        }
        Ok(weights)
    }

    /// Read-only export of the current mixture parameters, for persistence
    /// or inspection. Empty before the first M-step of a fresh model.
    pub fn mixtures(&self) -> Vec<MixtureEstimate> {
        self.mixtures
            .iter()
            .enumerate()
            .map(|(id, mixture)| MixtureEstimate {
                id,
                weight: mixture.weight(),
                mean: mixture.mean().to_vec(),
                covariance: mixture.covariance().to_vec(),
            })
            .collect()
    }

    /// Deterministic stand-in for an all-zero responsibility distribution:
    /// the cluster whose mean has the smallest dot product with the sample.
    fn fallback_cluster(&self, sample: &[f64]) -> usize {
        self.mixtures
            .iter()
            .enumerate()
            .map(|(j, mixture)| (j, util::finite_dot(sample, mixture.mean())))
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(j, _)| j)
            .unwrap_or(0)
    }
}
