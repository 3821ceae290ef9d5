//! One-shot GMM estimator over the EM engine.
//!
//! [`Gmm`] bundles model construction, the train/maximize loop, and the
//! final assignment pass behind the same fit-style surface as the rest of
//! the crate's clustering interfaces, for callers who don't need to drive
//! EM epoch by epoch.

use super::model::GaussianMixtureModel;
use super::traits::{Clustering, SoftClustering};
use crate::error::{Error, Result};

/// Gaussian Mixture Model clustering with a bounded EM run.
///
/// ```rust
/// use gmix::{Clustering, Gmm};
///
/// let data = vec![
///     vec![0.0, 0.2], vec![0.2, 0.0], vec![0.1, 0.3],
///     vec![5.0, 5.2], vec![5.2, 5.0], vec![5.1, 5.3],
/// ];
///
/// let labels = Gmm::new(2).with_seed(42).fit_predict(&data).unwrap();
/// assert_eq!(labels.len(), data.len());
/// ```
#[derive(Debug, Clone)]
pub struct Gmm {
    /// Number of mixture components.
    k: usize,
    /// EM iteration budget.
    max_iter: usize,
    /// Random seed for the initial responsibilities.
    seed: Option<u64>,
}

impl Gmm {
    /// Create a GMM estimator with `k` components.
    ///
    /// Defaults: `max_iter = 100`, unseeded.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            seed: None,
        }
    }

    /// Set the EM iteration budget.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the random seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run EM on `data` and return the fitted model.
    ///
    /// Iterates train/maximize until convergence or the iteration budget.
    /// A cluster collapse (`InvalidCovariance` from the M-step) stops the
    /// run and keeps the last consistent parameters, which the atomic
    /// M-step guarantees are still in place; every other error propagates.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] for an empty dataset,
    /// [`Error::InvalidParameter`] for zero `k` or zero-dimensional rows,
    /// [`Error::InvalidClusterCount`] if `k` exceeds the number of rows,
    /// [`Error::DimensionMismatch`] for rows of unequal length, and
    /// [`Error::InvalidCovariance`] if even the first M-step fails (the
    /// dataset cannot support full-covariance Gaussians, e.g. collinear
    /// data).
    pub fn fit(&self, data: &[Vec<f64>]) -> Result<GaussianMixtureModel> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.k > data.len() {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: data.len(),
            });
        }

        let d = data[0].len();
        if d == 0 {
            return Err(Error::InvalidParameter {
                name: "dimension",
                message: "must be at least 1",
            });
        }
        for row in data.iter().skip(1) {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
        }

        let mut model = GaussianMixtureModel::new(self.k, d)?;
        if let Some(seed) = self.seed {
            model = model.with_seed(seed);
        }

        for _ in 0..self.max_iter {
            model.train(data)?;
            match model.maximize_parameters() {
                Ok(_) => {}
                // Cluster collapse: stop with the last consistent
                // parameters (the failed M-step changed nothing). On the
                // first epoch there are no parameters to keep, so the
                // error stands.
                Err(Error::InvalidCovariance { .. }) if !model.mixtures().is_empty() => break,
                Err(e) => return Err(e),
            }
            if model.has_converged() {
                break;
            }
        }

        Ok(model)
    }
}

impl Clustering for Gmm {
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        let model = self.fit(data)?;
        data.iter().map(|row| model.get_cluster(row)).collect()
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

impl SoftClustering for Gmm {
    fn fit_predict_proba(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let model = self.fit(data)?;
        data.iter().map(|row| model.responsibilities(row)).collect()
    }
}
