//! A single Gaussian mixture component.

use super::util;
use crate::error::{Error, Result};

/// One component of a Gaussian mixture: a mixing weight plus a multivariate
/// normal distribution.
///
/// Immutable once constructed. The Cholesky factor of the covariance is
/// computed up front, so construction fails fast on a non-positive-definite
/// covariance and repeated density evaluations share the factorization.
#[derive(Debug, Clone)]
pub struct Mixture {
    weight: f64,
    mean: Vec<f64>,
    covariance: Vec<Vec<f64>>,
    /// Packed lower-triangular Cholesky factor of `covariance`.
    lower: Vec<f64>,
}

impl Mixture {
    /// Build a component from its parameters.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `weight` is negative or non-finite
    /// (a negative weight would flip density comparisons);
    /// [`Error::DimensionMismatch`] if `covariance` is not square with the
    /// same dimensionality as `mean`; [`Error::InvalidCovariance`] if the
    /// covariance is not positive-definite (no density exists for it).
    pub fn new(weight: f64, mean: Vec<f64>, covariance: Vec<Vec<f64>>) -> Result<Self> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidParameter {
                name: "weight",
                message: "must be finite and non-negative",
            });
        }

        let d = mean.len();
        if covariance.len() != d {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: covariance.len(),
            });
        }
        for row in &covariance {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
        }

        let lower =
            util::cholesky(&covariance).map_err(|dimension| Error::InvalidCovariance { dimension })?;

        Ok(Self {
            weight,
            mean,
            covariance,
            lower,
        })
    }

    /// Mixing weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Mean vector.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Full covariance matrix.
    pub fn covariance(&self) -> &[Vec<f64>] {
        &self.covariance
    }

    /// Dimensionality of the component.
    pub fn dimensions(&self) -> usize {
        self.mean.len()
    }

    /// `weight × N(sample; mean, covariance)`.
    ///
    /// Evaluated in log space through the precomputed Cholesky factor;
    /// underflows gracefully to 0 for samples far from the mean.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if `sample.len()` differs from the
    /// component's dimensionality.
    pub fn weighted_pdf(&self, sample: &[f64]) -> Result<f64> {
        if sample.len() != self.mean.len() {
            return Err(Error::DimensionMismatch {
                expected: self.mean.len(),
                found: sample.len(),
            });
        }
        Ok(self.weight * util::log_density(&self.lower, &self.mean, sample).exp())
    }

    /// `weight × N(sample; mean, covariance)` for the sub-Gaussian obtained
    /// by projecting onto `variable_indices`.
    ///
    /// The projected covariance is re-factorized on every call; `sample`
    /// holds one value per projected dimension, in index order.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for an empty or out-of-range index set;
    /// [`Error::DimensionMismatch`] if `sample.len()` differs from the
    /// subset size; [`Error::InvalidCovariance`] if the projected
    /// covariance is not positive-definite.
    pub fn marginal_weighted_pdf(&self, variable_indices: &[usize], sample: &[f64]) -> Result<f64> {
        let d = self.mean.len();
        if variable_indices.is_empty() {
            return Err(Error::InvalidParameter {
                name: "variable_indices",
                message: "must name at least one dimension",
            });
        }
        if variable_indices.iter().any(|&i| i >= d) {
            return Err(Error::InvalidParameter {
                name: "variable_indices",
                message: "index out of range for this component",
            });
        }
        if sample.len() != variable_indices.len() {
            return Err(Error::DimensionMismatch {
                expected: variable_indices.len(),
                found: sample.len(),
            });
        }

        let sub_mean: Vec<f64> = variable_indices.iter().map(|&i| self.mean[i]).collect();
        let sub_cov: Vec<Vec<f64>> = variable_indices
            .iter()
            .map(|&i| variable_indices.iter().map(|&j| self.covariance[i][j]).collect())
            .collect();

        let lower = util::cholesky(&sub_cov).map_err(|p| Error::InvalidCovariance {
            dimension: variable_indices[p],
        })?;

        Ok(self.weight * util::log_density(&lower, &sub_mean, sample).exp())
    }
}
