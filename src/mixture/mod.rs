//! Gaussian Mixture Models trained by Expectation-Maximization.
//!
//! A GMM assumes data is generated from `k` Gaussian distributions:
//!
//! ```text
//! P(x) = Σ_k π_k × N(x | μ_k, Σ_k)
//! ```
//!
//! where `π_k` is cluster `k`'s mixing weight and `(μ_k, Σ_k)` its mean and
//! full covariance matrix. Unlike k-means, the assignments are **soft**: a
//! point belongs to every cluster with some probability (its
//! *responsibility*), which fits data where groups genuinely overlap.
//!
//! ## The EM loop
//!
//! Direct likelihood maximization is intractable (a sum inside a log), so
//! parameters are fitted by coordinate ascent:
//!
//! - **E-step** ([`GaussianMixtureModel::train`]): compute each sample's
//!   responsibilities from the current parameters and fold the
//!   responsibility-weighted samples into one
//!   [`SufficientStatistics`](crate::stats::SufficientStatistics)
//!   accumulator per cluster.
//! - **M-step** ([`GaussianMixtureModel::maximize_parameters`]): refit
//!   every cluster's weight/mean/covariance from its accumulator, reset the
//!   accumulators, and test the log-likelihood for convergence.
//!
//! The caller owns the loop and its iteration budget; the model's
//! convergence flag is advisory. [`Gmm`] wraps the loop behind a one-shot
//! [`Clustering`]/[`SoftClustering`] surface for callers who don't need
//! epoch-level control.
//!
//! ## Numerical behavior
//!
//! - Densities are evaluated through a Cholesky factorization of each
//!   covariance, computed once per component; a non-positive-definite
//!   covariance is rejected at construction
//!   ([`Error::InvalidCovariance`](crate::error::Error::InvalidCovariance)).
//! - When every cluster's density underflows to zero for a sample (high
//!   dimensions, outliers), the E-step falls back to a deterministic
//!   nearest-mean assignment instead of propagating `0/0`.
//! - Non-finite sample components are tolerated per-dimension by the
//!   accumulators rather than rejecting the sample.
//!
//! ## Failure modes to expect
//!
//! - **Local optima**: EM converges to a local maximum; initialization
//!   matters. Seed with [`GaussianMixtureModel::with_seed`] for
//!   reproducibility, or rehydrate known-good parameters with
//!   [`GaussianMixtureModel::from_mixtures`].
//! - **Cluster collapse**: a cluster starved of responsibility ends the
//!   epoch with a singular covariance, which the M-step rejects without
//!   corrupting the model.

mod component;
mod estimator;
mod model;
mod traits;
mod util;

pub use component::Mixture;
pub use estimator::Gmm;
pub use model::{GaussianMixtureModel, MixtureEstimate, MixtureParams};
pub use traits::{Clustering, SoftClustering};
