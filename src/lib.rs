//! Online sufficient statistics and Gaussian mixture modelling.
//!
//! `gmix` is a small, synchronous library with two pieces, consumed
//! leaf-first:
//!
//! - [`stats::SufficientStatistics`] — an online, mergeable accumulator for
//!   weighted mean and full covariance in `d` dimensions. Samples can be
//!   added one at a time, in column-major batches, or by merging two
//!   independently built accumulators (the merge is associative and
//!   commutative, so partitions of a dataset can be processed in parallel
//!   and combined in any order).
//! - [`mixture::GaussianMixtureModel`] — a Gaussian Mixture Model trained
//!   by Expectation-Maximization on top of one accumulator per cluster,
//!   with soft assignments, marginal (dimension-subset) assignments, and a
//!   plain-data export for persisting and rehydrating trained parameters.
//!
//! The engine consumes plain `f64` vectors and weights and produces plain
//! numeric summaries; serialization, transport, and rendering are the
//! caller's concern.

#![forbid(unsafe_code)]

pub mod error;
pub mod mixture;
pub mod stats;

pub use error::{Error, Result};
pub use mixture::{
    Clustering, GaussianMixtureModel, Gmm, Mixture, MixtureEstimate, MixtureParams, SoftClustering,
};
pub use stats::SufficientStatistics;
