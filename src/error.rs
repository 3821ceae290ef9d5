use thiserror::Error;

/// Errors returned by the statistics and mixture-model APIs in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Input slice is empty.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of items in the dataset.
        n_items: usize,
    },

    /// Vector or matrix dimensionality does not match what the receiver was
    /// constructed with.
    ///
    /// Raised for samples of the wrong length, batch columns/weights of
    /// inconsistent lengths, and for merging two [`SufficientStatistics`]
    /// of different dimensionality.
    ///
    /// [`SufficientStatistics`]: crate::stats::SufficientStatistics
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// Covariance matrix is not positive-definite, so no Gaussian density
    /// exists for it.
    ///
    /// `dimension` is the row at which the Cholesky factorization hit a
    /// non-positive (or non-finite) pivot.
    #[error("covariance matrix is not positive-definite (pivot failure at dimension {dimension})")]
    InvalidCovariance {
        /// Row index of the failing Cholesky pivot.
        dimension: usize,
    },

    /// Cluster-assignment query on a model that has neither completed a
    /// maximization step nor been rehydrated from stored mixtures.
    #[error("model has no mixture parameters yet (train and maximize first)")]
    NotInitialized,
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
