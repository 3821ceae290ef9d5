use crate::error::Result;

/// Common interface for hard clustering estimators (one label per point).
pub trait Clustering {
    /// Fit the model (if needed) and return one cluster label per input point.
    fn fit_predict(&self, data: &[Vec<f64>]) -> Result<Vec<usize>>;

    /// The configured number of clusters.
    fn n_clusters(&self) -> usize;
}

/// Soft clustering: one probability distribution over clusters per point.
pub trait SoftClustering {
    /// Fit the model (if needed) and return, for each input point, its
    /// responsibility for every cluster. Each row sums to 1.
    fn fit_predict_proba(&self, data: &[Vec<f64>]) -> Result<Vec<Vec<f64>>>;
}
