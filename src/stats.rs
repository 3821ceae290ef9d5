//! Online, mergeable multivariate sufficient statistics.
//!
//! [`SufficientStatistics`] accumulates the weighted sums and co-moments
//! needed to derive a sample mean vector and a full sample covariance matrix
//! for `d` dimensions, without revisiting raw samples.
//!
//! # Algorithm
//!
//! Incremental updates use a weighted, multivariate generalization of
//! Welford's online variance algorithm (Welford 1962; weighted form per
//! West 1979). For each dimension pair the co-moment is corrected against
//! one post-update mean and one pre-update mean:
//!
//! ```text
//! M_ii += w · (x_i − mean_i') · (x_i − mean_i)     (mean_i' includes x, mean_i does not)
//! M_ij += w · (x_i − mean_i') · (x_j − mean_j)     (j's mean must not yet include x)
//! ```
//!
//! This is numerically comparable to a two-pass computation even for large
//! sample counts, avoiding the catastrophic cancellation of the naive
//! `E[XY] − E[X]E[Y]` formula.
//!
//! Two independently accumulated instances merge with the pairwise
//! combination identity of Chan, Golub & LeVeque (1979):
//!
//! ```text
//! M_ij = M_ij(A) + M_ij(B) + Δmean_i · Δmean_j · w_A·w_B / (w_A + w_B)
//! ```
//!
//! The merge is commutative and associative, so statistics built over
//! disjoint partitions of a dataset (e.g. on separate threads) combine in
//! any order to the same result, up to floating-point rounding.
//!
//! # Missing values
//!
//! Non-finite sample components (`NaN`, `±inf`) are not errors: they are
//! excluded, per dimension, from every sum and moment they would have
//! touched. A sample that is finite in dimension `i` but not in `j` still
//! contributes fully to `i`'s statistics and to every pair not involving
//! `j`. The pairwise weight totals therefore may differ from the diagonal
//! ones, which is why weights are tracked per pair.
//!
//! # Storage
//!
//! The pairwise arrays are packed upper triangles of a `d×d` matrix, stored
//! flat with `(i, j)` for `i ≤ j` at `diag(i, d) + (j − i)` where
//! `diag(i, d) = i·(2d − i + 1)/2` is the offset of row `i`'s diagonal
//! entry. `d` is expected to be small (tens, not thousands).

use crate::error::{Error, Result};

/// Online accumulator for weighted mean and covariance in `d` dimensions.
///
/// All four internal arrays stay mutually consistent only through the
/// defined update operations; there is no way to mutate them independently.
///
/// ```rust
/// use gmix::SufficientStatistics;
///
/// let mut stats = SufficientStatistics::new(2);
/// for p in [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]] {
///     stats.add_sample(&p).unwrap();
/// }
/// assert_eq!(stats.mean(), vec![1.0, 1.0]);
/// let cov = stats.covariance();
/// assert!((cov[0][0] - 4.0 / 3.0).abs() < 1e-12);
/// assert_eq!(cov[0][1], 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct SufficientStatistics {
    /// Dimensionality, fixed at construction.
    d: usize,
    /// Σ w·x per dimension, over samples finite in that dimension.
    sums: Vec<f64>,
    /// Σ w per dimension pair, over samples finite in both dimensions.
    weight_sums: Vec<f64>,
    /// Σ w² per dimension pair. Auxiliary bookkeeping only; not needed for
    /// mean/covariance but kept for potential higher-order merges.
    squared_weight_sums: Vec<f64>,
    /// Diagonal: weighted sum of squared deviations. Off-diagonal: co-moment.
    moments: Vec<f64>,
}

/// Flat offset of row `i`'s diagonal entry in a packed `d×d` upper triangle.
#[inline]
fn diag(i: usize, d: usize) -> usize {
    i * (2 * d - i + 1) / 2
}

/// Length of a packed `d×d` upper triangle.
#[inline]
fn packed_len(d: usize) -> usize {
    d * (d + 1) / 2
}

impl SufficientStatistics {
    /// Create an empty accumulator for `d`-dimensional samples.
    pub fn new(d: usize) -> Self {
        Self {
            d,
            sums: vec![0.0; d],
            weight_sums: vec![0.0; packed_len(d)],
            squared_weight_sums: vec![0.0; packed_len(d)],
            moments: vec![0.0; packed_len(d)],
        }
    }

    /// Forget everything accumulated so far, keeping the dimensionality.
    pub fn reset(&mut self) {
        self.sums.fill(0.0);
        self.weight_sums.fill(0.0);
        self.squared_weight_sums.fill(0.0);
        self.moments.fill(0.0);
    }

    /// The dimensionality this accumulator was constructed with.
    pub fn dimensions(&self) -> usize {
        self.d
    }

    /// Total accumulated weight for dimension `dim`.
    ///
    /// # Panics
    ///
    /// Panics if `dim >= d`.
    pub fn weight(&self, dim: usize) -> f64 {
        self.weight_sums[diag(dim, self.d)]
    }

    /// Flat index of pair `(i, j)`, requiring `i <= j < d`.
    #[inline]
    fn at(&self, i: usize, j: usize) -> usize {
        debug_assert!(i <= j && j < self.d);
        diag(i, self.d) + (j - i)
    }

    /// Current mean of dimension `i`, 0 if it has no weight yet.
    #[inline]
    fn mean_of(&self, i: usize) -> f64 {
        let w = self.weight_sums[diag(i, self.d)];
        if w > 0.0 {
            self.sums[i] / w
        } else {
            0.0
        }
    }

    /// Accumulate one sample with weight 1.
    pub fn add_sample(&mut self, x: &[f64]) -> Result<()> {
        self.add_weighted_sample(x, 1.0)
    }

    /// Accumulate one weighted sample.
    ///
    /// Non-finite components of `x` are skipped: they leave every sum and
    /// moment involving their dimension untouched, and do not disturb the
    /// other dimensions. A weight of 0 leaves the accumulator untouched
    /// entirely.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if `x.len() != d`.
    pub fn add_weighted_sample(&mut self, x: &[f64], w: f64) -> Result<()> {
        if x.len() != self.d {
            return Err(Error::DimensionMismatch {
                expected: self.d,
                found: x.len(),
            });
        }
        // A zero weight contributes nothing, and running it through the
        // update would divide 0/0 on a still-empty dimension.
        if w == 0.0 {
            return Ok(());
        }

        for i in 0..self.d {
            if !x[i].is_finite() {
                continue;
            }

            let di = diag(i, self.d);
            let old_mean_i = self.mean_of(i);

            self.sums[i] += w * x[i];
            self.weight_sums[di] += w;
            self.squared_weight_sums[di] += w * w;
            let new_mean_i = self.sums[i] / self.weight_sums[di];

            self.moments[di] += w * (x[i] - new_mean_i) * (x[i] - old_mean_i);

            // Update order matters: dimension i's mean now includes this
            // sample, dimension j's must not yet (the outer loop has not
            // reached j).
            for j in (i + 1)..self.d {
                if !x[j].is_finite() {
                    continue;
                }
                let ij = di + (j - i);
                let old_mean_j = self.mean_of(j);
                self.moments[ij] += w * (x[i] - new_mean_i) * (x[j] - old_mean_j);
                self.weight_sums[ij] += w;
                self.squared_weight_sums[ij] += w * w;
            }
        }

        Ok(())
    }

    /// Accumulate a whole batch of unweighted samples, presented as `d`
    /// column vectors.
    pub fn add_samples(&mut self, columns: &[Vec<f64>]) -> Result<()> {
        let n = columns.first().map_or(0, Vec::len);
        self.add_weighted_samples(columns, &vec![1.0; n])
    }

    /// Accumulate a whole batch of weighted samples, presented as `d`
    /// column vectors plus one weight per row.
    ///
    /// Per dimension pair, the weighted mean and the weighted co-moment are
    /// computed directly over the batch (a two-pass computation), skipping
    /// any row where either operand is non-finite, and the resulting packed
    /// statistics are folded into `self` via [`add_statistics`].
    ///
    /// For all-finite data this matches accumulating the rows one at a
    /// time. When rows carry missing values, each co-moment here is
    /// centered on its pair's own means, while the incremental path centers
    /// on the per-dimension running means, so the off-diagonal results can
    /// differ; the per-dimension statistics always agree.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if `columns.len() != d`, if the columns
    /// have unequal lengths, or if `weights.len()` differs from the row
    /// count.
    ///
    /// [`add_statistics`]: SufficientStatistics::add_statistics
    pub fn add_weighted_samples(&mut self, columns: &[Vec<f64>], weights: &[f64]) -> Result<()> {
        if columns.len() != self.d {
            return Err(Error::DimensionMismatch {
                expected: self.d,
                found: columns.len(),
            });
        }

        let n = columns.first().map_or(0, Vec::len);
        for col in columns {
            if col.len() != n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    found: col.len(),
                });
            }
        }
        if weights.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: weights.len(),
            });
        }

        let mut batch = Self::new(self.d);

        for i in 0..self.d {
            let xs = &columns[i];
            let di = diag(i, self.d);

            let mut weight_total = 0.0;
            let mut weighted_sum = 0.0;
            let mut squared_weight_total = 0.0;
            for t in 0..n {
                if xs[t].is_finite() {
                    weight_total += weights[t];
                    weighted_sum += weights[t] * xs[t];
                    squared_weight_total += weights[t] * weights[t];
                }
            }
            batch.sums[i] = weighted_sum;
            batch.weight_sums[di] = weight_total;
            batch.squared_weight_sums[di] = squared_weight_total;

            let mean_i = if weight_total > 0.0 {
                weighted_sum / weight_total
            } else {
                0.0
            };
            let mut moment = 0.0;
            for t in 0..n {
                if xs[t].is_finite() {
                    let dev = xs[t] - mean_i;
                    moment += weights[t] * dev * dev;
                }
            }
            batch.moments[di] = moment;

            for j in (i + 1)..self.d {
                let ys = &columns[j];
                let ij = di + (j - i);

                let mut weight_total = 0.0;
                let mut sum_x = 0.0;
                let mut sum_y = 0.0;
                let mut squared_weight_total = 0.0;
                for t in 0..n {
                    if xs[t].is_finite() && ys[t].is_finite() {
                        weight_total += weights[t];
                        sum_x += weights[t] * xs[t];
                        sum_y += weights[t] * ys[t];
                        squared_weight_total += weights[t] * weights[t];
                    }
                }

                let (mean_x, mean_y) = if weight_total > 0.0 {
                    (sum_x / weight_total, sum_y / weight_total)
                } else {
                    (0.0, 0.0)
                };
                let mut moment = 0.0;
                for t in 0..n {
                    if xs[t].is_finite() && ys[t].is_finite() {
                        moment += weights[t] * (xs[t] - mean_x) * (ys[t] - mean_y);
                    }
                }

                batch.weight_sums[ij] = weight_total;
                batch.squared_weight_sums[ij] = squared_weight_total;
                batch.moments[ij] = moment;
            }
        }

        self.add_statistics(&batch)
    }

    /// Merge another accumulator into this one.
    ///
    /// Implements the parallel variance-combination identity of Chan et al.
    /// The operation is commutative and associative: statistics accumulated
    /// over disjoint partitions of a dataset can be combined in any order
    /// and match processing the union sequentially, up to floating-point
    /// rounding.
    ///
    /// # Errors
    ///
    /// [`Error::DimensionMismatch`] if the dimensionalities differ.
    pub fn add_statistics(&mut self, other: &SufficientStatistics) -> Result<()> {
        if self.d != other.d {
            return Err(Error::DimensionMismatch {
                expected: self.d,
                found: other.d,
            });
        }

        // All moment corrections are computed from pre-merge means, before
        // sums/weight_sums are touched.
        for i in 0..self.d {
            let delta_i = self.mean_of(i) - other.mean_of(i);
            for j in i..self.d {
                let ij = self.at(i, j);
                let wa = self.weight_sums[ij];
                let wb = other.weight_sums[ij];
                let correction = if wa + wb > 0.0 {
                    let delta_j = self.mean_of(j) - other.mean_of(j);
                    delta_i * delta_j * (wa * wb) / (wa + wb)
                } else {
                    0.0
                };
                self.moments[ij] += other.moments[ij] + correction;
            }
        }

        for i in 0..self.d {
            self.sums[i] += other.sums[i];
        }
        for ij in 0..packed_len(self.d) {
            self.weight_sums[ij] += other.weight_sums[ij];
            self.squared_weight_sums[ij] += other.squared_weight_sums[ij];
        }

        Ok(())
    }

    /// Per-dimension weighted mean. A dimension with zero accumulated
    /// weight reports 0.
    pub fn mean(&self) -> Vec<f64> {
        (0..self.d).map(|i| self.mean_of(i)).collect()
    }

    /// Bessel-corrected sample covariance matrix (symmetric, `d×d`).
    ///
    /// Each entry divides its co-moment by its pairwise weight minus one;
    /// entries whose pairwise weight is ≤ 1 report 0 rather than NaN.
    pub fn covariance(&self) -> Vec<Vec<f64>> {
        let mut cov = vec![vec![0.0; self.d]; self.d];
        for i in 0..self.d {
            for j in i..self.d {
                let ij = self.at(i, j);
                let w = self.weight_sums[ij];
                let value = if w > 1.0 {
                    self.moments[ij] / (w - 1.0)
                } else {
                    0.0
                };
                cov[i][j] = value;
                cov[j][i] = value;
            }
        }
        cov
    }
}
