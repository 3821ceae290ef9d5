//! Shared numeric kernels for Gaussian density evaluation.

/// Cholesky factorization of a symmetric positive-definite matrix.
///
/// Returns the lower-triangular factor `L` (row-major packed, entry `(i, j)`
/// for `j <= i` at `i(i+1)/2 + j`) such that `L·Lᵀ` equals the input. Fails
/// with the row index of the first non-positive (or non-finite) pivot,
/// which happens iff the matrix is not positive-definite.
pub(crate) fn cholesky(matrix: &[Vec<f64>]) -> Result<Vec<f64>, usize> {
    let d = matrix.len();
    let mut lower = vec![0.0; d * (d + 1) / 2];

    for i in 0..d {
        let row_i = i * (i + 1) / 2;
        for j in 0..=i {
            let row_j = j * (j + 1) / 2;
            let mut sum = matrix[i][j];
            for k in 0..j {
                sum -= lower[row_i + k] * lower[row_j + k];
            }
            if i == j {
                if !(sum > 0.0) || !sum.is_finite() {
                    return Err(i);
                }
                lower[row_i + j] = sum.sqrt();
            } else {
                lower[row_i + j] = sum / lower[row_j + j];
            }
        }
    }

    Ok(lower)
}

/// Solve `L·z = b` in place by forward substitution, for a packed
/// lower-triangular `L` from [`cholesky`].
pub(crate) fn solve_lower(lower: &[f64], b: &mut [f64]) {
    for i in 0..b.len() {
        let row = i * (i + 1) / 2;
        let mut value = b[i];
        for k in 0..i {
            value -= lower[row + k] * b[k];
        }
        b[i] = value / lower[row + i];
    }
}

/// Log of the multivariate normal density `N(x; mean, L·Lᵀ)`.
///
/// `(x − mean)ᵀ Σ⁻¹ (x − mean)` is computed as `‖z‖²` with `L·z = x − mean`,
/// so the covariance is never inverted explicitly.
pub(crate) fn log_density(lower: &[f64], mean: &[f64], x: &[f64]) -> f64 {
    let d = mean.len();
    let mut z: Vec<f64> = (0..d).map(|i| x[i] - mean[i]).collect();
    solve_lower(lower, &mut z);

    let mahalanobis_sq: f64 = z.iter().map(|v| v * v).sum();
    let log_det_sqrt: f64 = (0..d).map(|i| lower[i * (i + 1) / 2 + i].ln()).sum();

    -0.5 * d as f64 * (2.0 * std::f64::consts::PI).ln() - log_det_sqrt - 0.5 * mahalanobis_sq
}

/// Dot product skipping non-finite components of `x`.
///
/// Used by the density-underflow fallback, which must stay defined even for
/// samples carrying missing values.
pub(crate) fn finite_dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .filter(|(a, _)| a.is_finite())
        .map(|(a, b)| a * b)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cholesky_identity() {
        let lower = cholesky(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        assert_eq!(lower, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_cholesky_known_factor() {
        // [[4, 2], [2, 3]] = L·Lᵀ with L = [[2, 0], [1, √2]].
        let lower = cholesky(&[vec![4.0, 2.0], vec![2.0, 3.0]]).unwrap();
        assert_relative_eq!(lower[0], 2.0, max_relative = 1e-12);
        assert_relative_eq!(lower[1], 1.0, max_relative = 1e-12);
        assert_relative_eq!(lower[2], 2.0f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn test_cholesky_rejects_non_positive_definite() {
        // Rank-deficient: second pivot is exactly zero.
        assert_eq!(cholesky(&[vec![1.0, 1.0], vec![1.0, 1.0]]), Err(1));
        // Not positive at all.
        assert_eq!(cholesky(&[vec![0.0, 0.0], vec![0.0, 0.0]]), Err(0));
        // Indefinite.
        assert_eq!(cholesky(&[vec![1.0, 2.0], vec![2.0, 1.0]]), Err(1));
    }

    #[test]
    fn test_solve_lower() {
        // L = [[2, 0], [1, √2]], b = L·[3, -1]ᵀ = [6, 3 - √2].
        let lower = vec![2.0, 1.0, 2.0f64.sqrt()];
        let mut b = vec![6.0, 3.0 - 2.0f64.sqrt()];
        solve_lower(&lower, &mut b);
        assert_relative_eq!(b[0], 3.0, max_relative = 1e-12);
        assert_relative_eq!(b[1], -1.0, max_relative = 1e-12);
    }

    #[test]
    fn test_log_density_standard_normal() {
        let lower = cholesky(&[vec![1.0]]).unwrap();
        let at_zero = log_density(&lower, &[0.0], &[0.0]);
        assert_relative_eq!(
            at_zero.exp(),
            1.0 / (2.0 * std::f64::consts::PI).sqrt(),
            max_relative = 1e-12
        );
        // One standard deviation out: density scales by exp(-1/2).
        let at_one = log_density(&lower, &[0.0], &[1.0]);
        assert_relative_eq!(at_one - at_zero, -0.5, max_relative = 1e-12);
    }

    #[test]
    fn test_finite_dot_skips_nan() {
        let dot = finite_dot(&[1.0, f64::NAN, 3.0], &[2.0, 5.0, 4.0]);
        assert_eq!(dot, 14.0);
    }
}
