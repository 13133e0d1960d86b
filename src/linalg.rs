//! Small dense linear-algebra helpers on top of `nalgebra`.
//!
//! The modeling code only ever needs three things: an overdetermined
//! least-squares solve, the inverse of a normal matrix, and the dominant
//! eigenpair of a positive matrix.

use nalgebra::{DMatrix, DVector};

use crate::error::{ModelError, Result};

/// Solves `min ‖Xβ − y‖²` through the SVD of `X`.
///
/// Progressively looser singular-value cutoffs are tried; the first one
/// that yields a finite solution wins.
///
/// # Examples
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use u_modelkit::linalg::least_squares;
///
/// // y = 2 + 3x on x = 0, 1, 2
/// let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
/// let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
/// let beta = least_squares(&x, &y).unwrap();
/// assert!((beta[0] - 2.0).abs() < 1e-10);
/// assert!((beta[1] - 3.0).abs() < 1e-10);
/// ```
pub fn least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::EmptyInput("least squares design matrix"));
    }
    if x.nrows() != y.len() {
        return Err(ModelError::mismatch("least squares rows", x.nrows(), y.len()));
    }
    let svd = x.clone().svd(true, true);
    if svd.singular_values.iter().all(|&s| s <= 1e-12) {
        return Err(ModelError::Singular("design matrix has rank 0".into()));
    }
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Ok(beta);
            }
        }
    }
    Err(ModelError::Singular("least squares solve failed".into()))
}

/// Inverse of a square matrix.
pub fn invert(m: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    if !m.is_square() {
        return Err(ModelError::NotSquare {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    let inv = m.clone().try_inverse().ok_or_else(|| {
        ModelError::Singular(format!("{}x{} matrix is not invertible", m.nrows(), m.ncols()))
    })?;
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::Singular("inverse has non-finite entries".into()));
    }
    Ok(inv)
}

/// Dominant eigenvalue and eigenvector of a square positive matrix by
/// power iteration.
///
/// The eigenvector is normalised to sum to one. The eigenvalue is the mean
/// of the component ratios `(Av)ᵢ / vᵢ`, which matches the Rayleigh
/// estimate for positive reciprocal matrices.
///
/// # Errors
/// `NotSquare`, `EmptyInput`, `InvalidParameter` for a non-positive
/// entry, `NoConvergence` when the iterate still moves by more than `tol`
/// after `max_iter` steps.
pub fn principal_eigenpair(
    m: &DMatrix<f64>,
    tol: f64,
    max_iter: usize,
) -> Result<(f64, DVector<f64>)> {
    if !m.is_square() {
        return Err(ModelError::NotSquare {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    let n = m.nrows();
    if n == 0 {
        return Err(ModelError::EmptyInput("eigenpair matrix"));
    }
    if m.iter().any(|&v| !(v.is_finite() && v > 0.0)) {
        return Err(ModelError::invalid("matrix", "entries must be finite and positive"));
    }

    let mut v = DVector::from_element(n, 1.0 / n as f64);
    for iter in 1..=max_iter {
        let next = m * &v;
        let next = &next / next.sum();
        let delta = (&next - &v).amax();
        v = next;
        if delta < tol {
            let av = m * &v;
            let lambda = av.iter().zip(v.iter()).map(|(a, b)| a / b).sum::<f64>() / n as f64;
            tracing::debug!(iter, lambda, "power iteration converged");
            return Ok((lambda, v));
        }
    }
    Err(ModelError::NoConvergence {
        context: "power iteration",
        iterations: max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_least_squares_overdetermined() {
        // noisy-free plane z = 1 + 2a − b
        let rows = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0), (2.0, 3.0)];
        let mut data = Vec::new();
        let mut z = Vec::new();
        for &(a, b) in &rows {
            data.extend_from_slice(&[1.0, a, b]);
            z.push(1.0 + 2.0 * a - b);
        }
        let x = DMatrix::from_row_slice(rows.len(), 3, &data);
        let beta = least_squares(&x, &DVector::from_vec(z)).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-10);
        assert!((beta[1] - 2.0).abs() < 1e-10);
        assert!((beta[2] + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_least_squares_errors() {
        let x = DMatrix::<f64>::zeros(3, 2);
        let y = DVector::from_element(3, 1.0);
        assert!(matches!(least_squares(&x, &y), Err(ModelError::Singular(_))));
        let y2 = DVector::from_element(2, 1.0);
        assert!(matches!(
            least_squares(&DMatrix::from_element(3, 1, 1.0), &y2),
            Err(ModelError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_invert() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        let inv = invert(&m).unwrap();
        let id = &m * &inv;
        assert!((id - DMatrix::identity(2, 2)).amax() < 1e-12);

        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert!(matches!(invert(&singular), Err(ModelError::Singular(_))));
        assert!(matches!(
            invert(&DMatrix::zeros(2, 3)),
            Err(ModelError::NotSquare { rows: 2, cols: 3 })
        ));
    }

    #[test]
    fn test_eigenpair_consistent_matrix() {
        // perfectly consistent: a_ij = w_i / w_j with w = (4, 2, 1)
        let w = [4.0, 2.0, 1.0];
        let m = DMatrix::from_fn(3, 3, |i, j| w[i] / w[j]);
        let (lambda, v) = principal_eigenpair(&m, 1e-12, 1000).unwrap();
        assert!((lambda - 3.0).abs() < 1e-9);
        for (i, &wi) in w.iter().enumerate() {
            assert!((v[i] - wi / 7.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_eigenpair_rejects_non_positive() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 1.0]);
        assert!(principal_eigenpair(&m, 1e-10, 100).is_err());
    }
}
