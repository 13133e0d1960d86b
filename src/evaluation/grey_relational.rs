//! Grey relational analysis.
//!
//! Compares every alternative with an ideal reference alternative built
//! from the best value of each indicator.
//!
//! # Algorithm
//!
//! 1. Missing values (NaN) are replaced by their column mean.
//! 2. Reference `refⱼ`: column max for `Benefit`, min for `Cost`.
//! 3. Scale by the reference (`sⱼ = refⱼ`, or the column mean when
//!    `refⱼ = 0`): `Δᵢⱼ = |xᵢⱼ − refⱼ| / sⱼ`.
//! 4. `ξᵢⱼ = (Δmin + ρΔmax)/(Δᵢⱼ + ρΔmax)` over the global extremes.
//! 5. Relational degree of alternative `i`: row mean of `ξ`.
//!
//! The column means of `ξ` measure how closely each indicator tracks the
//! ideal; their shares give a rough indicator importance.
//!
//! Reference: Deng (1982), *Control problems of grey systems*.

use nalgebra::{DMatrix, DVector};

use super::{rank_descending, Direction};
use crate::error::{ModelError, Result};

/// Conventional distinguishing coefficient.
pub const DEFAULT_RHO: f64 = 0.5;

/// Outcome of a grey relational analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct GreyRelationalResult {
    /// Ideal value per indicator.
    pub reference: DVector<f64>,
    /// Relational coefficients ξ, alternatives × indicators.
    pub coefficients: DMatrix<f64>,
    /// Relational degree per alternative.
    pub degrees: DVector<f64>,
    /// Alternatives by descending degree.
    pub ranking: Vec<usize>,
    /// Mean coefficient per indicator.
    pub indicator_means: DVector<f64>,
    /// Share of each indicator mean in their total, in percent.
    pub indicator_shares: DVector<f64>,
    /// Indicators by descending mean coefficient.
    pub indicator_priority: Vec<usize>,
}

/// Runs grey relational analysis on an alternatives × indicators matrix.
///
/// # Errors
/// `EmptyInput`, `DimensionMismatch` when `directions` does not match the
/// column count, `InvalidParameter` for `ρ ∉ (0, 1]`, infinite entries or
/// an all-missing column.
///
/// # Examples
/// ```
/// use nalgebra::DMatrix;
/// use u_modelkit::evaluation::grey_relational::{grey_relational, DEFAULT_RHO};
/// use u_modelkit::evaluation::Direction;
///
/// let data = DMatrix::from_row_slice(3, 2, &[
///     90.0, 30.0,
///     70.0, 20.0,
///     80.0, f64::NAN,
/// ]);
/// let r = grey_relational(&data, &[Direction::Benefit, Direction::Cost], DEFAULT_RHO).unwrap();
/// assert_eq!(r.reference.as_slice(), &[90.0, 20.0]);
/// assert!((r.indicator_shares.sum() - 100.0).abs() < 1e-9);
/// ```
pub fn grey_relational(
    data: &DMatrix<f64>,
    directions: &[Direction],
    rho: f64,
) -> Result<GreyRelationalResult> {
    if data.is_empty() {
        return Err(ModelError::EmptyInput("decision matrix"));
    }
    if data.ncols() != directions.len() {
        return Err(ModelError::mismatch("indicators", directions.len(), data.ncols()));
    }
    if !(rho > 0.0 && rho <= 1.0) {
        return Err(ModelError::invalid("rho", format!("{rho} is not in (0, 1]")));
    }
    if data.iter().any(|x| x.is_infinite()) {
        return Err(ModelError::invalid("decision matrix", "contains infinite values"));
    }

    let (n, m) = data.shape();
    let filled = fill_missing(data)?;

    let mut reference = DVector::zeros(m);
    let mut delta = DMatrix::zeros(n, m);
    for j in 0..m {
        let col = filled.column(j);
        let r = match directions[j] {
            Direction::Benefit => col.max(),
            Direction::Cost => col.min(),
        };
        reference[j] = r;
        let scale = if r == 0.0 { col.mean() } else { r };
        for i in 0..n {
            delta[(i, j)] = if scale == 0.0 {
                0.0
            } else {
                ((filled[(i, j)] - r) / scale).abs()
            };
        }
    }

    let (d_min, d_max) = (delta.min(), delta.max());
    let coefficients = if d_max == 0.0 {
        DMatrix::from_element(n, m, 1.0)
    } else {
        delta.map(|d| (d_min + rho * d_max) / (d + rho * d_max))
    };

    let degrees = DVector::from_iterator(n, coefficients.row_iter().map(|r| r.mean()));
    let ranking = rank_descending(degrees.as_slice());
    let indicator_means =
        DVector::from_iterator(m, coefficients.column_iter().map(|c| c.mean()));
    let total = indicator_means.sum();
    let indicator_shares = indicator_means.map(|v| v / total * 100.0);
    let indicator_priority = rank_descending(indicator_means.as_slice());

    tracing::debug!(
        alternatives = n,
        indicators = m,
        rho,
        delta_max = d_max,
        "grey relational analysis finished"
    );
    Ok(GreyRelationalResult {
        reference,
        coefficients,
        degrees,
        ranking,
        indicator_means,
        indicator_shares,
        indicator_priority,
    })
}

fn fill_missing(data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let mut filled = data.clone();
    for j in 0..data.ncols() {
        let present: Vec<f64> = data.column(j).iter().copied().filter(|x| !x.is_nan()).collect();
        if present.is_empty() {
            return Err(ModelError::invalid(
                "decision matrix",
                format!("indicator {j} has no observed values"),
            ));
        }
        if present.len() < data.nrows() {
            let mean = present.iter().sum::<f64>() / present.len() as f64;
            tracing::debug!(
                indicator = j,
                missing = data.nrows() - present.len(),
                "filled with column mean"
            );
            for x in filled.column_mut(j).iter_mut().filter(|x| x.is_nan()) {
                *x = mean;
            }
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_computed() {
        // reference (4, 1); Δ = |x − ref|/ref
        // row 0: (0, 1), row 1: (0.5, 0)
        let data = DMatrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 1.0]);
        let r = grey_relational(&data, &[Direction::Benefit, Direction::Cost], 0.5).unwrap();
        // ξ = (0 + 0.5)/(Δ + 0.5)
        assert!((r.coefficients[(0, 0)] - 1.0).abs() < 1e-12);
        assert!((r.coefficients[(0, 1)] - 1.0 / 3.0).abs() < 1e-12);
        assert!((r.coefficients[(1, 0)] - 0.5).abs() < 1e-12);
        assert!((r.coefficients[(1, 1)] - 1.0).abs() < 1e-12);
        assert!((r.degrees[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((r.degrees[1] - 0.75).abs() < 1e-12);
        assert_eq!(r.ranking, vec![1, 0]);
        assert_eq!(r.indicator_priority, vec![0, 1]);
    }

    #[test]
    fn test_missing_values_use_column_mean() {
        let with_nan = DMatrix::from_row_slice(3, 1, &[1.0, f64::NAN, 3.0]);
        let filled = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let a = grey_relational(&with_nan, &[Direction::Benefit], 0.5).unwrap();
        let b = grey_relational(&filled, &[Direction::Benefit], 0.5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_alternatives() {
        let data = DMatrix::from_element(3, 2, 7.0);
        let r = grey_relational(&data, &[Direction::Benefit, Direction::Cost], 0.5).unwrap();
        assert!(r.coefficients.iter().all(|&c| c == 1.0));
        assert!((r.indicator_shares[0] - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_reference_scaled_by_mean() {
        // cost reference 0, scaled by mean 2
        let data = DMatrix::from_row_slice(3, 1, &[0.0, 2.0, 4.0]);
        let r = grey_relational(&data, &[Direction::Cost], 0.5).unwrap();
        assert_eq!(r.reference[0], 0.0);
        assert!(r.degrees.iter().all(|d| d.is_finite()));
        assert_eq!(r.ranking, vec![0, 1, 2]);
    }

    #[test]
    fn test_validation() {
        let data = DMatrix::from_row_slice(2, 1, &[1.0, 2.0]);
        assert!(grey_relational(&data, &[Direction::Benefit], 0.0).is_err());
        assert!(grey_relational(&data, &[Direction::Benefit], 1.5).is_err());
        assert!(grey_relational(&data, &[], 0.5).is_err());
        let all_missing = DMatrix::from_row_slice(2, 1, &[f64::NAN, f64::NAN]);
        assert!(grey_relational(&all_missing, &[Direction::Benefit], 0.5).is_err());
    }
}
