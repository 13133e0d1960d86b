//! Entropy-weighted TOPSIS.
//!
//! Technique for Order Preference by Similarity to an Ideal Solution.
//!
//! # Algorithm
//!
//! 1. Standardise every indicator into `[0, 1]`, larger is better:
//!    - `Benefit`: `(x − min)/(max − min)`
//!    - `Cost`: `(max − x)/(max − min)`
//!    - `Nominal { best }`: `1 − |x − best|/M`, `M = max(max − best, best − min)`
//!    - `Interval { low, high }`: 1 inside, `1 − (low − x)/M` below,
//!      `1 − (x − high)/M` above, `M = max(low − min, max − high)`
//! 2. Entropy weights with `p = x/(Σx + ε)`, `e = −Σ p ln(p + ε)/ln n`.
//! 3. Weighted matrix `vᵢⱼ = wⱼ xᵢⱼ`; ideal best/worst are the column
//!    max/min.
//! 4. `score = D⁻/(D⁺ + D⁻ + ε)` with Euclidean distances to the ideals.
//!
//! # Examples
//! ```
//! use nalgebra::DMatrix;
//! use u_modelkit::evaluation::topsis::{IndicatorKind, Topsis};
//!
//! // profit (benefit), cost, temperature (best 36.5)
//! let data = DMatrix::from_row_slice(3, 3, &[
//!     10.0, 5.0, 36.0,
//!     20.0, 3.0, 36.5,
//!     15.0, 4.0, 39.0,
//! ]);
//! let model = Topsis::new(vec![
//!     IndicatorKind::Benefit,
//!     IndicatorKind::Cost,
//!     IndicatorKind::Nominal { best: 36.5 },
//! ])
//! .unwrap();
//! let r = model.evaluate(&data).unwrap();
//! assert_eq!(r.ranking[0], 1);
//! ```

use nalgebra::{DMatrix, DVector};

use super::{check_decision_matrix, rank_descending};
use crate::error::{ModelError, Result};

const EPS: f64 = f64::EPSILON;

/// How an indicator's raw values map onto "larger is better".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorKind {
    Benefit,
    Cost,
    /// Values closest to `best` are preferred.
    Nominal { best: f64 },
    /// Values inside `[low, high]` are preferred.
    Interval { low: f64, high: f64 },
}

impl IndicatorKind {
    fn standardize(self, x: f64, min: f64, max: f64) -> f64 {
        match self {
            IndicatorKind::Benefit | IndicatorKind::Cost if max == min => 0.0,
            IndicatorKind::Benefit => (x - min) / (max - min),
            IndicatorKind::Cost => (max - x) / (max - min),
            IndicatorKind::Nominal { best } => {
                let m = (max - best).max(best - min);
                if m == 0.0 {
                    1.0
                } else {
                    1.0 - (x - best).abs() / m
                }
            }
            IndicatorKind::Interval { low, high } => {
                let m = (low - min).max(max - high);
                if m == 0.0 {
                    1.0
                } else if x < low {
                    1.0 - (low - x) / m
                } else if x > high {
                    1.0 - (x - high) / m
                } else {
                    1.0
                }
            }
        }
    }
}

/// TOPSIS outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct TopsisResult {
    pub weights: DVector<f64>,
    /// Relative closeness to the ideal solution, one per alternative.
    pub scores: DVector<f64>,
    /// Alternative indices by descending score.
    pub ranking: Vec<usize>,
}

/// A TOPSIS model: one [`IndicatorKind`] per decision-matrix column.
#[derive(Debug, Clone, PartialEq)]
pub struct Topsis {
    kinds: Vec<IndicatorKind>,
}

impl Topsis {
    /// # Errors
    /// `EmptyInput` without indicators, `InvalidParameter` for an interval
    /// with `low > high` or non-finite bounds.
    pub fn new(kinds: Vec<IndicatorKind>) -> Result<Self> {
        if kinds.is_empty() {
            return Err(ModelError::EmptyInput("indicator kinds"));
        }
        for kind in &kinds {
            match *kind {
                IndicatorKind::Interval { low, high } if !low.is_finite() || !high.is_finite() => {
                    return Err(ModelError::invalid(
                        "interval",
                        format!("bounds must be finite, got [{low}, {high}]"),
                    ));
                }
                IndicatorKind::Interval { low, high } if low > high => {
                    return Err(ModelError::invalid(
                        "interval",
                        format!("lower bound {low} exceeds upper bound {high}"),
                    ));
                }
                IndicatorKind::Nominal { best } if !best.is_finite() => {
                    return Err(ModelError::invalid("best", "must be finite"));
                }
                _ => {}
            }
        }
        Ok(Self { kinds })
    }

    pub fn kinds(&self) -> &[IndicatorKind] {
        &self.kinds
    }

    /// Maps every column onto `[0, 1]`, larger is better.
    pub fn standardize(&self, data: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        check_decision_matrix(data, self.kinds.len())?;
        let mut out = data.clone();
        for (j, kind) in self.kinds.iter().enumerate() {
            let col = data.column(j);
            let (min, max) = (col.min(), col.max());
            for i in 0..data.nrows() {
                out[(i, j)] = kind.standardize(data[(i, j)], min, max);
            }
        }
        Ok(out)
    }

    /// Standardises, weighs by entropy and scores the alternatives.
    pub fn evaluate(&self, data: &DMatrix<f64>) -> Result<TopsisResult> {
        let standardized = self.standardize(data)?;
        let weights = standardized_entropy_weights(&standardized)?;
        let scores = topsis_with_weights(&standardized, &weights)?;
        let ranking = rank_descending(scores.as_slice());
        tracing::debug!(
            alternatives = data.nrows(),
            best = ranking[0],
            "TOPSIS evaluated"
        );
        Ok(TopsisResult {
            weights,
            scores,
            ranking,
        })
    }
}

/// Entropy weights of a standardised TOPSIS matrix.
///
/// # Errors
/// `InsufficientData` with fewer than two alternatives.
pub fn standardized_entropy_weights(standardized: &DMatrix<f64>) -> Result<DVector<f64>> {
    check_decision_matrix(standardized, standardized.ncols())?;
    let n = standardized.nrows();
    if n < 2 {
        return Err(ModelError::insufficient("TOPSIS", 2, n));
    }
    let ln_n = (n as f64).ln();
    let g: Vec<f64> = standardized
        .column_iter()
        .map(|col| {
            let total = col.sum() + EPS;
            let e: f64 = -col
                .iter()
                .map(|x| {
                    let p = x / total;
                    p * (p + EPS).ln()
                })
                .sum::<f64>()
                / ln_n;
            1.0 - e
        })
        .collect();
    let m = g.len();
    let sum: f64 = g.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        tracing::warn!(indicators = m, "degenerate entropy; using equal weights");
        return Ok(DVector::from_element(m, 1.0 / m as f64));
    }
    Ok(DVector::from_iterator(m, g.into_iter().map(|v| v / sum)))
}

/// TOPSIS closeness scores of a standardised matrix under given weights.
///
/// # Errors
/// `DimensionMismatch` when the weight count differs from the column
/// count, `InvalidParameter` for a negative or non-finite weight.
pub fn topsis_with_weights(
    standardized: &DMatrix<f64>,
    weights: &DVector<f64>,
) -> Result<DVector<f64>> {
    check_decision_matrix(standardized, weights.len())?;
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(ModelError::invalid(
            "weights",
            format!("must be finite and non-negative, got {w}"),
        ));
    }
    let mut weighted = standardized.clone();
    for (j, w) in weights.iter().enumerate() {
        weighted.column_mut(j).scale_mut(*w);
    }
    let best: Vec<f64> = weighted.column_iter().map(|c| c.max()).collect();
    let worst: Vec<f64> = weighted.column_iter().map(|c| c.min()).collect();
    let scores = weighted.row_iter().map(|row| {
        let (mut d_best, mut d_worst) = (0.0_f64, 0.0_f64);
        for (j, v) in row.iter().enumerate() {
            d_best += (v - best[j]).powi(2);
            d_worst += (v - worst[j]).powi(2);
        }
        let (d_best, d_worst) = (d_best.sqrt(), d_worst.sqrt());
        d_worst / (d_best + d_worst + EPS)
    });
    Ok(DVector::from_iterator(standardized.nrows(), scores))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardize_kinds() {
        let data = DMatrix::from_row_slice(3, 4, &[
            1.0, 1.0, 30.0, 35.0, //
            2.0, 2.0, 36.0, 36.5, //
            3.0, 3.0, 40.0, 39.0,
        ]);
        let model = Topsis::new(vec![
            IndicatorKind::Benefit,
            IndicatorKind::Cost,
            IndicatorKind::Nominal { best: 36.0 },
            IndicatorKind::Interval { low: 36.0, high: 37.0 },
        ])
        .unwrap();
        let s = model.standardize(&data).unwrap();
        assert_eq!(s.column(0).as_slice(), &[0.0, 0.5, 1.0]);
        assert_eq!(s.column(1).as_slice(), &[1.0, 0.5, 0.0]);
        // M = max(40 − 36, 36 − 30) = 6
        assert!((s[(0, 2)] - 0.0).abs() < 1e-12);
        assert_eq!(s[(1, 2)], 1.0);
        assert!((s[(2, 2)] - (1.0 - 4.0 / 6.0)).abs() < 1e-12);
        // M = max(36 − 35, 39 − 37) = 2
        assert!((s[(0, 3)] - 0.5).abs() < 1e-12);
        assert_eq!(s[(1, 3)], 1.0);
        assert!((s[(2, 3)] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_columns() {
        let data = DMatrix::from_row_slice(2, 3, &[5.0, 7.0, 1.0, 5.0, 7.0, 1.0]);
        let model = Topsis::new(vec![
            IndicatorKind::Benefit,
            IndicatorKind::Nominal { best: 7.0 },
            IndicatorKind::Interval { low: 1.0, high: 1.0 },
        ])
        .unwrap();
        let s = model.standardize(&data).unwrap();
        assert_eq!(s.row(0).iter().copied().collect::<Vec<_>>(), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_interval_bounds_validated() {
        assert!(Topsis::new(vec![IndicatorKind::Interval { low: 2.0, high: 1.0 }]).is_err());
        assert!(Topsis::new(vec![]).is_err());
        for (low, high) in [(f64::NEG_INFINITY, 1.0), (0.0, f64::INFINITY), (f64::NAN, 1.0)] {
            assert!(matches!(
                Topsis::new(vec![IndicatorKind::Interval { low, high }]),
                Err(ModelError::InvalidParameter { name: "interval", .. })
            ));
        }
    }

    #[test]
    fn test_dominant_alternative_scores_one() {
        let data = DMatrix::from_row_slice(3, 2, &[1.0, 9.0, 5.0, 5.0, 9.0, 1.0]);
        let model = Topsis::new(vec![IndicatorKind::Benefit, IndicatorKind::Cost]).unwrap();
        let r = model.evaluate(&data).unwrap();
        assert!((r.scores[2] - 1.0).abs() < 1e-9);
        assert!(r.scores[0].abs() < 1e-9);
        assert_eq!(r.ranking, vec![2, 1, 0]);
        assert!((r.weights.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_external_weights() {
        let s = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let favour_first = DVector::from_vec(vec![0.9, 0.1]);
        let scores = topsis_with_weights(&s, &favour_first).unwrap();
        assert!(scores[0] > scores[1]);
        assert!(topsis_with_weights(&s, &DVector::from_vec(vec![1.0])).is_err());
    }

    #[test]
    fn test_external_weights_validated() {
        let s = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        for bad in [vec![-0.1, 1.1], vec![f64::INFINITY, 0.0], vec![f64::NAN, 0.5]] {
            assert!(matches!(
                topsis_with_weights(&s, &DVector::from_vec(bad)),
                Err(ModelError::InvalidParameter { name: "weights", .. })
            ));
        }
    }

    #[test]
    fn test_single_alternative_rejected() {
        let data = DMatrix::from_row_slice(1, 1, &[3.0]);
        let model = Topsis::new(vec![IndicatorKind::Benefit]).unwrap();
        assert!(matches!(
            model.evaluate(&data),
            Err(ModelError::InsufficientData { .. })
        ));
    }
}
