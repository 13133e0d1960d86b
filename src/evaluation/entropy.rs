//! Entropy weight method.
//!
//! # Algorithm
//!
//! 1. Min–max normalise each indicator column towards "larger is better"
//!    (`Cost` columns are flipped). A constant column carries no
//!    information and normalises to 0.5.
//! 2. `pᵢⱼ = (xᵢⱼ + ε) / Σᵢ (xᵢⱼ + ε)`
//! 3. `eⱼ = −Σᵢ pᵢⱼ ln pᵢⱼ / ln n`, divergence `gⱼ = 1 − eⱼ`
//! 4. `wⱼ = gⱼ / Σ g`, score of alternative `i` is `Σⱼ wⱼ xᵢⱼ`.
//!
//! Columns that vary more get larger weights.
//!
//! # Examples
//! ```
//! use nalgebra::DMatrix;
//! use u_modelkit::evaluation::entropy::entropy_scores;
//! use u_modelkit::evaluation::Direction;
//!
//! let data = DMatrix::from_row_slice(3, 2, &[1.0, 5.0, 2.0, 5.0, 3.0, 5.0]);
//! let r = entropy_scores(&data, &[Direction::Benefit, Direction::Benefit]).unwrap();
//! // the constant second column gets no weight
//! assert!(r.weights[1].abs() < 1e-9);
//! assert!(r.scores[2] > r.scores[1] && r.scores[1] > r.scores[0]);
//! ```

use nalgebra::{DMatrix, DVector};

use super::{check_decision_matrix, Direction};
use crate::error::{ModelError, Result};

/// Offset added before taking logarithms.
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Weights and composite scores of the entropy weight method.
#[derive(Debug, Clone, PartialEq)]
pub struct EntropyResult {
    /// One weight per indicator, summing to 1.
    pub weights: DVector<f64>,
    /// One score per alternative in `[0, 1]`.
    pub scores: DVector<f64>,
}

/// Per-column min–max normalisation into `[0, 1]`.
pub fn normalize_min_max(data: &DMatrix<f64>, directions: &[Direction]) -> Result<DMatrix<f64>> {
    check_decision_matrix(data, directions.len())?;
    let mut out = data.clone();
    for (j, dir) in directions.iter().enumerate() {
        let col = data.column(j);
        let (lo, hi) = (col.min(), col.max());
        let range = hi - lo;
        for i in 0..data.nrows() {
            let x = data[(i, j)];
            out[(i, j)] = if range == 0.0 {
                0.5
            } else {
                match dir {
                    Direction::Benefit => (x - lo) / range,
                    Direction::Cost => (hi - x) / range,
                }
            };
        }
    }
    Ok(out)
}

/// Entropy weights of a non-negative (normalised) matrix.
///
/// # Errors
/// `InsufficientData` for fewer than two alternatives, `InvalidParameter`
/// for negative entries or a negative `eps`.
pub fn entropy_weights(normalized: &DMatrix<f64>, eps: f64) -> Result<DVector<f64>> {
    check_decision_matrix(normalized, normalized.ncols())?;
    let n = normalized.nrows();
    if n < 2 {
        return Err(ModelError::insufficient("entropy weights", 2, n));
    }
    if eps.is_nan() || eps < 0.0 {
        return Err(ModelError::invalid("eps", format!("{eps} must be non-negative")));
    }
    if normalized.iter().any(|&x| x < 0.0) {
        return Err(ModelError::invalid("normalized", "entries must be non-negative"));
    }

    let ln_n = (n as f64).ln();
    let divergence: Vec<f64> = normalized
        .column_iter()
        .map(|col| {
            let total: f64 = col.iter().map(|x| x + eps).sum();
            if total == 0.0 {
                return 0.0;
            }
            let h: f64 = col
                .iter()
                .map(|x| {
                    let p = (x + eps) / total;
                    if p > 0.0 {
                        -p * p.ln()
                    } else {
                        0.0
                    }
                })
                .sum();
            (1.0 - h / ln_n).max(0.0)
        })
        .collect();

    let m = divergence.len();
    let sum: f64 = divergence.iter().sum();
    if sum <= 0.0 {
        tracing::warn!(indicators = m, "no indicator varies; using equal weights");
        return Ok(DVector::from_element(m, 1.0 / m as f64));
    }
    Ok(DVector::from_iterator(m, divergence.into_iter().map(|g| g / sum)))
}

/// Normalises, weighs and scores a decision matrix in one pass.
pub fn entropy_scores(data: &DMatrix<f64>, directions: &[Direction]) -> Result<EntropyResult> {
    let normalized = normalize_min_max(data, directions)?;
    let weights = entropy_weights(&normalized, DEFAULT_EPSILON)?;
    let scores = &normalized * &weights;
    tracing::debug!(
        alternatives = data.nrows(),
        indicators = data.ncols(),
        "entropy weights computed"
    );
    Ok(EntropyResult { weights, scores })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_directions() {
        let data = DMatrix::from_row_slice(3, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0]);
        let n = normalize_min_max(&data, &[Direction::Benefit, Direction::Cost]).unwrap();
        assert_eq!(n.column(0).as_slice(), &[0.0, 0.5, 1.0]);
        assert_eq!(n.column(1).as_slice(), &[1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_constant_column_is_half() {
        let data = DMatrix::from_row_slice(2, 1, &[4.0, 4.0]);
        let n = normalize_min_max(&data, &[Direction::Cost]).unwrap();
        assert_eq!(n.as_slice(), &[0.5, 0.5]);
    }

    #[test]
    fn test_identical_columns_share_weight() {
        let data = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let r = entropy_scores(&data, &[Direction::Benefit, Direction::Benefit]).unwrap();
        assert!((r.weights[0] - 0.5).abs() < 1e-12);
        assert!((r.weights[1] - 0.5).abs() < 1e-12);
        assert!((r.scores[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_more_dispersed_column_weighs_more() {
        // column 0 spreads evenly, column 1 is concentrated on one row
        let data = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 0.0, 2.0, 0.0, 3.0, 1.0]);
        let r = entropy_scores(&data, &[Direction::Benefit, Direction::Benefit]).unwrap();
        assert!(r.weights[1] > r.weights[0]);
    }

    #[test]
    fn test_all_constant_falls_back_to_equal() {
        let normalized = DMatrix::from_element(3, 4, 0.5);
        let w = entropy_weights(&normalized, DEFAULT_EPSILON).unwrap();
        assert!(w.iter().all(|&x| (x - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_validation() {
        let one_row = DMatrix::from_row_slice(1, 2, &[0.1, 0.2]);
        assert!(matches!(
            entropy_weights(&one_row, DEFAULT_EPSILON),
            Err(ModelError::InsufficientData { required: 2, got: 1, .. })
        ));
        let negative = DMatrix::from_row_slice(2, 1, &[-0.1, 0.2]);
        assert!(entropy_weights(&negative, DEFAULT_EPSILON).is_err());
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert!(entropy_scores(&data, &[Direction::Benefit]).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn weights_form_distribution(values in prop::collection::vec(-100.0_f64..100.0, 12)) {
            let data = DMatrix::from_row_slice(4, 3, &values);
            let dirs = [Direction::Benefit, Direction::Cost, Direction::Benefit];
            let r = entropy_scores(&data, &dirs).unwrap();
            prop_assert!((r.weights.sum() - 1.0).abs() < 1e-9);
            prop_assert!(r.weights.iter().all(|&w| w >= 0.0));
            prop_assert!(r.scores.iter().all(|&s| (-1e-12..=1.0 + 1e-12).contains(&s)));
        }
    }
}
