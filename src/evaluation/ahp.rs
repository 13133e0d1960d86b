//! Analytic Hierarchy Process.
//!
//! # Algorithm
//!
//! 1. Each pairwise comparison matrix `A` (positive, `aᵢⱼ·aⱼᵢ = 1`) yields
//!    local weights as its principal eigenvector, normalised to sum 1.
//! 2. Consistency: `CI = (λ_max − n)/(n − 1)`, `CR = CI/RI(n)` with Saaty's
//!    random index table. A matrix is acceptable when `CR < threshold`
//!    (conventionally 0.1).
//! 3. Overall score of alternative `a`: `Σ_c w_c · w_{a|c}`.
//!
//! Reference: Saaty (1980), *The Analytic Hierarchy Process*.
//!
//! # Examples
//! ```
//! use u_modelkit::evaluation::ahp::PairwiseMatrix;
//!
//! // criteria: cost vs quality vs service, upper triangle row by row
//! let m = PairwiseMatrix::from_upper(3, &[2.0, 5.0, 2.0]).unwrap();
//! let w = m.weights().unwrap();
//! assert!(w.is_consistent(0.1));
//! assert!((w.weights.sum() - 1.0).abs() < 1e-12);
//! assert!(w.weights[0] > w.weights[1] && w.weights[1] > w.weights[2]);
//! ```

use nalgebra::{DMatrix, DVector};

use super::rank_descending;
use crate::error::{ModelError, Result};
use crate::linalg::principal_eigenpair;

/// Saaty's random consistency index for matrix orders 1 through 13.
pub const RANDOM_INDEX: [f64; 13] = [
    0.0, 0.0, 0.58, 0.90, 1.12, 1.24, 1.32, 1.41, 1.45, 1.49, 1.51, 1.54, 1.56,
];

const RECIPROCAL_TOL: f64 = 1e-6;
const EIGEN_TOL: f64 = 1e-12;
const EIGEN_MAX_ITER: usize = 10_000;

/// A validated pairwise comparison matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseMatrix {
    matrix: DMatrix<f64>,
}

impl PairwiseMatrix {
    /// Validates a full comparison matrix.
    ///
    /// # Errors
    /// `NotSquare`, `EmptyInput`, `InvalidParameter` for non-positive
    /// entries or broken reciprocity, and orders above 13 (no random
    /// index is tabulated).
    pub fn new(matrix: DMatrix<f64>) -> Result<Self> {
        if !matrix.is_square() {
            return Err(ModelError::NotSquare {
                rows: matrix.nrows(),
                cols: matrix.ncols(),
            });
        }
        let n = matrix.nrows();
        if n == 0 {
            return Err(ModelError::EmptyInput("pairwise matrix"));
        }
        if n > RANDOM_INDEX.len() {
            return Err(ModelError::invalid(
                "pairwise matrix",
                format!("order {n} exceeds the random index table ({})", RANDOM_INDEX.len()),
            ));
        }
        for i in 0..n {
            for j in 0..n {
                let a = matrix[(i, j)];
                if !(a.is_finite() && a > 0.0) {
                    return Err(ModelError::invalid(
                        "pairwise matrix",
                        format!("entry ({i}, {j}) = {a} is not positive"),
                    ));
                }
                if (a * matrix[(j, i)] - 1.0).abs() > RECIPROCAL_TOL {
                    return Err(ModelError::invalid(
                        "pairwise matrix",
                        format!("entries ({i}, {j}) and ({j}, {i}) are not reciprocal"),
                    ));
                }
            }
        }
        Ok(Self { matrix })
    }

    /// Builds a matrix from its strict upper triangle, given row by row;
    /// the diagonal is 1 and the lower triangle holds the reciprocals.
    pub fn from_upper(size: usize, upper: &[f64]) -> Result<Self> {
        let expected = size * size.saturating_sub(1) / 2;
        if upper.len() != expected {
            return Err(ModelError::mismatch("upper triangle values", expected, upper.len()));
        }
        let mut m = DMatrix::from_element(size, size, 1.0);
        let mut values = upper.iter();
        for i in 0..size {
            for j in (i + 1)..size {
                if let Some(&v) = values.next() {
                    m[(i, j)] = v;
                    m[(j, i)] = 1.0 / v;
                }
            }
        }
        Self::new(m)
    }

    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Principal-eigenvector weights with the consistency diagnostics.
    pub fn weights(&self) -> Result<AhpWeights> {
        let n = self.size();
        let (lambda_max, weights) = principal_eigenpair(&self.matrix, EIGEN_TOL, EIGEN_MAX_ITER)?;
        let ci = if n > 1 {
            (lambda_max - n as f64) / (n as f64 - 1.0)
        } else {
            0.0
        };
        let ri = RANDOM_INDEX[n - 1];
        let cr = if ri > 0.0 { ci / ri } else { 0.0 };
        Ok(AhpWeights {
            weights,
            lambda_max,
            ci,
            ri,
            cr,
        })
    }
}

/// Local priorities of one comparison matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct AhpWeights {
    /// Principal eigenvector, sums to 1.
    pub weights: DVector<f64>,
    pub lambda_max: f64,
    /// Consistency index.
    pub ci: f64,
    /// Random index for this order.
    pub ri: f64,
    /// Consistency ratio CI/RI (0 for orders 1 and 2).
    pub cr: f64,
}

impl AhpWeights {
    pub fn is_consistent(&self, threshold: f64) -> bool {
        self.cr < threshold
    }
}

/// Two-level hierarchy: one criteria matrix plus one alternatives matrix
/// per criterion.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    criteria: PairwiseMatrix,
    alternatives: Vec<PairwiseMatrix>,
}

/// Outcome of a hierarchy evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyResult {
    pub criteria: AhpWeights,
    /// Local weights of the alternatives under each criterion.
    pub local: Vec<AhpWeights>,
    /// Overall score per alternative.
    pub scores: DVector<f64>,
    /// Alternative indices by descending score.
    pub ranking: Vec<usize>,
}

impl Hierarchy {
    /// # Errors
    /// `DimensionMismatch` if the number of alternative matrices differs
    /// from the number of criteria, or the alternative matrices disagree
    /// in size.
    pub fn new(criteria: PairwiseMatrix, alternatives: Vec<PairwiseMatrix>) -> Result<Self> {
        if alternatives.len() != criteria.size() {
            return Err(ModelError::mismatch(
                "alternative matrices per criterion",
                criteria.size(),
                alternatives.len(),
            ));
        }
        let k = alternatives[0].size();
        if let Some(bad) = alternatives.iter().find(|m| m.size() != k) {
            return Err(ModelError::mismatch("alternatives per matrix", k, bad.size()));
        }
        Ok(Self {
            criteria,
            alternatives,
        })
    }

    /// Computes overall alternative scores.
    ///
    /// # Errors
    /// `Inconsistent` for the first matrix whose CR is not below
    /// `threshold`.
    pub fn evaluate(&self, threshold: f64) -> Result<HierarchyResult> {
        let criteria = checked_weights(&self.criteria, threshold, "criteria")?;
        let local = self
            .alternatives
            .iter()
            .map(|m| checked_weights(m, threshold, "alternatives"))
            .collect::<Result<Vec<_>>>()?;

        let k = self.alternatives[0].size();
        let mut scores = DVector::zeros(k);
        for (w_c, alt) in criteria.weights.iter().zip(&local) {
            scores += &alt.weights * *w_c;
        }
        let ranking = rank_descending(scores.as_slice());
        tracing::debug!(criteria = criteria.weights.len(), alternatives = k, "hierarchy evaluated");
        Ok(HierarchyResult {
            criteria,
            local,
            scores,
            ranking,
        })
    }
}

fn checked_weights(m: &PairwiseMatrix, threshold: f64, stage: &str) -> Result<AhpWeights> {
    let w = m.weights()?;
    if !w.is_consistent(threshold) {
        tracing::warn!(stage, cr = w.cr, threshold, "comparison matrix is inconsistent");
        return Err(ModelError::Inconsistent {
            cr: w.cr,
            threshold,
        });
    }
    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_weights() {
        let m = PairwiseMatrix::from_upper(3, &[2.0, 5.0, 2.0]).unwrap();
        let w = m.weights().unwrap();
        let expected = [0.595_379_018, 0.276_350_460, 0.128_270_521];
        for (i, e) in expected.iter().enumerate() {
            assert!((w.weights[i] - e).abs() < 1e-8, "w[{i}] = {}", w.weights[i]);
        }
        assert!((w.lambda_max - 3.005_535_112).abs() < 1e-8);
        assert!((w.cr - 0.004_771_648).abs() < 1e-8);
        assert_eq!(w.ri, 0.58);
    }

    #[test]
    fn test_small_orders_are_consistent() {
        let one = PairwiseMatrix::new(DMatrix::from_element(1, 1, 1.0)).unwrap();
        let w = one.weights().unwrap();
        assert_eq!(w.cr, 0.0);
        assert!((w.weights[0] - 1.0).abs() < 1e-15);

        let two = PairwiseMatrix::from_upper(2, &[4.0]).unwrap();
        let w = two.weights().unwrap();
        assert!((w.weights[0] - 0.8).abs() < 1e-12);
        assert_eq!(w.cr, 0.0);
    }

    #[test]
    fn test_validation() {
        let not_reciprocal = DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 3.0, 1.0]);
        assert!(PairwiseMatrix::new(not_reciprocal).is_err());
        let negative = DMatrix::from_row_slice(2, 2, &[1.0, -2.0, -0.5, 1.0]);
        assert!(PairwiseMatrix::new(negative).is_err());
        assert!(matches!(
            PairwiseMatrix::new(DMatrix::from_element(2, 3, 1.0)),
            Err(ModelError::NotSquare { rows: 2, cols: 3 })
        ));
        assert!(PairwiseMatrix::new(DMatrix::from_element(14, 14, 1.0)).is_err());
        assert!(matches!(
            PairwiseMatrix::from_upper(3, &[1.0, 2.0]),
            Err(ModelError::DimensionMismatch { expected: 3, got: 2, .. })
        ));
    }

    #[test]
    fn test_hierarchy_scores() {
        let criteria = PairwiseMatrix::from_upper(2, &[3.0]).unwrap();
        let alternatives = vec![
            PairwiseMatrix::from_upper(3, &[1.0, 1.0, 1.0]).unwrap(),
            PairwiseMatrix::from_upper(3, &[1.0 / 3.0, 1.0 / 9.0, 1.0 / 3.0]).unwrap(),
        ];
        let result = Hierarchy::new(criteria, alternatives)
            .unwrap()
            .evaluate(0.1)
            .unwrap();
        // criteria weights (0.75, 0.25); second criterion is the consistent
        // chain 1 : 3 : 9 → (1, 3, 9)/13
        let expected = [
            0.75 / 3.0 + 0.25 / 13.0,
            0.75 / 3.0 + 0.25 * 3.0 / 13.0,
            0.75 / 3.0 + 0.25 * 9.0 / 13.0,
        ];
        for (i, e) in expected.iter().enumerate() {
            assert!((result.scores[i] - e).abs() < 1e-9);
        }
        assert_eq!(result.ranking, vec![2, 1, 0]);
        assert!((result.scores.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hierarchy_rejects_inconsistent() {
        let criteria = PairwiseMatrix::from_upper(1, &[]).unwrap();
        let cyclic = PairwiseMatrix::from_upper(3, &[9.0, 1.0 / 9.0, 9.0]).unwrap();
        let err = Hierarchy::new(criteria, vec![cyclic])
            .unwrap()
            .evaluate(0.1)
            .unwrap_err();
        match err {
            ModelError::Inconsistent { cr, threshold } => {
                assert!((cr - 6.130_268).abs() < 1e-5);
                assert_eq!(threshold, 0.1);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_hierarchy_shape_checks() {
        let criteria = PairwiseMatrix::from_upper(2, &[2.0]).unwrap();
        let a3 = PairwiseMatrix::from_upper(3, &[1.0, 1.0, 1.0]).unwrap();
        let a2 = PairwiseMatrix::from_upper(2, &[1.0]).unwrap();
        assert!(Hierarchy::new(criteria.clone(), vec![a3.clone()]).is_err());
        assert!(Hierarchy::new(criteria, vec![a3, a2]).is_err());
    }
}
