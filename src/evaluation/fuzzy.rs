//! Fuzzy comprehensive evaluation.
//!
//! Each indicator score is mapped onto a set of grades (e.g. excellent,
//! good, fair, poor) through trapezoidal membership functions. An
//! object's composite membership is the weighted sum of its indicator
//! memberships, `B = w · R`, and its grade is the arg-max of `B`.
//!
//! For multi-level evaluation, the composite memberships of one level are
//! the indicator data of the next.
//!
//! # Examples
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use u_modelkit::evaluation::fuzzy::{fuzzy_evaluate, GradeSet};
//!
//! let scores = DMatrix::from_row_slice(2, 2, &[90.0, 95.0, 50.0, 40.0]);
//! let weights = DVector::from_vec(vec![0.5, 0.5]);
//! let r = fuzzy_evaluate(&scores, &weights, &GradeSet::default()).unwrap();
//! assert_eq!(r.grades, vec!["excellent", "poor"]);
//! ```

use nalgebra::{DMatrix, DVector};

use super::check_decision_matrix;
use crate::error::{ModelError, Result};

const P_FLOOR: f64 = 1e-10;

/// Trapezoidal membership function rising on `(a, b]`, flat on `(b, c]`
/// and falling on `(c, d]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trapezoid {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Trapezoid {
    /// # Errors
    /// `InvalidParameter` unless `a ≤ b ≤ c ≤ d` (all finite).
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        let ordered = a <= b && b <= c && c <= d;
        if !ordered || ![a, b, c, d].iter().all(|v| v.is_finite()) {
            return Err(ModelError::invalid(
                "trapezoid",
                format!("[{a}, {b}, {c}, {d}] must be finite and non-decreasing"),
            ));
        }
        Ok(Self { a, b, c, d })
    }

    /// Membership degree of `x` in `[0, 1]`. Edges with `a = b` or
    /// `c = d` are vertical.
    pub fn membership(&self, x: f64) -> f64 {
        let Self { a, b, c, d } = *self;
        if x <= a {
            0.0
        } else if x <= b {
            (x - a) / (b - a)
        } else if x <= c {
            1.0
        } else if x <= d {
            (d - x) / (d - c)
        } else {
            0.0
        }
    }
}

/// Named evaluation grades.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeSet {
    grades: Vec<(String, Trapezoid)>,
}

impl Default for GradeSet {
    /// Four grades on a 0–100 score scale.
    fn default() -> Self {
        let t = |a, b, c, d| Trapezoid { a, b, c, d };
        Self {
            grades: vec![
                ("excellent".to_string(), t(80.0, 85.0, 100.0, 100.0)),
                ("good".to_string(), t(65.0, 70.0, 80.0, 85.0)),
                ("fair".to_string(), t(50.0, 55.0, 65.0, 70.0)),
                ("poor".to_string(), t(0.0, 0.0, 50.0, 55.0)),
            ],
        }
    }
}

impl GradeSet {
    pub fn new(grades: Vec<(String, Trapezoid)>) -> Result<Self> {
        if grades.is_empty() {
            return Err(ModelError::EmptyInput("grades"));
        }
        Ok(Self { grades })
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.grades.iter().map(|(name, _)| name.as_str())
    }

    /// Membership of `x` in every grade, in grade order.
    pub fn memberships(&self, x: f64) -> Vec<f64> {
        self.grades.iter().map(|(_, t)| t.membership(x)).collect()
    }
}

/// Outcome of a fuzzy comprehensive evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyResult {
    /// Per object: indicators × grades membership matrix `R`.
    pub memberships: Vec<DMatrix<f64>>,
    /// Objects × grades composite memberships `w · R`.
    pub composite: DMatrix<f64>,
    /// Winning grade name per object.
    pub grades: Vec<String>,
}

/// Entropy weights for fuzzy evaluation.
///
/// Columns are min–max normalised (constant → 0.5), shares are clipped to
/// `[1e-10, 1]` before taking logarithms.
pub fn fuzzy_entropy_weights(data: &DMatrix<f64>) -> Result<DVector<f64>> {
    check_decision_matrix(data, data.ncols())?;
    let n = data.nrows();
    if n < 2 {
        return Err(ModelError::insufficient("fuzzy entropy weights", 2, n));
    }
    let ln_n = (n as f64).ln();
    let g: Vec<f64> = data
        .column_iter()
        .map(|col| {
            let (lo, hi) = (col.min(), col.max());
            let norm: Vec<f64> = col
                .iter()
                .map(|x| if hi == lo { 0.5 } else { (x - lo) / (hi - lo) })
                .collect();
            let total: f64 = norm.iter().sum();
            let h: f64 = norm
                .iter()
                .map(|x| {
                    let p = (x / total).clamp(P_FLOOR, 1.0);
                    -p * p.ln()
                })
                .sum();
            1.0 - h / ln_n
        })
        .collect();
    let sum: f64 = g.iter().sum();
    if sum == 0.0 {
        tracing::warn!(indicators = g.len(), "no indicator varies; using equal weights");
        return Ok(DVector::from_element(g.len(), 1.0 / g.len() as f64));
    }
    Ok(DVector::from_iterator(g.len(), g.iter().map(|v| v / sum)))
}

/// Evaluates every object (row of `data`) against `grades`.
///
/// # Errors
/// `EmptyInput`, `DimensionMismatch` when `weights` does not have one entry
/// per indicator, `InvalidParameter` for non-finite data.
pub fn fuzzy_evaluate(
    data: &DMatrix<f64>,
    weights: &DVector<f64>,
    grades: &GradeSet,
) -> Result<FuzzyResult> {
    check_decision_matrix(data, weights.len())?;
    let k = grades.len();
    let names: Vec<&str> = grades.names().collect();

    let mut memberships = Vec::with_capacity(data.nrows());
    let mut composite = DMatrix::zeros(data.nrows(), k);
    let mut winners = Vec::with_capacity(data.nrows());
    for (i, row) in data.row_iter().enumerate() {
        let r = DMatrix::from_fn(row.len(), k, |j, g| grades.grades[g].1.membership(row[j]));
        let b = r.tr_mul(weights);
        let mut best = 0;
        for g in 1..k {
            if b[g] > b[best] {
                best = g;
            }
        }
        composite.row_mut(i).copy_from(&b.transpose());
        winners.push(names[best].to_string());
        memberships.push(r);
    }
    tracing::debug!(objects = data.nrows(), grades = k, "fuzzy evaluation finished");
    Ok(FuzzyResult {
        memberships,
        composite,
        grades: winners,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trapezoid_segments() {
        let t = Trapezoid::new(65.0, 70.0, 80.0, 85.0).unwrap();
        assert_eq!(t.membership(60.0), 0.0);
        assert_eq!(t.membership(65.0), 0.0);
        assert!((t.membership(67.5) - 0.5).abs() < 1e-12);
        assert_eq!(t.membership(75.0), 1.0);
        assert!((t.membership(84.0) - 0.2).abs() < 1e-12);
        assert_eq!(t.membership(90.0), 0.0);
    }

    #[test]
    fn test_vertical_edges() {
        let top = Trapezoid::new(80.0, 85.0, 100.0, 100.0).unwrap();
        assert_eq!(top.membership(100.0), 1.0);
        assert_eq!(top.membership(100.5), 0.0);
        let bottom = Trapezoid::new(0.0, 0.0, 50.0, 55.0).unwrap();
        assert_eq!(bottom.membership(0.5), 1.0);
        assert!(Trapezoid::new(1.0, 0.0, 2.0, 3.0).is_err());
    }

    #[test]
    fn test_composite_membership() {
        // one indicator at 82.5: excellent 0.5, good 0.5
        let data = DMatrix::from_row_slice(1, 2, &[82.5, 90.0]);
        let w = DVector::from_vec(vec![0.4, 0.6]);
        let r = fuzzy_evaluate(&data, &w, &GradeSet::default()).unwrap();
        let b = r.composite.row(0);
        assert!((b[0] - (0.4 * 0.5 + 0.6)).abs() < 1e-12);
        assert!((b[1] - 0.2).abs() < 1e-12);
        assert_eq!(b[2], 0.0);
        assert_eq!(r.grades[0], "excellent");
        assert_eq!(r.memberships[0].shape(), (2, 4));
    }

    #[test]
    fn test_weights_match_dimension() {
        let data = DMatrix::from_row_slice(1, 2, &[70.0, 75.0]);
        let w = DVector::from_vec(vec![1.0]);
        assert!(fuzzy_evaluate(&data, &w, &GradeSet::default()).is_err());
        assert!(GradeSet::new(vec![]).is_err());
    }

    #[test]
    fn test_entropy_weights() {
        let data = DMatrix::from_row_slice(3, 2, &[60.0, 70.0, 70.0, 70.0, 90.0, 70.0]);
        let w = fuzzy_entropy_weights(&data).unwrap();
        assert!((w.sum() - 1.0).abs() < 1e-12);
        assert!(w[0] > 0.99);
        let single = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(fuzzy_entropy_weights(&single).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn membership_in_unit_interval(x in -10.0_f64..110.0) {
            for m in GradeSet::default().memberships(x) {
                prop_assert!((0.0..=1.0).contains(&m));
            }
        }
    }
}
