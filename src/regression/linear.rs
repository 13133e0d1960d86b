//! Simple linear regression `y = a + b·x`.

use std::fmt::Write as _;

use super::{check_xy, FitMetrics};
use crate::error::{ModelError, Result};
use crate::stats;

/// A fitted straight line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleLinearFit {
    pub intercept: f64,
    pub slope: f64,
    /// In-sample fit quality.
    pub metrics: FitMetrics,
}

impl SimpleLinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// The fitted line with four decimals, e.g. `y = 1.5000 + 2.0000x`.
    pub fn equation(&self) -> String {
        let mut s = format!("y = {:.4}", self.intercept);
        let sign = if self.slope < 0.0 { '-' } else { '+' };
        let _ = write!(s, " {sign} {:.4}x", self.slope.abs());
        s
    }
}

/// Least-squares line through `(x, y)`.
///
/// # Errors
/// `DimensionMismatch`, `InsufficientData` below two points,
/// `InvalidParameter` for non-finite data or a constant `x`.
///
/// # Examples
/// ```
/// use u_modelkit::regression::linear::fit;
///
/// let f = fit(&[1.0, 2.0, 3.0, 4.0], &[3.1, 4.9, 7.2, 8.8]).unwrap();
/// assert!((f.slope - 1.94).abs() < 1e-10);
/// assert!((f.intercept - 1.15).abs() < 1e-10);
/// assert_eq!(f.equation(), "y = 1.1500 + 1.9400x");
/// ```
pub fn fit(x: &[f64], y: &[f64]) -> Result<SimpleLinearFit> {
    check_xy("linear regression", x, y, 2)?;
    let sxx = stats::covariance(x, x, false).unwrap_or(0.0);
    if sxx <= 0.0 {
        return Err(ModelError::invalid("x", "predictor is constant"));
    }
    let sxy = stats::covariance(x, y, false).unwrap_or(0.0);
    let slope = sxy / sxx;
    let intercept = stats::mean(y).unwrap_or(0.0) - slope * stats::mean(x).unwrap_or(0.0);
    let predicted: Vec<f64> = x.iter().map(|xi| intercept + slope * xi).collect();
    let metrics = FitMetrics::from_predictions(y, &predicted)?;
    tracing::debug!(intercept, slope, r2 = metrics.r2, "linear regression fitted");
    Ok(SimpleLinearFit {
        intercept,
        slope,
        metrics,
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn line_passes_through_centroid(
            pts in prop::collection::vec((-100.0_f64..100.0, -100.0_f64..100.0), 3..30)
        ) {
            let (x, y): (Vec<f64>, Vec<f64>) = pts.into_iter().unzip();
            prop_assume!(stats::variance(&x).unwrap_or(0.0) > 1e-6);
            let f = fit(&x, &y).unwrap();
            let mx = stats::mean(&x).unwrap();
            let my = stats::mean(&y).unwrap();
            prop_assert!((f.predict(mx) - my).abs() < 1e-8);
            prop_assert!(f.metrics.r2 <= 1.0 + 1e-12);
        }
    }
}
