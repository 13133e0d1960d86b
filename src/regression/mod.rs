//! Least-squares regression.
//!
//! - [`linear`]: one predictor, closed form
//! - [`multiple`]: ordinary least squares with coefficient inference and
//!   univariate feature screening
//! - [`nonlinear`]: bounded Levenberg–Marquardt curve fitting

pub mod linear;
pub mod multiple;
pub mod nonlinear;

use crate::error::{ModelError, Result};
use crate::stats::kahan_sum;

/// Goodness-of-fit summary of predictions against observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitMetrics {
    /// Coefficient of determination `1 − SS_res/SS_tot`.
    pub r2: f64,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
}

impl FitMetrics {
    /// Computes the metrics for equally long `observed` and `predicted`.
    ///
    /// For a constant `observed` series `r2` is 1 on a perfect fit and 0
    /// otherwise.
    ///
    /// ```
    /// use u_modelkit::regression::FitMetrics;
    ///
    /// let m = FitMetrics::from_predictions(&[1.0, 2.0, 3.0], &[1.0, 2.0, 4.0]).unwrap();
    /// assert!((m.mse - 1.0 / 3.0).abs() < 1e-12);
    /// assert!((m.r2 - 0.5).abs() < 1e-12);
    /// ```
    pub fn from_predictions(observed: &[f64], predicted: &[f64]) -> Result<Self> {
        if observed.is_empty() {
            return Err(ModelError::EmptyInput("observations"));
        }
        if observed.len() != predicted.len() {
            return Err(ModelError::mismatch("predictions", observed.len(), predicted.len()));
        }
        let n = observed.len() as f64;
        let residuals: Vec<f64> = observed.iter().zip(predicted).map(|(o, p)| o - p).collect();
        let ss_res = kahan_sum(&residuals.iter().map(|e| e * e).collect::<Vec<_>>());
        let mae = kahan_sum(&residuals.iter().map(|e| e.abs()).collect::<Vec<_>>()) / n;
        let mean = kahan_sum(observed) / n;
        let ss_tot = kahan_sum(&observed.iter().map(|o| (o - mean).powi(2)).collect::<Vec<_>>());
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };
        let mse = ss_res / n;
        Ok(Self {
            r2,
            mse,
            rmse: mse.sqrt(),
            mae,
        })
    }
}

pub(crate) fn check_xy(context: &'static str, x: &[f64], y: &[f64], min: usize) -> Result<()> {
    if x.len() != y.len() {
        return Err(ModelError::mismatch(context, x.len(), y.len()));
    }
    if x.len() < min {
        return Err(ModelError::insufficient(context, min, x.len()));
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(ModelError::invalid("data", "contains non-finite values"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_fit() {
        let y = [3.0, 5.0, 7.0];
        let m = FitMetrics::from_predictions(&y, &y).unwrap();
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.mae, 0.0);
    }

    #[test]
    fn test_constant_observations() {
        let m = FitMetrics::from_predictions(&[2.0, 2.0], &[2.0, 3.0]).unwrap();
        assert_eq!(m.r2, 0.0);
        assert!((m.rmse - 0.5_f64.sqrt()).abs() < 1e-12);
        assert!((m.mae - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_validation() {
        assert!(FitMetrics::from_predictions(&[], &[]).is_err());
        assert!(FitMetrics::from_predictions(&[1.0], &[1.0, 2.0]).is_err());
        assert!(check_xy("xy", &[1.0, f64::NAN], &[1.0, 2.0], 2).is_err());
        assert!(check_xy("xy", &[1.0], &[1.0], 2).is_err());
    }
}
