//! GM(1,1) grey forecasting model.
//!
//! # Algorithm
//!
//! 1. Accumulate: `x¹ₖ = Σ_{i≤k} x⁰ᵢ`.
//! 2. Background values `zₖ = ½(x¹ₖ + x¹ₖ₋₁)`, `k ≥ 1`.
//! 3. Least squares on `x⁰ₖ = −a·zₖ + b` gives the development coefficient
//!    `a` and grey input `b`.
//! 4. Time response `x̂¹(k) = (x⁰₀ − b/a)·e^{−ak} + b/a`, restored by
//!    differencing: `x̂⁰(k) = x̂¹(k) − x̂¹(k−1)`, `x̂⁰(0) = x⁰₀`.
//!
//! Series containing negative values are shifted to be positive before
//! fitting; fitted values and forecasts are shifted back.
//!
//! # Accuracy grades
//!
//! | Grade | P | C |
//! |---|---|---|
//! | Excellent | > 0.95 | < 0.35 |
//! | Good | > 0.80 | < 0.50 |
//! | Qualified | > 0.70 | < 0.65 |
//! | Unqualified | otherwise | |
//!
//! # Examples
//! ```
//! use u_modelkit::forecast::{GreyGrade, GreyModel};
//!
//! let model = GreyModel::fit(&[2.874, 3.278, 3.337, 3.390, 3.679]).unwrap();
//! assert!((model.development_coefficient() + 0.037204).abs() < 1e-6);
//! assert_eq!(model.diagnostics().grade, GreyGrade::Excellent);
//! let next = model.forecast(3);
//! assert!(next[0] > 3.6 && next[2] > next[0]);
//! ```

use std::fmt;

use nalgebra::{DMatrix, DVector};

use crate::error::{ModelError, Result};
use crate::linalg::least_squares;
use crate::stats;

const MIN_POINTS: usize = 4;
const SHIFT_MARGIN: f64 = 1e-6;
const SMALL_ERROR_FACTOR: f64 = 0.6745;

/// Posterior-variance accuracy grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreyGrade {
    Excellent,
    Good,
    Qualified,
    Unqualified,
}

impl GreyGrade {
    fn classify(p: f64, c: f64) -> Self {
        if p > 0.95 && c < 0.35 {
            GreyGrade::Excellent
        } else if p > 0.8 && c < 0.5 {
            GreyGrade::Good
        } else if p > 0.7 && c < 0.65 {
            GreyGrade::Qualified
        } else {
            GreyGrade::Unqualified
        }
    }
}

impl fmt::Display for GreyGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GreyGrade::Excellent => "excellent",
            GreyGrade::Good => "good",
            GreyGrade::Qualified => "qualified",
            GreyGrade::Unqualified => "unqualified",
        };
        f.write_str(s)
    }
}

/// In-sample fit quality of a GM(1,1) model.
#[derive(Debug, Clone, PartialEq)]
pub struct GreyDiagnostics {
    /// Observed minus fitted.
    pub residuals: Vec<f64>,
    /// `|residual| / observed · 100`; not finite where an observation is 0.
    pub relative_errors: Vec<f64>,
    pub mean_relative_error: f64,
    /// Posterior variance ratio `s_residual / s_data`.
    pub c: f64,
    /// Small-error probability.
    pub p: f64,
    pub grade: GreyGrade,
}

/// A fitted GM(1,1) model.
#[derive(Debug, Clone, PartialEq)]
pub struct GreyModel {
    a: f64,
    b: f64,
    first: f64,
    len: usize,
    shift: f64,
    fitted: Vec<f64>,
    diagnostics: GreyDiagnostics,
}

impl GreyModel {
    /// Fits GM(1,1) to `series`.
    ///
    /// # Errors
    /// `InsufficientData` below four points, `InvalidParameter` for
    /// non-finite values, `Singular` when the development coefficient is
    /// zero (a constant series).
    pub fn fit(series: &[f64]) -> Result<Self> {
        let n = series.len();
        if n < MIN_POINTS {
            return Err(ModelError::insufficient("GM(1,1)", MIN_POINTS, n));
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::invalid("series", "contains non-finite values"));
        }

        let min = stats::min(series).unwrap_or(0.0);
        let shift = if min < 0.0 { min - SHIFT_MARGIN } else { 0.0 };
        let x0: Vec<f64> = series.iter().map(|v| v - shift).collect();
        if shift != 0.0 {
            tracing::warn!(shift, "shifted series to non-negative values");
        }

        let mut x1 = Vec::with_capacity(n);
        let mut acc = 0.0_f64;
        for v in &x0 {
            acc += v;
            x1.push(acc);
        }
        let design = DMatrix::from_fn(n - 1, 2, |r, c| {
            if c == 0 {
                -0.5 * (x1[r + 1] + x1[r])
            } else {
                1.0
            }
        });
        let target = DVector::from_column_slice(&x0[1..]);
        let params = least_squares(&design, &target)?;
        let (a, b) = (params[0], params[1]);
        if a.abs() < 1e-12 {
            return Err(ModelError::Singular(
                "development coefficient is zero; the series is constant".into(),
            ));
        }

        let mut model = Self {
            a,
            b,
            first: x0[0],
            len: n,
            shift,
            fitted: Vec::new(),
            diagnostics: GreyDiagnostics {
                residuals: Vec::new(),
                relative_errors: Vec::new(),
                mean_relative_error: 0.0,
                c: 0.0,
                p: 0.0,
                grade: GreyGrade::Unqualified,
            },
        };
        let fitted_shifted: Vec<f64> = (0..n).map(|k| model.restored(k)).collect();
        model.diagnostics = diagnose(&x0, &fitted_shifted);
        model.fitted = fitted_shifted.iter().map(|v| v + shift).collect();

        tracing::debug!(
            a,
            b,
            c = model.diagnostics.c,
            p = model.diagnostics.p,
            grade = %model.diagnostics.grade,
            "GM(1,1) fitted"
        );
        Ok(model)
    }

    /// Time response `x̂¹(k)` on the shifted scale.
    fn accumulated(&self, k: usize) -> f64 {
        let ratio = self.b / self.a;
        (self.first - ratio) * (-self.a * k as f64).exp() + ratio
    }

    /// Restored `x̂⁰(k)` on the shifted scale.
    fn restored(&self, k: usize) -> f64 {
        if k == 0 {
            self.first
        } else {
            self.accumulated(k) - self.accumulated(k - 1)
        }
    }

    /// Development coefficient `a`.
    pub fn development_coefficient(&self) -> f64 {
        self.a
    }

    /// Grey input `b`.
    pub fn grey_input(&self) -> f64 {
        self.b
    }

    /// Shift subtracted from the series before fitting (0 when none).
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// In-sample fitted values on the original scale.
    pub fn fitted(&self) -> &[f64] {
        &self.fitted
    }

    pub fn diagnostics(&self) -> &GreyDiagnostics {
        &self.diagnostics
    }

    /// Forecasts the next `steps` values.
    pub fn forecast(&self, steps: usize) -> Vec<f64> {
        (self.len..self.len + steps)
            .map(|k| self.restored(k) + self.shift)
            .collect()
    }
}

fn diagnose(observed: &[f64], fitted: &[f64]) -> GreyDiagnostics {
    let n = observed.len();
    let residuals: Vec<f64> = observed.iter().zip(fitted).map(|(o, f)| o - f).collect();
    let relative_errors: Vec<f64> = residuals
        .iter()
        .zip(observed)
        .map(|(e, o)| e.abs() / o * 100.0)
        .collect();
    let mean_relative_error = stats::mean(&relative_errors).unwrap_or(f64::INFINITY);

    let s_data = stats::std_dev(observed).unwrap_or(0.0);
    let (c, p) = if s_data == 0.0 {
        (0.0, 1.0)
    } else {
        let s_res = stats::std_dev(&residuals).unwrap_or(0.0);
        let e_bar = stats::mean(&residuals).unwrap_or(0.0);
        let hits = residuals
            .iter()
            .filter(|e| (*e - e_bar).abs() < SMALL_ERROR_FACTOR * s_data)
            .count();
        (s_res / s_data, hits as f64 / n as f64)
    };

    GreyDiagnostics {
        residuals,
        relative_errors,
        mean_relative_error,
        c,
        p,
        grade: GreyGrade::classify(p, c),
    }
}
