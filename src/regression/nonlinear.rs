//! Bounded nonlinear least-squares curve fitting.
//!
//! # Algorithm
//!
//! Levenberg–Marquardt on the residuals `rᵢ = yᵢ − f(xᵢ; θ)`:
//!
//! 1. Forward-difference Jacobian `J` (a backward step is used where the
//!    forward one would leave the box).
//! 2. Solve `(JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr` and project `θ + δ` onto the
//!    bounds.
//! 3. Accept the step and shrink `λ` tenfold when the cost drops,
//!    otherwise grow it tenfold and retry.
//!
//! Iteration stops when the relative cost reduction, the step or the
//! gradient becomes negligible, or when `λ` saturates (no descent direction
//! left inside the box). Parameter standard errors come from
//! `s²(JᵀJ)⁻¹` with `s² = SSR / (n − p)`.
//!
//! # Examples
//! ```
//! use u_modelkit::regression::nonlinear::{curve_fit, CurveModel};
//!
//! let x: Vec<f64> = (0..=20).map(|i| i as f64 * 0.5).collect();
//! let y: Vec<f64> = x.iter().map(|v| 1.0 + 4.0 * (-(v - 5.0).powi(2) / 4.5).exp()).collect();
//! let fit = curve_fit(CurveModel::Gaussian, &x, &y, None, None, 500).unwrap();
//! assert!((fit.params[2] - 5.0).abs() < 1e-4);
//! assert!(fit.r2 > 0.999_999);
//! ```

use nalgebra::{DMatrix, DVector};

use super::{check_xy, FitMetrics};
use crate::error::{ModelError, Result};
use crate::linalg::invert;
use crate::stats;

const FTOL: f64 = 1e-12;
const XTOL: f64 = 1e-12;
const GTOL: f64 = 1e-14;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MAX: f64 = 1e16;
const DIAG_FLOOR: f64 = 1e-12;

/// Parametric curve families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveModel {
    /// Asymmetric peak `a + b·exp(−½u²)` with `u = (c − x)/d` before the
    /// peak and `u = (x − c)/e` after it.
    ModifiedGaussian,
    /// `a + b·exp(−(x − c)² / 2d²)`.
    Gaussian,
    /// `a·e^{bx} + c`.
    Exponential,
    /// `a / (1 + e^{−b(x − c)}) + d`.
    Logistic,
    /// Polynomial of the given degree, coefficients highest power first.
    Polynomial(usize),
}

/// Box constraints on the parameters; infinite entries leave a side open.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; n],
            upper: vec![f64::INFINITY; n],
        }
    }

    fn project(&self, params: &mut [f64]) {
        for ((p, lo), hi) in params.iter_mut().zip(&self.lower).zip(&self.upper) {
            *p = p.clamp(*lo, *hi);
        }
    }
}

struct DataSummary {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_range: f64,
    x_peak: f64,
}

impl DataSummary {
    fn of(x: &[f64], y: &[f64]) -> Self {
        let x_min = stats::min(x).unwrap_or(0.0);
        let x_max = stats::max(x).unwrap_or(1.0);
        let y_min = stats::min(y).unwrap_or(0.0);
        let y_max = stats::max(y).unwrap_or(1.0);
        let x_peak = y
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .and_then(|(i, _)| x.get(i).copied())
            .unwrap_or(0.5 * (x_min + x_max));
        Self {
            x_min,
            x_max,
            y_min,
            y_range: y_max - y_min,
            x_peak,
        }
    }

    fn x_span(&self) -> f64 {
        let span = self.x_max - self.x_min;
        if span > 0.0 {
            span
        } else {
            1.0
        }
    }
}

impl CurveModel {
    pub fn n_params(&self) -> usize {
        match self {
            CurveModel::ModifiedGaussian => 5,
            CurveModel::Gaussian | CurveModel::Logistic => 4,
            CurveModel::Exponential => 3,
            CurveModel::Polynomial(degree) => degree + 1,
        }
    }

    pub fn param_names(&self) -> Vec<String> {
        let names: &[&str] = match self {
            CurveModel::ModifiedGaussian => {
                &["baseline", "peak_height", "peak_time", "rise_width", "fall_width"]
            }
            CurveModel::Gaussian => &["baseline", "amplitude", "center", "width"],
            CurveModel::Exponential => &["scale", "rate", "offset"],
            CurveModel::Logistic => &["capacity", "growth_rate", "midpoint", "offset"],
            CurveModel::Polynomial(degree) => {
                return (0..=*degree).rev().map(|k| format!("c{k}")).collect();
            }
        };
        names.iter().map(|s| (*s).to_string()).collect()
    }

    /// Evaluates the curve at `x`.
    ///
    /// # Errors
    /// `DimensionMismatch` unless `params.len() == self.n_params()`.
    pub fn eval(&self, x: f64, params: &[f64]) -> Result<f64> {
        if params.len() != self.n_params() {
            return Err(ModelError::mismatch("curve parameters", self.n_params(), params.len()));
        }
        Ok(self.value(x, params))
    }

    fn value(&self, x: f64, p: &[f64]) -> f64 {
        match self {
            CurveModel::ModifiedGaussian => {
                let u = if x < p[2] { (p[2] - x) / p[3] } else { (x - p[2]) / p[4] };
                p[0] + p[1] * (-0.5 * u * u).exp()
            }
            CurveModel::Gaussian => p[0] + p[1] * (-(x - p[2]).powi(2) / (2.0 * p[3] * p[3])).exp(),
            CurveModel::Exponential => p[0] * (p[1] * x).exp() + p[2],
            CurveModel::Logistic => p[0] / (1.0 + (-p[1] * (x - p[2])).exp()) + p[3],
            CurveModel::Polynomial(_) => p.iter().fold(0.0, |acc, c| acc * x + c),
        }
    }

    /// Data-driven starting point.
    pub fn initial_guess(&self, x: &[f64], y: &[f64]) -> Vec<f64> {
        let s = DataSummary::of(x, y);
        match self {
            CurveModel::ModifiedGaussian => vec![s.y_min, s.y_range, s.x_peak, 30.0, 60.0],
            CurveModel::Gaussian => vec![s.y_min, s.y_range, s.x_peak, s.x_span() / 4.0],
            CurveModel::Exponential => vec![1.0, 1.0 / s.x_span(), s.y_min],
            CurveModel::Logistic => vec![
                s.y_range.max(1e-6),
                4.0 / s.x_span(),
                0.5 * (s.x_min + s.x_max),
                s.y_min,
            ],
            CurveModel::Polynomial(degree) => vec![0.0; degree + 1],
        }
    }

    /// Default box. Only the modified Gaussian is constrained; every other
    /// family is unbounded.
    pub fn default_bounds(&self, x: &[f64], y: &[f64]) -> Bounds {
        match self {
            CurveModel::ModifiedGaussian => {
                let s = DataSummary::of(x, y);
                let (a_lo, a_hi) = (s.y_min * 0.8, s.y_min * 1.2);
                Bounds {
                    lower: vec![a_lo.min(a_hi), 0.1, s.x_min, 5.0, 10.0],
                    upper: vec![a_lo.max(a_hi), (s.y_range * 1.5).max(0.1), s.x_max, 100.0, 200.0],
                }
            }
            _ => Bounds::unbounded(self.n_params()),
        }
    }
}

/// Result of [`curve_fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct CurveFit {
    pub params: Vec<f64>,
    /// NaN where the covariance could not be estimated.
    pub std_errors: Vec<f64>,
    pub fitted: Vec<f64>,
    pub r2: f64,
    pub iterations: usize,
}

fn jacobian(
    model: CurveModel,
    x: &[f64],
    params: &[f64],
    base: &[f64],
    bounds: &Bounds,
) -> DMatrix<f64> {
    let mut jac = DMatrix::zeros(x.len(), params.len());
    let mut shifted = params.to_vec();
    for j in 0..params.len() {
        let mut h = f64::EPSILON.sqrt() * params[j].abs().max(1.0);
        if params[j] + h > bounds.upper[j] {
            h = -h;
        }
        shifted[j] = params[j] + h;
        for (i, &xi) in x.iter().enumerate() {
            jac[(i, j)] = (model.value(xi, &shifted) - base[i]) / h;
        }
        shifted[j] = params[j];
    }
    jac
}

fn sum_sq(model: CurveModel, x: &[f64], y: &[f64], params: &[f64]) -> (Vec<f64>, f64) {
    let values: Vec<f64> = x.iter().map(|&xi| model.value(xi, params)).collect();
    let cost = values.iter().zip(y).map(|(f, o)| (o - f).powi(2)).sum::<f64>();
    (values, cost)
}

/// Fits `model` to `(x, y)`.
///
/// `p0` defaults to [`CurveModel::initial_guess`] and `bounds` to
/// [`CurveModel::default_bounds`]; the start is projected onto the box.
///
/// # Errors
/// - `DimensionMismatch` for unequal data lengths or a wrong-sized `p0`
///   or `bounds`
/// - `InsufficientData` with fewer points than parameters
/// - `InvalidParameter` for non-finite data, a box with `lower > upper`,
///   `max_iter == 0`, or a start where the residuals are not finite
/// - `NoConvergence` when `max_iter` iterations do not settle
pub fn curve_fit(
    model: CurveModel,
    x: &[f64],
    y: &[f64],
    p0: Option<&[f64]>,
    bounds: Option<&Bounds>,
    max_iter: usize,
) -> Result<CurveFit> {
    let n_params = model.n_params();
    check_xy("curve fit", x, y, n_params)?;
    if max_iter == 0 {
        return Err(ModelError::invalid("max_iter", "must be positive"));
    }
    let mut params = match p0 {
        Some(p) if p.len() != n_params => {
            return Err(ModelError::mismatch("initial parameters", n_params, p.len()));
        }
        Some(p) => p.to_vec(),
        None => model.initial_guess(x, y),
    };
    let bounds = match bounds {
        Some(b) => b.clone(),
        None => model.default_bounds(x, y),
    };
    if bounds.lower.len() != n_params || bounds.upper.len() != n_params {
        return Err(ModelError::mismatch(
            "parameter bounds",
            n_params,
            bounds.lower.len().min(bounds.upper.len()),
        ));
    }
    let inverted = bounds
        .lower
        .iter()
        .zip(&bounds.upper)
        .any(|(lo, hi)| lo.is_nan() || hi.is_nan() || lo > hi);
    if inverted {
        return Err(ModelError::invalid("bounds", "a lower bound exceeds its upper bound"));
    }
    if params.iter().any(|p| !p.is_finite()) {
        return Err(ModelError::invalid("p0", "initial parameters must be finite"));
    }
    bounds.project(&mut params);

    let (mut values, mut cost) = sum_sq(model, x, y, &params);
    if !cost.is_finite() {
        return Err(ModelError::invalid(
            "p0",
            "model is not finite at the starting parameters",
        ));
    }
    let mut lambda = LAMBDA_INIT;
    let mut converged = false;
    let mut iterations = 0;

    while iterations < max_iter {
        iterations += 1;
        let jac = jacobian(model, x, &params, &values, &bounds);
        let residuals = DVector::from_iterator(x.len(), y.iter().zip(&values).map(|(o, f)| o - f));
        let jtj = jac.tr_mul(&jac);
        let jtr = jac.tr_mul(&residuals);
        if jtr.amax() < GTOL {
            converged = true;
            break;
        }

        let mut improved = false;
        while lambda <= LAMBDA_MAX {
            let mut damped = jtj.clone();
            for i in 0..n_params {
                damped[(i, i)] = (jtj[(i, i)] * (1.0 + lambda)).max(DIAG_FLOOR);
            }
            let Some(delta) = damped.lu().solve(&jtr) else {
                lambda *= 10.0;
                continue;
            };
            let mut candidate: Vec<f64> = params.iter().zip(delta.iter()).map(|(p, d)| p + d).collect();
            bounds.project(&mut candidate);
            let (cand_values, cand_cost) = sum_sq(model, x, y, &candidate);
            if cand_cost.is_finite() && cand_cost < cost {
                let step = candidate
                    .iter()
                    .zip(&params)
                    .map(|(a, b)| (a - b).powi(2))
                    .sum::<f64>()
                    .sqrt();
                let scale = params.iter().map(|p| p * p).sum::<f64>().sqrt();
                let reduction = (cost - cand_cost) / cost;
                params = candidate;
                values = cand_values;
                cost = cand_cost;
                lambda = (lambda * 0.1).max(1e-12);
                improved = true;
                tracing::debug!(iterations, cost, lambda, "Levenberg-Marquardt step accepted");
                if reduction < FTOL || step < XTOL * (scale + XTOL) {
                    converged = true;
                }
                break;
            }
            lambda *= 10.0;
        }
        if !improved {
            tracing::debug!(iterations, cost, "damping saturated; no further descent");
            converged = true;
        }
        if converged {
            break;
        }
    }

    if !converged {
        return Err(ModelError::NoConvergence {
            context: "Levenberg-Marquardt curve fit",
            iterations: max_iter,
        });
    }

    let jac = jacobian(model, x, &params, &values, &bounds);
    let dof = x.len().saturating_sub(n_params);
    let std_errors = match invert(&jac.tr_mul(&jac)) {
        Ok(inv) if dof > 0 => {
            let s2 = cost / dof as f64;
            (0..n_params).map(|j| (s2 * inv[(j, j)]).sqrt()).collect()
        }
        _ => {
            tracing::warn!("parameter covariance could not be estimated");
            vec![f64::NAN; n_params]
        }
    };
    let r2 = FitMetrics::from_predictions(y, &values)?.r2;
    tracing::debug!(?model, iterations, r2, "curve fit finished");
    Ok(CurveFit {
        params,
        std_errors,
        fitted: values,
        r2,
        iterations,
    })
}
