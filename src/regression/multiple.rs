//! Multiple ordinary least squares with coefficient inference.
//!
//! # Algorithm
//!
//! With the design `X = [1 | x₁ … x_k]` (n × (k+1)):
//!
//! - `β̂ = argmin ‖Xβ − y‖²` (SVD solve)
//! - `s² = SSR / (n − k − 1)`, `Cov(β̂) = s²(XᵀX)⁻¹`
//! - `tⱼ = β̂ⱼ / se(β̂ⱼ)` with two-sided Student-t p-values on `n − k − 1`
//!   degrees of freedom, 95% intervals `β̂ⱼ ± t₀.₉₇₅ · se(β̂ⱼ)`
//! - `F = (SSE_model / k) / s²` against `F(k, n − k − 1)`
//!
//! [`screen_features`] runs one univariate fit per candidate column and
//! keeps the slopes significant at `α`; [`stepwise_ols`] then fits the
//! survivors jointly. Rows with a missing (non-finite) value are dropped
//! per fit rather than rejected.
//!
//! # Examples
//! ```
//! use u_modelkit::regression::multiple::ols;
//!
//! let x1 = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let x2 = [2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
//! let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 1.0 + 2.0 * a - 0.5 * b).collect();
//! let fit = ols(&[&x1, &x2], &y).unwrap();
//! assert!((fit.coefficients[1] - 2.0).abs() < 1e-8);
//! assert!((fit.coefficients[2] + 0.5).abs() < 1e-8);
//! assert!(fit.r2 > 0.999_999);
//! ```

use nalgebra::{DMatrix, DVector};

use super::FitMetrics;
use crate::error::{ModelError, Result};
use crate::linalg::{invert, least_squares};
use crate::special::{f_cdf, t_quantile, t_two_sided_p};
use crate::stats::kahan_sum;

/// Minimum rows a candidate column needs to be screened.
pub const DEFAULT_MIN_ROWS: usize = 10;

/// Joint OLS fit. Index 0 of every per-coefficient vector is the
/// intercept; index `j` is predictor `j − 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    /// 95% confidence interval `(lower, upper)` per coefficient.
    pub conf_int: Vec<(f64, f64)>,
    pub r2: f64,
    pub adj_r2: f64,
    pub f_stat: f64,
    pub f_p_value: f64,
    pub metrics: FitMetrics,
}

impl OlsFit {
    /// Predicts for one row of predictor values (without the intercept).
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() + 1 != self.coefficients.len() {
            return Err(ModelError::mismatch(
                "predictor row",
                self.coefficients.len() - 1,
                row.len(),
            ));
        }
        Ok(self.coefficients[0]
            + self.coefficients[1..]
                .iter()
                .zip(row)
                .map(|(b, x)| b * x)
                .sum::<f64>())
    }

    /// Significance markers for every coefficient, see
    /// [`significance_stars`].
    pub fn stars(&self) -> Vec<&'static str> {
        self.p_values.iter().map(|&p| significance_stars(p)).collect()
    }
}

/// Conventional significance marker: `***` below 0.01, `**` below 0.05,
/// `*` below 0.1, a single space otherwise.
pub fn significance_stars(p: f64) -> &'static str {
    if p < 0.01 {
        "***"
    } else if p < 0.05 {
        "**"
    } else if p < 0.1 {
        "*"
    } else {
        " "
    }
}

/// Fits `y = β₀ + Σ βⱼ xⱼ` by ordinary least squares.
///
/// # Errors
/// - `EmptyInput` without predictors
/// - `DimensionMismatch` when a column's length differs from `y`
/// - `InsufficientData` unless `n > k + 1`
/// - `InvalidParameter` for non-finite values
/// - `Singular` for collinear predictors
pub fn ols(columns: &[&[f64]], y: &[f64]) -> Result<OlsFit> {
    let k = columns.len();
    if k == 0 {
        return Err(ModelError::EmptyInput("predictor columns"));
    }
    let n = y.len();
    for col in columns {
        if col.len() != n {
            return Err(ModelError::mismatch("predictor column", n, col.len()));
        }
    }
    if n < k + 2 {
        return Err(ModelError::insufficient("OLS", k + 2, n));
    }
    if y.iter().chain(columns.iter().flat_map(|c| c.iter())).any(|v| !v.is_finite()) {
        return Err(ModelError::invalid("data", "contains non-finite values"));
    }

    let design = DMatrix::from_fn(n, k + 1, |r, c| if c == 0 { 1.0 } else { columns[c - 1][r] });
    let target = DVector::from_column_slice(y);
    let xtx_inv = invert(&design.tr_mul(&design))?;
    let beta = least_squares(&design, &target)?;

    let predicted: Vec<f64> = (&design * &beta).iter().copied().collect();
    let metrics = FitMetrics::from_predictions(y, &predicted)?;

    let df = (n - k - 1) as f64;
    let residuals: Vec<f64> = y.iter().zip(&predicted).map(|(o, p)| (o - p).powi(2)).collect();
    let ssr = kahan_sum(&residuals);
    let mean = kahan_sum(y) / n as f64;
    let sst = kahan_sum(&y.iter().map(|v| (v - mean).powi(2)).collect::<Vec<_>>());
    let s2 = ssr / df;

    let t_crit = t_quantile(0.975, df);
    let coefficients: Vec<f64> = beta.iter().copied().collect();
    let std_errors: Vec<f64> = (0..=k).map(|j| (s2 * xtx_inv[(j, j)]).max(0.0).sqrt()).collect();
    let t_values: Vec<f64> = coefficients
        .iter()
        .zip(&std_errors)
        .map(|(&b, &se)| {
            if se > 0.0 {
                b / se
            } else if b == 0.0 {
                0.0
            } else {
                b.signum() * f64::INFINITY
            }
        })
        .collect();
    let p_values: Vec<f64> = t_values.iter().map(|&t| t_two_sided_p(t, df)).collect();
    let conf_int = coefficients
        .iter()
        .zip(&std_errors)
        .map(|(&b, &se)| (b - t_crit * se, b + t_crit * se))
        .collect();

    let r2 = metrics.r2;
    let adj_r2 = 1.0 - (1.0 - r2) * (n - 1) as f64 / df;
    let (f_stat, f_p_value) = if ssr > 0.0 {
        let f = ((sst - ssr).max(0.0) / k as f64) / s2;
        (f, 1.0 - f_cdf(f, k as f64, df))
    } else {
        (f64::INFINITY, 0.0)
    };

    tracing::debug!(n, k, r2, f_stat, "OLS fitted");
    Ok(OlsFit {
        coefficients,
        std_errors,
        t_values,
        p_values,
        conf_int,
        r2,
        adj_r2,
        f_stat,
        f_p_value,
        metrics,
    })
}

/// Outcome of the univariate check of one candidate column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenedFeature {
    /// Position of the column in the candidate list.
    pub index: usize,
    /// Complete rows used for the fit.
    pub rows: usize,
    pub slope: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// Keeps the rows where `y` and every column are finite.
fn complete_rows(columns: &[&[f64]], y: &[f64]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let keep: Vec<usize> = (0..y.len())
        .filter(|&r| y[r].is_finite() && columns.iter().all(|c| c[r].is_finite()))
        .collect();
    let cols = columns
        .iter()
        .map(|c| keep.iter().map(|&r| c[r]).collect())
        .collect();
    let ys = keep.iter().map(|&r| y[r]).collect();
    (cols, ys)
}

fn check_lengths(columns: &[&[f64]], y: &[f64]) -> Result<()> {
    if columns.is_empty() {
        return Err(ModelError::EmptyInput("candidate columns"));
    }
    for col in columns {
        if col.len() != y.len() {
            return Err(ModelError::mismatch("candidate column", y.len(), col.len()));
        }
    }
    Ok(())
}

/// Univariate OLS screening of each candidate column against `y`.
///
/// Rows where either value is missing are dropped per column. Columns with
/// fewer than `min_rows` complete rows, or whose fit is singular (a
/// constant column), are skipped and absent from the result.
///
/// # Errors
/// `EmptyInput`, `DimensionMismatch`, `InvalidParameter` unless
/// `0 < alpha < 1`.
pub fn screen_features(
    columns: &[&[f64]],
    y: &[f64],
    alpha: f64,
    min_rows: usize,
) -> Result<Vec<ScreenedFeature>> {
    check_lengths(columns, y)?;
    if alpha.is_nan() || alpha <= 0.0 || alpha >= 1.0 {
        return Err(ModelError::invalid("alpha", format!("{alpha} is not in (0, 1)")));
    }
    // a univariate fit needs three rows for a positive residual df
    let min_rows = min_rows.max(3);

    let mut screened = Vec::with_capacity(columns.len());
    for (index, col) in columns.iter().enumerate() {
        let (cols, ys) = complete_rows(&[*col], y);
        let rows = ys.len();
        if rows < min_rows {
            tracing::debug!(index, rows, min_rows, "skipping column with too few rows");
            continue;
        }
        let fit = match ols(&[&cols[0]], &ys) {
            Ok(fit) => fit,
            Err(e) => {
                tracing::warn!(index, error = %e, "univariate fit failed; column skipped");
                continue;
            }
        };
        let p_value = fit.p_values[1];
        screened.push(ScreenedFeature {
            index,
            rows,
            slope: fit.coefficients[1],
            p_value,
            significant: p_value < alpha,
        });
    }
    Ok(screened)
}

/// Screening followed by a joint fit of the significant columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StepwiseFit {
    /// Candidate indices that entered the joint model, in order.
    pub selected: Vec<usize>,
    pub screening: Vec<ScreenedFeature>,
    /// Complete rows used by the joint fit.
    pub rows: usize,
    /// `fit.coefficients[j + 1]` belongs to `selected[j]`.
    pub fit: OlsFit,
}

/// Screens the candidates with [`screen_features`] and fits the
/// significant ones jointly on the rows complete in all of them.
///
/// # Errors
/// Those of [`screen_features`] and [`ols`]; `InsufficientData` when no
/// column is significant.
pub fn stepwise_ols(
    columns: &[&[f64]],
    y: &[f64],
    alpha: f64,
    min_rows: usize,
) -> Result<StepwiseFit> {
    let screening = screen_features(columns, y, alpha, min_rows)?;
    let selected: Vec<usize> = screening
        .iter()
        .filter(|s| s.significant)
        .map(|s| s.index)
        .collect();
    if selected.is_empty() {
        tracing::warn!(alpha, "no significant predictors; joint fit skipped");
        return Err(ModelError::insufficient("significant predictors", 1, 0));
    }

    let chosen: Vec<&[f64]> = selected.iter().map(|&i| columns[i]).collect();
    let (cols, ys) = complete_rows(&chosen, y);
    let col_refs: Vec<&[f64]> = cols.iter().map(Vec::as_slice).collect();
    let fit = ols(&col_refs, &ys)?;
    tracing::info!(selected = ?selected, rows = ys.len(), r2 = fit.r2, "stepwise OLS fitted");
    Ok(StepwiseFit {
        selected,
        screening,
        rows: ys.len(),
        fit,
    })
}
