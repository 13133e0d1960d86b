//! Correlation-based manual ARIMA(p, d, q).
//!
//! A lightweight heuristic rather than a maximum-likelihood ARIMA fit: the
//! AR and MA coefficients are plain autocorrelations, which makes the
//! forecast cheap and deterministic.
//!
//! # Algorithm
//!
//! 1. Difference the history `d` times.
//! 2. AR coefficients `φₖ` = lag-`k` autocorrelation of the differenced
//!    series, `k = 1..=p`.
//! 3. In-sample AR predictions `ŷᵢ = Σₖ φₖ · wᵢ[k]` over the window
//!    `wᵢ = diff[i−p..i]` (oldest first) for `i ≥ p`, 0 before that;
//!    residuals `eᵢ = diffᵢ − ŷᵢ`.
//! 4. MA coefficients `θₖ` = lag-`k` autocorrelation of the residuals.
//! 5. Recursive forecast over the last `p` differences and last `q`
//!    residuals; each new prediction is appended to both windows (it
//!    stands in for the unknown future residual).
//! 6. Integrate `d` times starting from the tail of the history and round
//!    to two decimals.
//!
//! A constant window has no defined autocorrelation; its coefficients are
//! taken as 0.
//!
//! # Examples
//! ```
//! use u_modelkit::forecast::{manual_arima_forecast, ArimaOrder};
//!
//! let history: Vec<f64> = (0..30).map(|t| 10.0 + 2.0 * t as f64).collect();
//! let f = manual_arima_forecast(&history, ArimaOrder { p: 1, d: 1, q: 0 }, 3).unwrap();
//! // a linear trend differences to a constant, whose autocorrelation is 0
//! assert_eq!(f, vec![68.0, 68.0, 68.0]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::stats;

/// ARIMA orders: AR lags `p`, differencing `d`, MA lags `q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl Default for ArimaOrder {
    fn default() -> Self {
        Self { p: 2, d: 1, q: 2 }
    }
}

impl ArimaOrder {
    /// Shortest history the forecast accepts: every autocorrelation needs
    /// at least two overlapping pairs.
    pub fn min_history(&self) -> usize {
        self.d + self.p.max(self.q) + 2
    }
}

fn lag_coefficients(series: &[f64], lags: usize) -> Vec<f64> {
    (1..=lags)
        .map(|lag| stats::autocorrelation(series, lag).unwrap_or(0.0))
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Forecasts `steps` values after `history`.
///
/// # Errors
/// `InsufficientData` when `history` is shorter than
/// [`ArimaOrder::min_history`], `InvalidParameter` for non-finite values.
pub fn manual_arima_forecast(
    history: &[f64],
    order: ArimaOrder,
    steps: usize,
) -> Result<Vec<f64>> {
    let required = order.min_history();
    if history.len() < required {
        return Err(ModelError::insufficient("manual ARIMA", required, history.len()));
    }
    if history.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::invalid("history", "contains non-finite values"));
    }
    let ArimaOrder { p, d, q } = order;

    // levels[k] is the history differenced k times
    let mut levels = Vec::with_capacity(d + 1);
    levels.push(history.to_vec());
    for k in 1..=d {
        levels.push(stats::diff(&levels[k - 1], 1));
    }
    let series = &levels[d];

    let ar = lag_coefficients(series, p);
    let residuals: Vec<f64> = series
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let pred = if i >= p {
                ar.iter().zip(&series[i - p..i]).map(|(c, v)| c * v).sum::<f64>()
            } else {
                0.0
            };
            x - pred
        })
        .collect();
    let ma = lag_coefficients(&residuals, q);

    let mut last_diff = series[series.len() - p..].to_vec();
    let mut last_res = residuals[residuals.len() - q..].to_vec();
    let mut predicted = Vec::with_capacity(steps);
    for _ in 0..steps {
        let ar_part: f64 = ar.iter().zip(&last_diff).map(|(c, v)| c * v).sum();
        let ma_part: f64 = ma.iter().zip(&last_res).map(|(c, v)| c * v).sum();
        let next = ar_part + ma_part;
        predicted.push(next);
        if p > 0 {
            last_diff.rotate_left(1);
            last_diff[p - 1] = next;
        }
        if q > 0 {
            last_res.rotate_left(1);
            last_res[q - 1] = next;
        }
    }

    // undo the differencing, innermost level first
    for level in levels[..d].iter().rev() {
        let mut prev = level[level.len() - 1];
        for v in predicted.iter_mut() {
            prev += *v;
            *v = prev;
        }
    }

    tracing::debug!(p, d, q, steps, ?ar, ?ma, "manual ARIMA forecast");
    Ok(predicted.into_iter().map(round2).collect())
}

/// Chronological split: the first `⌊n(1 − test_fraction)⌋` values train.
///
/// # Errors
/// `InvalidParameter` unless `0 ≤ test_fraction ≤ 1`.
pub fn train_test_split(data: &[f64], test_fraction: f64) -> Result<(&[f64], &[f64])> {
    if !(0.0..=1.0).contains(&test_fraction) {
        return Err(ModelError::invalid(
            "test_fraction",
            format!("{test_fraction} is not in [0, 1]"),
        ));
    }
    let split = (data.len() as f64 * (1.0 - test_fraction)) as usize;
    Ok(data.split_at(split.min(data.len())))
}

/// One-step-ahead predictions over a test window.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkForward {
    pub predictions: Vec<f64>,
    /// Root mean squared error against the test values.
    pub rmse: f64,
}

/// Predicts each test point one step ahead.
///
/// The history for step `i` is `train` followed by the first `i`
/// *predictions* (not the observed test values), so errors compound the
/// way they would in an unattended forecast.
pub fn walk_forward(train: &[f64], test: &[f64], order: ArimaOrder) -> Result<WalkForward> {
    if test.is_empty() {
        return Err(ModelError::EmptyInput("test window"));
    }
    let mut history = train.to_vec();
    let mut predictions = Vec::with_capacity(test.len());
    for _ in test {
        let next = manual_arima_forecast(&history, order, 1)?[0];
        predictions.push(next);
        history.push(next);
    }
    let mse = predictions
        .iter()
        .zip(test)
        .map(|(p, t)| (p - t).powi(2))
        .sum::<f64>()
        / test.len() as f64;
    let rmse = mse.sqrt();
    tracing::debug!(points = test.len(), rmse, "walk-forward validation finished");
    Ok(WalkForward { predictions, rmse })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_extends_flat() {
        let history: Vec<f64> = (0..10).map(|t| 3.0 * t as f64).collect();
        let f = manual_arima_forecast(&history, ArimaOrder::default(), 2).unwrap();
        assert_eq!(f, vec![27.0, 27.0]);
    }

    #[test]
    fn test_hand_computed_ar1() {
        // d = 0, p = 1: φ = corr([1,2,1,2,1], [2,1,2,1,2]) = −1
        // forecast: −1 · 2 = −2, then −1 · −2 = 2
        let history = [1.0, 2.0, 1.0, 2.0, 1.0, 2.0];
        let f = manual_arima_forecast(&history, ArimaOrder { p: 1, d: 0, q: 0 }, 2).unwrap();
        assert_eq!(f, vec![-2.0, 2.0]);
    }

    #[test]
    fn test_second_order_differencing_integrates_twice() {
        // quadratic: second differences are constant 2, autocorrelation 0,
        // so the predicted second difference is 0 and the first difference
        // stays at its last value
        let history: Vec<f64> = (0..12).map(|t| (t * t) as f64).collect();
        let f = manual_arima_forecast(&history, ArimaOrder { p: 1, d: 2, q: 1 }, 2).unwrap();
        // last value 121, last first difference 21
        assert_eq!(f, vec![142.0, 163.0]);
    }

    #[test]
    fn test_rounding() {
        let history = [1.0, 1.333, 0.9, 1.41, 1.05, 1.27, 0.98, 1.3];
        let f = manual_arima_forecast(&history, ArimaOrder::default(), 3).unwrap();
        for v in f {
            assert_eq!(v, (v * 100.0).round() / 100.0);
        }
    }

    #[test]
    fn test_insufficient_history() {
        let order = ArimaOrder::default();
        assert_eq!(order.min_history(), 5);
        assert!(matches!(
            manual_arima_forecast(&[1.0, 2.0, 3.0, 4.0], order, 1),
            Err(ModelError::InsufficientData { required: 5, got: 4, .. })
        ));
        assert!(manual_arima_forecast(&[1.0, 2.0, f64::NAN, 4.0, 5.0], order, 1).is_err());
    }

    #[test]
    fn test_split() {
        let data: Vec<f64> = (0..10).map(f64::from).collect();
        let (train, test) = train_test_split(&data, 0.2).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test, &[8.0, 9.0]);
        assert!(train_test_split(&data, 1.5).is_err());
        let (train, test) = train_test_split(&data, 0.0).unwrap();
        assert_eq!((train.len(), test.len()), (10, 0));
    }

    #[test]
    fn test_walk_forward_feeds_predictions_back() {
        let data: Vec<f64> = (0..20).map(|t| 5.0 + t as f64).collect();
        let (train, test) = train_test_split(&data, 0.2).unwrap();
        let order = ArimaOrder { p: 1, d: 1, q: 0 };
        let wf = walk_forward(train, test, order).unwrap();
        // the newest difference is always 0 once predictions are fed back,
        // so every prediction repeats the last training value (20)
        assert_eq!(wf.predictions, vec![20.0; 4]);
        // errors 1, 2, 3, 4
        assert!((wf.rmse - 7.5_f64.sqrt()).abs() < 1e-12);
        assert!(walk_forward(train, &[], order).is_err());
    }
}
