//! Descriptive statistics over `f64` slices.
//!
//! Every summary returns `None` for empty input or input containing
//! NaN/Inf, so callers decide how to surface the failure.
//!
//! # Algorithms
//!
//! - **Sums**: Neumaier-compensated summation, error independent of n.
//! - **Moments**: two-pass (mean first, then central sums) to avoid the
//!   cancellation of `E[X²] − E[X]²`.
//! - **Skewness/kurtosis**: moment estimators `g₁ = m₃/m₂^{3/2}` and
//!   `g₂ = m₄/m₂² − 3` (NumPy/SciPy defaults with `bias=True`).

use crate::error::{ModelError, Result};

fn all_finite(data: &[f64]) -> bool {
    data.iter().all(|x| x.is_finite())
}

/// Compensated sum of `data` (Neumaier's variant of Kahan summation).
///
/// # Examples
/// ```
/// use u_modelkit::stats::kahan_sum;
/// let v = [1e16, 1.0, -1e16];
/// assert_eq!(kahan_sum(&v), 1.0);
/// ```
pub fn kahan_sum(data: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut c = 0.0_f64;
    for &x in data {
        let t = sum + x;
        if sum.abs() >= x.abs() {
            c += (sum - t) + x;
        } else {
            c += (x - t) + sum;
        }
        sum = t;
    }
    sum + c
}

/// Arithmetic mean.
///
/// ```
/// use u_modelkit::stats::mean;
/// assert_eq!(mean(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() || !all_finite(data) {
        return None;
    }
    Some(kahan_sum(data) / data.len() as f64)
}

fn sum_sq_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let dev: Vec<f64> = data.iter().map(|&x| (x - m) * (x - m)).collect();
    Some(kahan_sum(&dev))
}

/// Sample variance (denominator `n − 1`). `None` when `n < 2`.
///
/// ```
/// use u_modelkit::stats::variance;
/// let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert!((variance(&v).unwrap() - 32.0 / 7.0).abs() < 1e-12);
/// ```
pub fn variance(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    Some(sum_sq_dev(data)? / (data.len() - 1) as f64)
}

/// Population variance (denominator `n`).
pub fn population_variance(data: &[f64]) -> Option<f64> {
    Some(sum_sq_dev(data)? / data.len() as f64)
}

/// Sample standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Population standard deviation.
pub fn population_std_dev(data: &[f64]) -> Option<f64> {
    population_variance(data).map(f64::sqrt)
}

/// Smallest element; `None` if empty or any element is NaN.
pub fn min(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    data.iter().try_fold(f64::INFINITY, |acc, &x| {
        (!x.is_nan()).then(|| acc.min(x))
    })
}

/// Largest element; `None` if empty or any element is NaN.
pub fn max(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    data.iter().try_fold(f64::NEG_INFINITY, |acc, &x| {
        (!x.is_nan()).then(|| acc.max(x))
    })
}

/// Covariance of two equally long series.
///
/// `sample = true` divides by `n − 1`, otherwise by `n`.
/// Returns `None` on length mismatch, too few points, or non-finite input.
pub fn covariance(x: &[f64], y: &[f64], sample: bool) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n == 0 || (sample && n < 2) {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let prods: Vec<f64> = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).collect();
    let denom = if sample { n - 1 } else { n } as f64;
    Some(kahan_sum(&prods) / denom)
}

/// Pearson correlation coefficient.
///
/// `None` when either series has zero variance.
///
/// ```
/// use u_modelkit::stats::correlation;
/// let x = [1.0, 2.0, 3.0, 4.0];
/// let y = [2.0, 4.1, 5.9, 8.0];
/// assert!(correlation(&x, &y, true).unwrap() > 0.99);
/// ```
pub fn correlation(x: &[f64], y: &[f64], sample: bool) -> Option<f64> {
    let cov = covariance(x, y, sample)?;
    let vx = covariance(x, x, sample)?;
    let vy = covariance(y, y, sample)?;
    if vx <= 0.0 || vy <= 0.0 {
        return None;
    }
    Some((cov / (vx * vy).sqrt()).clamp(-1.0, 1.0))
}

fn central_moments(data: &[f64]) -> Option<(f64, f64, f64)> {
    let n = data.len() as f64;
    let m = mean(data)?;
    let (mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0);
    for &x in data {
        let d = x - m;
        let d2 = d * d;
        s2 += d2;
        s3 += d2 * d;
        s4 += d2 * d2;
    }
    Some((s2 / n, s3 / n, s4 / n))
}

/// Moment skewness `g₁ = m₃ / m₂^{3/2}`.
///
/// `None` for fewer than 3 points or a constant series.
pub fn skewness(data: &[f64]) -> Option<f64> {
    if data.len() < 3 {
        return None;
    }
    let (m2, m3, _) = central_moments(data)?;
    if m2 == 0.0 {
        return None;
    }
    Some(m3 / m2.powf(1.5))
}

/// Excess kurtosis `g₂ = m₄ / m₂² − 3` (0 for a normal sample in the limit).
///
/// `None` for fewer than 4 points or a constant series.
pub fn kurtosis(data: &[f64]) -> Option<f64> {
    if data.len() < 4 {
        return None;
    }
    let (m2, _, m4) = central_moments(data)?;
    if m2 == 0.0 {
        return None;
    }
    Some(m4 / (m2 * m2) - 3.0)
}

/// Lag-`lag` autocorrelation: Pearson correlation of `x[..n-lag]` with
/// `x[lag..]`.
///
/// `None` when fewer than two overlapping pairs remain or either window
/// is constant.
///
/// ```
/// use u_modelkit::stats::autocorrelation;
/// let trend: Vec<f64> = (0..20).map(f64::from).collect();
/// assert!((autocorrelation(&trend, 1).unwrap() - 1.0).abs() < 1e-12);
/// ```
pub fn autocorrelation(data: &[f64], lag: usize) -> Option<f64> {
    let n = data.len();
    if lag >= n || n - lag < 2 {
        return None;
    }
    correlation(&data[..n - lag], &data[lag..], true)
}

/// Relative frequency of `value` in `data` (exact equality).
pub fn empirical_pmf(data: &[f64], value: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let hits = data.iter().filter(|&&x| x == value).count();
    Some(hits as f64 / data.len() as f64)
}

/// Share of `data` less than or equal to `value`.
pub fn empirical_cdf(data: &[f64], value: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let hits = data.iter().filter(|&&x| x <= value).count();
    Some(hits as f64 / data.len() as f64)
}

/// Applies first differences `order` times. Each pass shortens the series
/// by one; an exhausted series yields an empty vector.
///
/// ```
/// use u_modelkit::stats::diff;
/// assert_eq!(diff(&[1.0, 4.0, 9.0, 16.0], 1), vec![3.0, 5.0, 7.0]);
/// assert_eq!(diff(&[1.0, 4.0, 9.0, 16.0], 2), vec![2.0, 2.0]);
/// ```
pub fn diff(data: &[f64], order: usize) -> Vec<f64> {
    let mut out = data.to_vec();
    for _ in 0..order {
        if out.len() < 2 {
            return Vec::new();
        }
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    out
}

// ============================================================================
// Chebyshev inequality
// ============================================================================

/// Upper bound on `P(|X − μ| ≥ ε)` given the variance: `min(1, σ²/ε²)`.
///
/// ```
/// use u_modelkit::stats::chebyshev_bound;
/// assert_eq!(chebyshev_bound(4.0, 4.0).unwrap(), 0.25);
/// assert_eq!(chebyshev_bound(4.0, 1.0).unwrap(), 1.0);
/// ```
pub fn chebyshev_bound(variance: f64, deviation: f64) -> Result<f64> {
    if !variance.is_finite() || variance < 0.0 {
        return Err(ModelError::invalid("variance", "must be finite and non-negative"));
    }
    if !deviation.is_finite() || deviation <= 0.0 {
        return Err(ModelError::invalid("deviation", "must be finite and positive"));
    }
    Ok((variance / (deviation * deviation)).min(1.0))
}

/// Upper bound on `P(|X − μ| ≥ kσ)`: `min(1, 1/k²)`.
pub fn chebyshev_bound_k(k: f64) -> Result<f64> {
    if !k.is_finite() || k <= 0.0 {
        return Err(ModelError::invalid("k", "must be finite and positive"));
    }
    Ok((1.0 / (k * k)).min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: [f64; 8] = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

    #[test]
    fn test_mean_and_variances() {
        assert_eq!(mean(&DATA), Some(5.0));
        assert!((population_variance(&DATA).unwrap() - 4.0).abs() < 1e-12);
        assert!((population_std_dev(&DATA).unwrap() - 2.0).abs() < 1e-12);
        assert!((std_dev(&DATA).unwrap() - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_finite() {
        assert_eq!(mean(&[1.0, f64::NAN]), None);
        assert_eq!(variance(&[1.0, f64::INFINITY, 2.0]), None);
        assert_eq!(variance(&[1.0]), None);
        assert_eq!(min(&[1.0, f64::NAN]), None);
        assert_eq!(max(&[]), None);
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min(&DATA), Some(2.0));
        assert_eq!(max(&DATA), Some(9.0));
        assert_eq!(max(&[-1.0, f64::NEG_INFINITY]), Some(-1.0));
    }

    #[test]
    fn test_large_offset_variance() {
        let shifted: Vec<f64> = DATA.iter().map(|x| x + 1e9).collect();
        assert!((population_variance(&shifted).unwrap() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_covariance_and_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [10.0, 8.0, 6.0, 4.0, 2.0];
        assert!((covariance(&x, &y, true).unwrap() + 5.0).abs() < 1e-12);
        assert!((covariance(&x, &y, false).unwrap() + 4.0).abs() < 1e-12);
        assert!((correlation(&x, &y, true).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(correlation(&x, &[3.0; 5], true), None);
        assert_eq!(covariance(&x, &y[..3], true), None);
    }

    #[test]
    fn test_skewness_kurtosis() {
        assert!(skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap().abs() < 1e-14);
        assert!(skewness(&[1.0, 2.0, 3.0, 4.0, 50.0]).unwrap() > 0.0);
        // two-point symmetric distribution: m4/m2² = 1
        let k = kurtosis(&[-1.0, 1.0, -1.0, 1.0]).unwrap();
        assert!((k + 2.0).abs() < 1e-12);
        assert_eq!(kurtosis(&[2.0; 6]), None);
        assert_eq!(skewness(&[1.0, 2.0]), None);
    }

    #[test]
    fn test_autocorrelation() {
        let alternating = [1.0, -1.0, 1.0, -1.0, 1.0, -1.0];
        assert!((autocorrelation(&alternating, 1).unwrap() + 1.0).abs() < 1e-12);
        assert!((autocorrelation(&alternating, 2).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(autocorrelation(&alternating, 5), None);
        assert_eq!(autocorrelation(&alternating, 9), None);
    }

    #[test]
    fn test_empirical_distribution() {
        let rolls = [1.0, 2.0, 2.0, 3.0, 6.0];
        assert_eq!(empirical_pmf(&rolls, 2.0), Some(0.4));
        assert_eq!(empirical_cdf(&rolls, 2.5), Some(0.6));
        assert_eq!(empirical_cdf(&rolls, 0.0), Some(0.0));
        assert_eq!(empirical_pmf(&[], 1.0), None);
    }

    #[test]
    fn test_diff_orders() {
        let x = [5.0, 7.0, 4.0];
        assert_eq!(diff(&x, 0), x.to_vec());
        assert_eq!(diff(&x, 2), vec![-5.0]);
        assert!(diff(&x, 3).is_empty());
        assert!(diff(&x, 7).is_empty());
    }

    #[test]
    fn test_chebyshev() {
        assert_eq!(chebyshev_bound_k(2.0).unwrap(), 0.25);
        assert_eq!(chebyshev_bound_k(0.5).unwrap(), 1.0);
        assert!(chebyshev_bound_k(0.0).is_err());
        assert!(chebyshev_bound(-1.0, 1.0).is_err());
        assert!(matches!(
            chebyshev_bound(1.0, 0.0),
            Err(ModelError::InvalidParameter { name: "deviation", .. })
        ));
    }
}
