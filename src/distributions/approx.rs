//! Classical limit approximations between distributions.

use super::{invalid, Binomial, DistributionError, Hypergeometric, Poisson};
use crate::special::standard_normal_cdf;

/// Poisson approximation of Binomial(n, p): λ = np.
///
/// ```
/// use u_modelkit::distributions::{binomial_to_poisson, Discrete};
/// let poi = binomial_to_poisson(1000, 0.003).unwrap();
/// assert!((poi.lambda() - 3.0).abs() < 1e-12);
/// assert!(poi.pmf(5) > 0.1);
/// ```
pub fn binomial_to_poisson(n: u64, p: f64) -> Result<Poisson, DistributionError> {
    let source = Binomial::new(n, p)?;
    Poisson::new(source.n() as f64 * source.p())
}

/// Binomial approximation of Hypergeometric(N, M, n): p = M/N.
pub fn hypergeometric_to_binomial(
    population: u64,
    successes: u64,
    draws: u64,
) -> Result<Binomial, DistributionError> {
    let source = Hypergeometric::new(population, successes, draws)?;
    Binomial::new(
        source.draws(),
        source.successes() as f64 / source.population() as f64,
    )
}

/// Lindeberg–Lévy CLT: `P(S_n ≤ x) ≈ Φ((x − nμ)/√(n·var))` for a sum of
/// `n` i.i.d. terms with mean `mu` and variance `var`.
///
/// With `var = 0` the sum is degenerate at `nμ` and the result is a step.
pub fn lindeberg_levy_cdf(x: f64, mu: f64, var: f64, n: u64) -> Result<f64, DistributionError> {
    if !var.is_finite() || var < 0.0 {
        return Err(invalid(format!("CLT requires var ≥ 0, got var={var}")));
    }
    if n == 0 {
        return Err(invalid("CLT requires n ≥ 1".into()));
    }
    let n = n as f64;
    if var == 0.0 {
        return Ok(if x >= n * mu { 1.0 } else { 0.0 });
    }
    Ok(standard_normal_cdf((x - n * mu) / (n * var).sqrt()))
}

/// De Moivre–Laplace: `P(X ≤ k)` for X ~ Binomial(n, p) with continuity
/// correction, `Φ((k + 0.5 − np)/√(np(1−p)))`.
///
/// ```
/// use u_modelkit::distributions::{de_moivre_laplace_cdf, Binomial, Discrete};
/// let approx = de_moivre_laplace_cdf(20.0, 50, 0.3).unwrap();
/// let exact = Binomial::new(50, 0.3).unwrap().cdf(20);
/// assert!((approx - exact).abs() < 0.01);
/// ```
pub fn de_moivre_laplace_cdf(k: f64, n: u64, p: f64) -> Result<f64, DistributionError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(invalid(format!("de Moivre–Laplace requires 0 < p < 1, got p={p}")));
    }
    if n == 0 {
        return Err(invalid("de Moivre–Laplace requires n ≥ 1".into()));
    }
    let n = n as f64;
    let sigma = (n * p * (1.0 - p)).sqrt();
    Ok(standard_normal_cdf((k + 0.5 - n * p) / sigma))
}
