//! Continuous distributions.

use std::fmt;

use super::{invalid, Continuous, DistributionError, Moments};
use crate::special::{
    choose, inverse_normal_cdf, ln_beta, ln_gamma, regularized_beta, regularized_gamma_p,
    standard_normal_cdf, standard_normal_pdf,
};

/// (m − 1)!! for even `m`, i.e. E[Zᵐ] of a standard normal.
fn normal_even_moment(m: u32) -> f64 {
    (1..m).step_by(2).map(f64::from).product()
}

/// Inverts a monotone cdf on `[lo, hi]` by bisection.
fn bisect_quantile(cdf: impl Fn(f64) -> f64, p: f64, mut lo: f64, mut hi: f64) -> f64 {
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if cdf(mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= 1e-15 * hi.abs() {
            break;
        }
    }
    0.5 * (lo + hi)
}

// ============================================================================
// Normal
// ============================================================================

/// Normal (Gaussian) distribution N(μ, σ²).
#[derive(Debug, Clone, PartialEq)]
pub struct Normal {
    mu: f64,
    sigma: f64,
}

impl Normal {
    /// # Errors
    /// Returns `Err` if `σ ≤ 0` or either parameter is not finite.
    pub fn new(mu: f64, sigma: f64) -> Result<Self, DistributionError> {
        if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
            return Err(invalid(format!(
                "Normal requires finite μ and σ > 0, got μ={mu}, σ={sigma}"
            )));
        }
        Ok(Self { mu, sigma })
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Moments for Normal {
    fn mean(&self) -> f64 {
        self.mu
    }

    fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }

    fn skewness(&self) -> f64 {
        0.0
    }

    fn excess_kurtosis(&self) -> f64 {
        0.0
    }

    /// E[Xᵐ] = Σ_{j even} C(m, j) μ^{m−j} σʲ (j−1)!!
    fn raw_moment(&self, m: u32) -> f64 {
        (0..=m)
            .step_by(2)
            .map(|j| {
                choose(m as u64, j as u64)
                    * self.mu.powi((m - j) as i32)
                    * self.sigma.powi(j as i32)
                    * normal_even_moment(j)
            })
            .sum()
    }

    fn central_moment(&self, m: u32) -> f64 {
        if m % 2 == 1 {
            0.0
        } else {
            self.sigma.powi(m as i32) * normal_even_moment(m)
        }
    }
}

impl Continuous for Normal {
    fn pdf(&self, x: f64) -> f64 {
        standard_normal_pdf((x - self.mu) / self.sigma) / self.sigma
    }

    fn cdf(&self, x: f64) -> f64 {
        standard_normal_cdf((x - self.mu) / self.sigma)
    }

    fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&p) {
            return None;
        }
        Some(self.mu + self.sigma * inverse_normal_cdf(p))
    }
}

impl fmt::Display for Normal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Normal(μ={}, σ={})", self.mu, self.sigma)
    }
}

// ============================================================================
// Uniform
// ============================================================================

/// Continuous uniform distribution on `[a, b]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    a: f64,
    b: f64,
}

impl Uniform {
    /// # Errors
    /// Returns `Err` if `a ≥ b` or either bound is not finite.
    pub fn new(a: f64, b: f64) -> Result<Self, DistributionError> {
        if !a.is_finite() || !b.is_finite() || a >= b {
            return Err(invalid(format!("Uniform requires a < b, got a={a}, b={b}")));
        }
        Ok(Self { a, b })
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }
}

impl Moments for Uniform {
    fn mean(&self) -> f64 {
        0.5 * (self.a + self.b)
    }

    fn variance(&self) -> f64 {
        let w = self.b - self.a;
        w * w / 12.0
    }

    fn skewness(&self) -> f64 {
        0.0
    }

    fn excess_kurtosis(&self) -> f64 {
        -1.2
    }

    /// (b^{m+1} − a^{m+1}) / ((m+1)(b − a))
    fn raw_moment(&self, m: u32) -> f64 {
        let e = m as i32 + 1;
        (self.b.powi(e) - self.a.powi(e)) / (e as f64 * (self.b - self.a))
    }

    fn central_moment(&self, m: u32) -> f64 {
        if m % 2 == 1 {
            return 0.0;
        }
        let half = 0.5 * (self.b - self.a);
        half.powi(m as i32) / (m as f64 + 1.0)
    }
}

impl Continuous for Uniform {
    fn pdf(&self, x: f64) -> f64 {
        if x >= self.a && x <= self.b {
            1.0 / (self.b - self.a)
        } else {
            0.0
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        ((x - self.a) / (self.b - self.a)).clamp(0.0, 1.0)
    }

    fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&p) {
            return None;
        }
        Some(self.a + p * (self.b - self.a))
    }
}

impl fmt::Display for Uniform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uniform(a={}, b={})", self.a, self.b)
    }
}

// ============================================================================
// Exponential
// ============================================================================

/// Exponential distribution with rate λ.
#[derive(Debug, Clone, PartialEq)]
pub struct Exponential {
    lambda: f64,
}

impl Exponential {
    /// # Errors
    /// Returns `Err` unless `λ` is finite and positive.
    pub fn new(lambda: f64) -> Result<Self, DistributionError> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(invalid(format!("Exponential requires λ > 0, got λ={lambda}")));
        }
        Ok(Self { lambda })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl Moments for Exponential {
    fn mean(&self) -> f64 {
        1.0 / self.lambda
    }

    fn variance(&self) -> f64 {
        1.0 / (self.lambda * self.lambda)
    }

    fn skewness(&self) -> f64 {
        2.0
    }

    fn excess_kurtosis(&self) -> f64 {
        6.0
    }

    /// m! / λᵐ
    fn raw_moment(&self, m: u32) -> f64 {
        (1..=m).map(|i| f64::from(i) / self.lambda).product()
    }
}

impl Continuous for Exponential {
    fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            0.0
        } else {
            self.lambda * (-self.lambda * x).exp()
        }
    }

    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            0.0
        } else {
            -(-self.lambda * x).exp_m1()
        }
    }

    fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&p) {
            return None;
        }
        Some(-(-p).ln_1p() / self.lambda)
    }
}

impl fmt::Display for Exponential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exponential(λ={})", self.lambda)
    }
}

// ============================================================================
// Gamma
// ============================================================================

/// Gamma distribution with shape `k` and rate `λ`.
///
/// `Gamma(1, λ)` is `Exponential(λ)`; `Gamma(ν/2, 1/2)` is χ²(ν).
#[derive(Debug, Clone, PartialEq)]
pub struct Gamma {
    shape: f64,
    rate: f64,
}

impl Gamma {
    /// # Errors
    /// Returns `Err` unless both parameters are finite and positive.
    pub fn new(shape: f64, rate: f64) -> Result<Self, DistributionError> {
        if !shape.is_finite() || !rate.is_finite() || shape <= 0.0 || rate <= 0.0 {
            return Err(invalid(format!(
                "Gamma requires k > 0 and λ > 0, got k={shape}, λ={rate}"
            )));
        }
        Ok(Self { shape, rate })
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Moments for Gamma {
    fn mean(&self) -> f64 {
        self.shape / self.rate
    }

    fn variance(&self) -> f64 {
        self.shape / (self.rate * self.rate)
    }

    fn skewness(&self) -> f64 {
        2.0 / self.shape.sqrt()
    }

    fn excess_kurtosis(&self) -> f64 {
        6.0 / self.shape
    }

    /// k(k+1)…(k+m−1) / λᵐ
    fn raw_moment(&self, m: u32) -> f64 {
        (0..m)
            .map(|i| (self.shape + f64::from(i)) / self.rate)
            .product()
    }
}

impl Continuous for Gamma {
    fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            return 0.0;
        }
        if x == 0.0 {
            return match self.shape.partial_cmp(&1.0) {
                Some(std::cmp::Ordering::Less) => f64::INFINITY,
                Some(std::cmp::Ordering::Equal) => self.rate,
                _ => 0.0,
            };
        }
        let (k, l) = (self.shape, self.rate);
        ((k - 1.0) * x.ln() - l * x + k * l.ln() - ln_gamma(k)).exp()
    }

    /// `P(k, λx)`.
    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        regularized_gamma_p(self.shape, self.rate * x)
    }

    fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&p) {
            return None;
        }
        if p == 0.0 {
            return Some(0.0);
        }
        if p == 1.0 {
            return Some(f64::INFINITY);
        }
        let mut hi = self.mean() + 10.0 * self.std_dev();
        while self.cdf(hi) < p {
            hi *= 2.0;
        }
        Some(bisect_quantile(|x| self.cdf(x), p, 0.0, hi))
    }
}

impl fmt::Display for Gamma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gamma(k={}, λ={})", self.shape, self.rate)
    }
}

// ============================================================================
// Beta
// ============================================================================

/// Beta distribution on `[0, 1]` with shapes α, β.
#[derive(Debug, Clone, PartialEq)]
pub struct Beta {
    alpha: f64,
    beta: f64,
}

impl Beta {
    /// # Errors
    /// Returns `Err` unless both shapes are finite and positive.
    pub fn new(alpha: f64, beta: f64) -> Result<Self, DistributionError> {
        if !alpha.is_finite() || !beta.is_finite() || alpha <= 0.0 || beta <= 0.0 {
            return Err(invalid(format!(
                "Beta requires α > 0 and β > 0, got α={alpha}, β={beta}"
            )));
        }
        Ok(Self { alpha, beta })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl Moments for Beta {
    fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    fn variance(&self) -> f64 {
        let s = self.alpha + self.beta;
        self.alpha * self.beta / (s * s * (s + 1.0))
    }

    fn skewness(&self) -> f64 {
        let (a, b) = (self.alpha, self.beta);
        2.0 * (b - a) * (a + b + 1.0).sqrt() / ((a + b + 2.0) * (a * b).sqrt())
    }

    fn excess_kurtosis(&self) -> f64 {
        let (a, b) = (self.alpha, self.beta);
        let num = 6.0 * ((a - b).powi(2) * (a + b + 1.0) - a * b * (a + b + 2.0));
        num / (a * b * (a + b + 2.0) * (a + b + 3.0))
    }

    /// Π_{i<m} (α+i)/(α+β+i)
    fn raw_moment(&self, m: u32) -> f64 {
        (0..m)
            .map(|i| {
                let i = f64::from(i);
                (self.alpha + i) / (self.alpha + self.beta + i)
            })
            .product()
    }
}

impl Continuous for Beta {
    fn pdf(&self, x: f64) -> f64 {
        let (a, b) = (self.alpha, self.beta);
        if !(0.0..=1.0).contains(&x) {
            return 0.0;
        }
        // boundary densities follow the exponent of the vanishing factor
        let edge = |shape: f64, other: f64| -> f64 {
            if shape < 1.0 {
                f64::INFINITY
            } else if shape == 1.0 {
                other
            } else {
                0.0
            }
        };
        if x == 0.0 {
            return edge(a, b);
        }
        if x == 1.0 {
            return edge(b, a);
        }
        ((a - 1.0) * x.ln() + (b - 1.0) * (-x).ln_1p() - ln_beta(a, b)).exp()
    }

    /// `I_x(α, β)`.
    fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            0.0
        } else if x >= 1.0 {
            1.0
        } else {
            regularized_beta(x, self.alpha, self.beta)
        }
    }

    fn quantile(&self, p: f64) -> Option<f64> {
        if !(0.0..=1.0).contains(&p) {
            return None;
        }
        if p == 0.0 || p == 1.0 {
            return Some(p);
        }
        Some(bisect_quantile(|x| self.cdf(x), p, 0.0, 1.0))
    }
}

impl fmt::Display for Beta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Beta(α={}, β={})", self.alpha, self.beta)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn gamma_quantile_inverts_cdf(k in 0.2_f64..20.0, rate in 0.1_f64..5.0, p in 0.01_f64..0.99) {
            let g = Gamma::new(k, rate).unwrap();
            let x = g.quantile(p).unwrap();
            prop_assert!((g.cdf(x) - p).abs() < 1e-8, "cdf(q({p})) = {}", g.cdf(x));
        }

        #[test]
        fn beta_cdf_monotone(a in 0.3_f64..10.0, b in 0.3_f64..10.0, x in 0.0_f64..1.0, y in 0.0_f64..1.0) {
            let d = Beta::new(a, b).unwrap();
            let (lo, hi) = if x <= y { (x, y) } else { (y, x) };
            let (c_lo, c_hi) = (d.cdf(lo), d.cdf(hi));
            prop_assert!((0.0..=1.0).contains(&c_lo) && (0.0..=1.0).contains(&c_hi));
            prop_assert!(c_lo <= c_hi + 1e-12);
        }

        #[test]
        fn normal_quantile_roundtrip(mu in -100.0_f64..100.0, sigma in 0.01_f64..50.0, p in 0.001_f64..0.999) {
            let n = Normal::new(mu, sigma).unwrap();
            let x = n.quantile(p).unwrap();
            prop_assert!((n.cdf(x) - p).abs() < 1e-9);
        }
    }
}
