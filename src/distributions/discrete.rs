//! Discrete distributions on the non-negative integers.

use std::fmt;

use super::{invalid, Discrete, DistributionError, Moments, QUANTILE_TAIL};
use crate::special::{ln_choose, ln_factorial, regularized_beta, regularized_gamma_q};

/// Relative pmf size at which a support sum stops in each direction.
const TAIL_MASS: f64 = 1e-20;
const MAX_TERMS: u64 = 10_000_000;

/// Σ f(k)·P(X = k), summed outward from the mean.
///
/// Each direction stops at the end of the support or once the pmf falls
/// below [`TAIL_MASS`] times the largest term seen. Returns NaN when either
/// direction runs out of its [`MAX_TERMS`] budget first.
fn support_sum<D: Discrete + ?Sized>(d: &D, f: impl Fn(f64) -> f64) -> f64 {
    let (lo, hi) = d.support();
    let top = hi.unwrap_or(u64::MAX);
    let start = (d.mean().max(0.0).floor() as u64).clamp(lo, top);
    let mut total = 0.0;
    let mut peak = 0.0_f64;

    let mut k = start;
    let mut terms = 0;
    loop {
        let p = d.pmf(k);
        peak = peak.max(p);
        if p > 0.0 {
            total += f(k as f64) * p;
        }
        if k == top || (k > start && p <= TAIL_MASS * peak) {
            break;
        }
        terms += 1;
        if terms >= MAX_TERMS {
            tracing::warn!(start, terms, "support sum did not reach the upper tail");
            return f64::NAN;
        }
        k += 1;
    }

    let mut k = start;
    let mut terms = 0;
    while k > lo {
        k -= 1;
        let p = d.pmf(k);
        peak = peak.max(p);
        if p > 0.0 {
            total += f(k as f64) * p;
        }
        if p <= TAIL_MASS * peak {
            break;
        }
        terms += 1;
        if terms >= MAX_TERMS {
            tracing::warn!(start, terms, "support sum did not reach the lower tail");
            return f64::NAN;
        }
    }
    total
}

// ============================================================================
// Binomial
// ============================================================================

/// Number of successes in `n` independent Bernoulli(p) trials.
///
/// Skewness and kurtosis are NaN/∞ at the degenerate `p ∈ {0, 1}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binomial {
    n: u64,
    p: f64,
}

impl Binomial {
    /// # Errors
    /// Returns `Err` if `n = 0` or `p ∉ [0, 1]`.
    pub fn new(n: u64, p: f64) -> Result<Self, DistributionError> {
        if n == 0 {
            return Err(invalid("Binomial requires n ≥ 1, got n=0".into()));
        }
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(invalid(format!("Binomial requires 0 ≤ p ≤ 1, got p={p}")));
        }
        Ok(Self { n, p })
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Moments for Binomial {
    fn mean(&self) -> f64 {
        self.n as f64 * self.p
    }

    fn variance(&self) -> f64 {
        self.n as f64 * self.p * (1.0 - self.p)
    }

    fn skewness(&self) -> f64 {
        (1.0 - 2.0 * self.p) / self.variance().sqrt()
    }

    fn excess_kurtosis(&self) -> f64 {
        let pq = self.p * (1.0 - self.p);
        (1.0 - 6.0 * pq) / (self.n as f64 * pq)
    }

    fn raw_moment(&self, m: u32) -> f64 {
        support_sum(self, |k| k.powi(m as i32))
    }

    fn central_moment(&self, m: u32) -> f64 {
        let mu = self.mean();
        support_sum(self, |k| (k - mu).powi(m as i32))
    }
}

impl Discrete for Binomial {
    fn pmf(&self, k: u64) -> f64 {
        if k > self.n {
            return 0.0;
        }
        if self.p == 0.0 {
            return if k == 0 { 1.0 } else { 0.0 };
        }
        if self.p == 1.0 {
            return if k == self.n { 1.0 } else { 0.0 };
        }
        let (k_f, n_f) = (k as f64, self.n as f64);
        (ln_choose(self.n, k) + k_f * self.p.ln() + (n_f - k_f) * (-self.p).ln_1p()).exp()
    }

    /// `P(X ≤ k) = I_{1−p}(n − k, k + 1)`.
    fn cdf(&self, k: u64) -> f64 {
        if k >= self.n || self.p == 0.0 {
            return 1.0;
        }
        if self.p == 1.0 {
            return 0.0;
        }
        regularized_beta(1.0 - self.p, (self.n - k) as f64, (k + 1) as f64)
    }

    fn support(&self) -> (u64, Option<u64>) {
        (0, Some(self.n))
    }
}

impl fmt::Display for Binomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binomial(n={}, p={})", self.n, self.p)
    }
}

// ============================================================================
// Poisson
// ============================================================================

/// Poisson distribution with rate λ.
#[derive(Debug, Clone, PartialEq)]
pub struct Poisson {
    lambda: f64,
}

impl Poisson {
    /// # Errors
    /// Returns `Err` unless `λ` is finite and positive.
    pub fn new(lambda: f64) -> Result<Self, DistributionError> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(invalid(format!("Poisson requires λ > 0, got λ={lambda}")));
        }
        Ok(Self { lambda })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }
}

impl Moments for Poisson {
    fn mean(&self) -> f64 {
        self.lambda
    }

    fn variance(&self) -> f64 {
        self.lambda
    }

    fn skewness(&self) -> f64 {
        1.0 / self.lambda.sqrt()
    }

    fn excess_kurtosis(&self) -> f64 {
        1.0 / self.lambda
    }

    /// Touchard polynomial `Σⱼ S(m, j)·λʲ` with Stirling numbers of the
    /// second kind.
    fn raw_moment(&self, m: u32) -> f64 {
        let mut stirling = vec![1.0];
        for n in 1..=m as usize {
            let mut next = vec![0.0; n + 1];
            for j in 1..=n {
                next[j] = j as f64 * stirling.get(j).copied().unwrap_or(0.0) + stirling[j - 1];
            }
            stirling = next;
        }
        stirling
            .iter()
            .enumerate()
            .map(|(j, s)| s * self.lambda.powi(j as i32))
            .sum()
    }

    fn central_moment(&self, m: u32) -> f64 {
        let l = self.lambda;
        match m {
            0 => 1.0,
            1 => 0.0,
            2 | 3 => l,
            4 => 3.0 * l * l + l,
            _ => support_sum(self, |k| (k - l).powi(m as i32)),
        }
    }
}

impl Discrete for Poisson {
    fn pmf(&self, k: u64) -> f64 {
        (k as f64 * self.lambda.ln() - self.lambda - ln_factorial(k)).exp()
    }

    /// `P(X ≤ k) = Q(k + 1, λ)`.
    fn cdf(&self, k: u64) -> f64 {
        regularized_gamma_q(k as f64 + 1.0, self.lambda)
    }

    fn support(&self) -> (u64, Option<u64>) {
        (0, None)
    }
}

impl fmt::Display for Poisson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Poisson(λ={})", self.lambda)
    }
}

// ============================================================================
// Hypergeometric
// ============================================================================

/// Successes among `n` draws without replacement from a population of `N`
/// items of which `M` are successes.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypergeometric {
    population: u64,
    successes: u64,
    draws: u64,
}

impl Hypergeometric {
    /// # Errors
    /// Returns `Err` if `N = 0`, `M > N` or `n > N`.
    pub fn new(population: u64, successes: u64, draws: u64) -> Result<Self, DistributionError> {
        if population == 0 {
            return Err(invalid("Hypergeometric requires N ≥ 1".into()));
        }
        if successes > population || draws > population {
            return Err(invalid(format!(
                "Hypergeometric requires M ≤ N and n ≤ N, got N={population}, M={successes}, n={draws}"
            )));
        }
        Ok(Self {
            population,
            successes,
            draws,
        })
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }
}

impl Moments for Hypergeometric {
    fn mean(&self) -> f64 {
        self.draws as f64 * self.successes as f64 / self.population as f64
    }

    fn variance(&self) -> f64 {
        if self.population == 1 {
            return 0.0;
        }
        let (big_n, n) = (self.population as f64, self.draws as f64);
        let frac = self.successes as f64 / big_n;
        n * frac * (1.0 - frac) * (big_n - n) / (big_n - 1.0)
    }

    fn skewness(&self) -> f64 {
        self.central_moment(3) / self.std_dev().powi(3)
    }

    fn excess_kurtosis(&self) -> f64 {
        let var = self.variance();
        self.central_moment(4) / (var * var) - 3.0
    }

    fn raw_moment(&self, m: u32) -> f64 {
        support_sum(self, |k| k.powi(m as i32))
    }

    fn central_moment(&self, m: u32) -> f64 {
        let mu = self.mean();
        support_sum(self, |k| (k - mu).powi(m as i32))
    }
}

impl Discrete for Hypergeometric {
    fn pmf(&self, k: u64) -> f64 {
        let (lo, hi) = self.support();
        let hi = hi.unwrap_or(lo);
        if k < lo || k > hi {
            return 0.0;
        }
        let (big_n, m, n) = (self.population, self.successes, self.draws);
        (ln_choose(m, k) + ln_choose(big_n - m, n - k) - ln_choose(big_n, n)).exp()
    }

    fn cdf(&self, k: u64) -> f64 {
        let (lo, hi) = self.support();
        let hi = hi.unwrap_or(lo);
        if k < lo {
            return 0.0;
        }
        if k >= hi {
            return 1.0;
        }
        (lo..=k).map(|i| self.pmf(i)).sum::<f64>().min(1.0)
    }

    fn support(&self) -> (u64, Option<u64>) {
        let lo = (self.draws + self.successes).saturating_sub(self.population);
        (lo, Some(self.draws.min(self.successes)))
    }
}

impl fmt::Display for Hypergeometric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hypergeometric(N={}, M={}, n={})",
            self.population, self.successes, self.draws
        )
    }
}

// ============================================================================
// Geometric
// ============================================================================

/// Number of Bernoulli(p) trials up to and including the first success
/// (support 1, 2, …).
#[derive(Debug, Clone, PartialEq)]
pub struct Geometric {
    p: f64,
}

impl Geometric {
    /// # Errors
    /// Returns `Err` unless `0 < p ≤ 1`.
    pub fn new(p: f64) -> Result<Self, DistributionError> {
        if !p.is_finite() || p <= 0.0 || p > 1.0 {
            return Err(invalid(format!("Geometric requires 0 < p ≤ 1, got p={p}")));
        }
        Ok(Self { p })
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Moments for Geometric {
    fn mean(&self) -> f64 {
        1.0 / self.p
    }

    fn variance(&self) -> f64 {
        (1.0 - self.p) / (self.p * self.p)
    }

    fn skewness(&self) -> f64 {
        (2.0 - self.p) / (1.0 - self.p).sqrt()
    }

    fn excess_kurtosis(&self) -> f64 {
        6.0 + self.p * self.p / (1.0 - self.p)
    }

    fn raw_moment(&self, m: u32) -> f64 {
        let p = self.p;
        match m {
            0 => 1.0,
            1 => 1.0 / p,
            2 => (2.0 - p) / p.powi(2),
            3 => (p * p - 6.0 * p + 6.0) / p.powi(3),
            4 => (2.0 - p) * (p * p - 12.0 * p + 12.0) / p.powi(4),
            _ => support_sum(self, |k| k.powi(m as i32)),
        }
    }

    fn central_moment(&self, m: u32) -> f64 {
        let p = self.p;
        match m {
            0 => 1.0,
            1 => 0.0,
            2 => self.variance(),
            3 => (1.0 - p) * (2.0 - p) / p.powi(3),
            4 => (1.0 - p) * (p * p - 9.0 * p + 9.0) / p.powi(4),
            _ => {
                let mu = self.mean();
                support_sum(self, |k| (k - mu).powi(m as i32))
            }
        }
    }
}

impl Discrete for Geometric {
    /// `p·(1 − p)^{k−1}`, evaluated through `ln(1 − p)` so tiny `p` keeps
    /// its precision.
    fn pmf(&self, k: u64) -> f64 {
        match k {
            0 => 0.0,
            1 => self.p,
            _ => ((k - 1) as f64 * (-self.p).ln_1p()).exp() * self.p,
        }
    }

    /// `1 − (1 − p)^k`.
    fn cdf(&self, k: u64) -> f64 {
        if k == 0 {
            return 0.0;
        }
        -(k as f64 * (-self.p).ln_1p()).exp_m1()
    }

    /// Closed form `⌈ln(1 − q) / ln(1 − p)⌉`, saturating at `u64::MAX`.
    fn quantile(&self, q: f64) -> Option<u64> {
        if !(0.0..=1.0).contains(&q) {
            return None;
        }
        let q = q.min(1.0 - QUANTILE_TAIL);
        let estimate = ((-q).ln_1p() / (-self.p).ln_1p()).ceil();
        let mut k = (estimate as u64).max(1);
        if k > 1 && self.cdf(k - 1) >= q {
            k -= 1;
        } else if self.cdf(k) < q {
            k = k.saturating_add(1);
        }
        Some(k)
    }

    fn support(&self) -> (u64, Option<u64>) {
        (1, None)
    }
}

impl fmt::Display for Geometric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Geometric(p={})", self.p)
    }
}
