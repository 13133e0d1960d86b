//! Probability distributions.
//!
//! Nine textbook distributions with closed-form moments, cdf and quantile
//! evaluation, plus the classical approximations between them.
//!
//! # Supported Distributions
//!
//! | Distribution | Parameters | Mean | Variance |
//! |---|---|---|---|
//! | [`Binomial`] | n, p | np | np(1−p) |
//! | [`Poisson`] | λ | λ | λ |
//! | [`Hypergeometric`] | N, M, n | nM/N | n(M/N)(1−M/N)(N−n)/(N−1) |
//! | [`Geometric`] | p | 1/p | (1−p)/p² |
//! | [`Normal`] | μ, σ | μ | σ² |
//! | [`Uniform`] | a, b | (a+b)/2 | (b−a)²/12 |
//! | [`Exponential`] | λ | 1/λ | 1/λ² |
//! | [`Gamma`] | k, λ (rate) | k/λ | k/λ² |
//! | [`Beta`] | α, β | α/(α+β) | αβ/((α+β)²(α+β+1)) |
//!
//! Moments are exposed through the [`Moments`] trait; evaluation through
//! [`Discrete`] or [`Continuous`].
//!
//! # Examples
//! ```
//! use u_modelkit::distributions::{Binomial, Discrete, Moments};
//!
//! let b = Binomial::new(10, 0.3).unwrap();
//! assert!((b.mean() - 3.0).abs() < 1e-12);
//! assert_eq!(b.quantile(0.5), Some(3));
//! println!("{b}: {}", b.summary());
//! ```

mod approx;
mod continuous;
mod discrete;

pub use approx::{
    binomial_to_poisson, de_moivre_laplace_cdf, hypergeometric_to_binomial, lindeberg_levy_cdf,
};
pub use continuous::{Beta, Exponential, Gamma, Normal, Uniform};
pub use discrete::{Binomial, Geometric, Hypergeometric, Poisson};

use std::fmt;

use crate::special::choose;

/// Tail mass left beyond `quantile(1.0)` on unbounded supports.
pub(crate) const QUANTILE_TAIL: f64 = 1e-12;

/// Error type for invalid distribution parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistributionError {
    /// Parameters violate distribution constraints.
    #[error("invalid distribution parameters: {0}")]
    InvalidParameters(String),
}

pub(crate) fn invalid(msg: String) -> DistributionError {
    DistributionError::InvalidParameters(msg)
}

// ============================================================================
// Traits
// ============================================================================

/// Moment-based characteristics shared by every distribution.
pub trait Moments {
    fn mean(&self) -> f64;

    fn variance(&self) -> f64;

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// σ/μ, or `+∞` when the mean is zero.
    fn coef_variation(&self) -> f64 {
        let mu = self.mean();
        if mu == 0.0 {
            f64::INFINITY
        } else {
            self.std_dev() / mu
        }
    }

    /// E[(X−μ)³]/σ³.
    fn skewness(&self) -> f64;

    /// Kurtosis minus 3 (0 for the normal distribution).
    fn excess_kurtosis(&self) -> f64;

    /// E[(X−μ)⁴]/σ⁴.
    fn kurtosis(&self) -> f64 {
        self.excess_kurtosis() + 3.0
    }

    /// E[Xᵐ].
    fn raw_moment(&self, m: u32) -> f64;

    /// E[(X−μ)ᵐ], expanded binomially from the raw moments.
    fn central_moment(&self, m: u32) -> f64 {
        let mu = self.mean();
        (0..=m)
            .map(|j| {
                choose(m as u64, j as u64) * self.raw_moment(j) * (-mu).powi((m - j) as i32)
            })
            .sum()
    }

    /// All summary characteristics at once.
    fn summary(&self) -> MomentSummary {
        MomentSummary {
            mean: self.mean(),
            variance: self.variance(),
            std_dev: self.std_dev(),
            coef_variation: self.coef_variation(),
            skewness: self.skewness(),
            kurtosis: self.kurtosis(),
        }
    }
}

/// A distribution over non-negative integers.
pub trait Discrete: Moments {
    /// P(X = k).
    fn pmf(&self, k: u64) -> f64;

    /// P(X ≤ k).
    fn cdf(&self, k: u64) -> f64;

    /// Smallest and largest value with non-zero mass (`None` = unbounded).
    fn support(&self) -> (u64, Option<u64>);

    /// Smallest `k` with `P(X ≤ k) ≥ q`.
    ///
    /// Returns `None` if `q` is outside `[0, 1]`. On unbounded supports `q`
    /// is capped at `1 − 1e-12`, so `q = 1` gives the point where the
    /// remaining tail mass drops below 1e-12.
    ///
    /// The answer is bracketed by doubling steps from the lower end of the
    /// support and then bisected, so only `O(log k)` cdf evaluations are
    /// needed.
    fn quantile(&self, q: f64) -> Option<u64> {
        if !(0.0..=1.0).contains(&q) {
            return None;
        }
        let (lo, hi) = self.support();
        let target = if hi.is_none() { q.min(1.0 - QUANTILE_TAIL) } else { q };
        if self.cdf(lo) >= target {
            return Some(lo);
        }
        // cdf(below) < target throughout
        let mut below = lo;
        let mut step = 1_u64;
        let mut above = loop {
            let candidate = below.saturating_add(step);
            let candidate = hi.map_or(candidate, |h| candidate.min(h));
            if hi == Some(candidate) || candidate == u64::MAX || self.cdf(candidate) >= target {
                break candidate;
            }
            below = candidate;
            step = step.saturating_mul(2);
        };
        while above - below > 1 {
            let mid = below + (above - below) / 2;
            if self.cdf(mid) >= target {
                above = mid;
            } else {
                below = mid;
            }
        }
        Some(above)
    }
}

/// A distribution over the real line.
pub trait Continuous: Moments {
    fn pdf(&self, x: f64) -> f64;

    fn cdf(&self, x: f64) -> f64;

    /// Inverse cdf. `None` if `p` is outside `[0, 1]`.
    fn quantile(&self, p: f64) -> Option<f64>;
}

// ============================================================================
// Summary
// ============================================================================

/// Snapshot of a distribution's headline characteristics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentSummary {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub coef_variation: f64,
    pub skewness: f64,
    /// Non-excess kurtosis.
    pub kurtosis: f64,
}

impl fmt::Display for MomentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mean={:.6}, variance={:.6}, cv={:.6}, skewness={:.6}, kurtosis={:.6}",
            self.mean, self.variance, self.coef_variation, self.skewness, self.kurtosis
        )
    }
}
