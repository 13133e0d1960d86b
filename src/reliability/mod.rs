//! System reliability.
//!
//! Closed-form reliability of series, parallel and k-out-of-n (voting)
//! systems, Pólya urn sampling probabilities, and reliability of arbitrary
//! two-terminal component networks.
//!
//! Components are described by their **failure** probabilities; every
//! function returns the probability that the system works.
//!
//! # Examples
//! ```
//! use u_modelkit::reliability::{k_out_of_n, parallel, series, FailureRates, VoteThreshold};
//!
//! let r = series(3, &FailureRates::Uniform(0.1)).unwrap();
//! assert!((r - 0.729).abs() < 1e-12);
//!
//! let r = parallel(3, &FailureRates::PerComponent(vec![0.9, 0.8, 0.7])).unwrap();
//! assert!((r - 0.496).abs() < 1e-12);
//!
//! let r = k_out_of_n(3, 0.1, VoteThreshold::Count(2)).unwrap();
//! assert!((r - 0.972).abs() < 1e-12);
//! ```

mod network;
mod urn;

pub use network::{Network, ReliabilityEstimate, MAX_EXACT_COMPONENTS};
pub use urn::{
    urn_contagion, urn_safety, urn_with_replacement, urn_without_replacement, SafetyBreakdown,
    UrnDraw, MAX_SAFETY_ORDERINGS,
};

use crate::error::{ModelError, Result};
use crate::special::choose;

/// Failure probabilities of the components of a system.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureRates {
    /// Every component fails with the same probability.
    Uniform(f64),
    /// One failure probability per component.
    PerComponent(Vec<f64>),
}

impl FailureRates {
    /// Expands to one validated probability per component.
    ///
    /// # Errors
    /// `InvalidParameter` for `num = 0` or a probability outside `[0, 1]`,
    /// `DimensionMismatch` when a per-component list has the wrong length.
    pub fn resolve(&self, num: usize) -> Result<Vec<f64>> {
        if num == 0 {
            return Err(ModelError::invalid("num", "a system needs at least one component"));
        }
        let rates = match self {
            FailureRates::Uniform(p) => vec![*p; num],
            FailureRates::PerComponent(ps) => {
                if ps.len() != num {
                    return Err(ModelError::mismatch("failure rates", num, ps.len()));
                }
                ps.clone()
            }
        };
        if let Some(bad) = rates.iter().find(|p| !(0.0..=1.0).contains(*p)) {
            return Err(ModelError::invalid(
                "failure rate",
                format!("{bad} is not in [0, 1]"),
            ));
        }
        Ok(rates)
    }
}

/// Minimum number of working components for a voting system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoteThreshold {
    /// At least `r` components must work.
    Count(usize),
    /// At least `⌈num·f⌉` components must work, `f ∈ [0, 1]`.
    Fraction(f64),
}

impl VoteThreshold {
    fn required(self, num: usize) -> Result<usize> {
        match self {
            VoteThreshold::Count(r) if r <= num => Ok(r),
            VoteThreshold::Count(r) => Err(ModelError::invalid(
                "threshold",
                format!("{r} working components required but only {num} exist"),
            )),
            VoteThreshold::Fraction(f) if (0.0..=1.0).contains(&f) => {
                Ok((num as f64 * f).ceil() as usize)
            }
            VoteThreshold::Fraction(f) => Err(ModelError::invalid(
                "threshold",
                format!("fraction {f} is not in [0, 1]"),
            )),
        }
    }
}

/// Series system: works only if every component works, `Π(1 − pᵢ)`.
pub fn series(num: usize, rates: &FailureRates) -> Result<f64> {
    Ok(rates.resolve(num)?.iter().map(|p| 1.0 - p).product())
}

/// Parallel system: fails only if every component fails, `1 − Π pᵢ`.
pub fn parallel(num: usize, rates: &FailureRates) -> Result<f64> {
    Ok(1.0 - rates.resolve(num)?.iter().product::<f64>())
}

/// k-out-of-n voting system with identical components failing with
/// probability `p`: `Σ_{i ≥ r} C(n, i)(1 − p)ⁱ p^{n−i}`.
///
/// When the threshold is at most half of `num` the complement is summed
/// instead, which needs fewer terms.
pub fn k_out_of_n(num: usize, p: f64, threshold: VoteThreshold) -> Result<f64> {
    let p = FailureRates::Uniform(p).resolve(num)?[0];
    let r = threshold.required(num)?;
    let q = 1.0 - p;
    let term = |i: usize| {
        choose(num as u64, i as u64) * q.powi(i as i32) * p.powi((num - i) as i32)
    };
    let reliability = if 2 * r > num {
        (r..=num).map(term).sum::<f64>()
    } else {
        1.0 - (0..r).map(term).sum::<f64>()
    };
    Ok(reliability.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series() {
        assert!((series(3, &FailureRates::Uniform(0.1)).unwrap() - 0.729).abs() < 1e-12);
        let r = series(3, &FailureRates::PerComponent(vec![0.1, 0.2, 0.3])).unwrap();
        assert!((r - 0.504).abs() < 1e-12);
    }

    #[test]
    fn test_parallel() {
        assert!((parallel(3, &FailureRates::Uniform(0.9)).unwrap() - 0.271).abs() < 1e-12);
    }

    #[test]
    fn test_rates_validation() {
        assert!(matches!(
            series(3, &FailureRates::PerComponent(vec![0.1, 0.2])),
            Err(ModelError::DimensionMismatch { expected: 3, got: 2, .. })
        ));
        assert!(series(2, &FailureRates::Uniform(1.5)).is_err());
        assert!(parallel(0, &FailureRates::Uniform(0.5)).is_err());
        assert!(series(1, &FailureRates::Uniform(f64::NAN)).is_err());
    }

    #[test]
    fn test_vote_counts() {
        assert!((k_out_of_n(3, 0.1, VoteThreshold::Count(1)).unwrap() - 0.999).abs() < 1e-12);
        assert!((k_out_of_n(3, 0.1, VoteThreshold::Count(2)).unwrap() - 0.972).abs() < 1e-12);
        // 3-of-3 is a series system, 1-of-n a parallel one
        let all = k_out_of_n(3, 0.1, VoteThreshold::Count(3)).unwrap();
        assert!((all - series(3, &FailureRates::Uniform(0.1)).unwrap()).abs() < 1e-12);
        assert_eq!(k_out_of_n(4, 0.3, VoteThreshold::Count(0)).unwrap(), 1.0);
    }

    #[test]
    fn test_vote_fraction() {
        // ⌈5 · 0.5⌉ = 3
        let by_fraction = k_out_of_n(5, 0.2, VoteThreshold::Fraction(0.5)).unwrap();
        let by_count = k_out_of_n(5, 0.2, VoteThreshold::Count(3)).unwrap();
        assert_eq!(by_fraction, by_count);
        assert!(k_out_of_n(5, 0.2, VoteThreshold::Fraction(1.5)).is_err());
        assert!(k_out_of_n(5, 0.2, VoteThreshold::Count(6)).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn vote_bracketed_by_series_and_parallel(num in 1usize..12, p in 0.0_f64..=1.0, r in 1usize..12) {
            let r = r.min(num);
            let rates = FailureRates::Uniform(p);
            let vote = k_out_of_n(num, p, VoteThreshold::Count(r)).unwrap();
            let lo = series(num, &rates).unwrap();
            let hi = parallel(num, &rates).unwrap();
            prop_assert!(vote >= lo - 1e-12 && vote <= hi + 1e-12, "{lo} ≤ {vote} ≤ {hi}");
        }

        #[test]
        fn vote_decreases_with_threshold(num in 2usize..15, p in 0.0_f64..=1.0, r in 1usize..14) {
            let r = r.min(num - 1);
            let easier = k_out_of_n(num, p, VoteThreshold::Count(r)).unwrap();
            let harder = k_out_of_n(num, p, VoteThreshold::Count(r + 1)).unwrap();
            prop_assert!(harder <= easier + 1e-12);
        }
    }
}
