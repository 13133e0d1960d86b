//! Monte-Carlo estimation of π.
//!
//! Points are drawn uniformly from the square `[−1, 1]²`; the share landing
//! in the unit disc (`x² + y² ≤ 1`) estimates `π/4`.
//!
//! # Examples
//! ```
//! use u_modelkit::monte_carlo::estimate_pi;
//! use u_modelkit::random::create_rng;
//!
//! let mut rng = create_rng(42);
//! let est = estimate_pi(100_000, &mut rng).unwrap();
//! assert!(est.abs_error < 0.05);
//! assert_eq!(est.samples, 100_000);
//! ```

use std::f64::consts::PI;

use rand::Rng;

use crate::error::{ModelError, Result};

/// One Monte-Carlo run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiEstimate {
    /// `4 · inside / samples`.
    pub estimate: f64,
    pub inside: usize,
    pub samples: usize,
    /// `|estimate − π|`.
    pub abs_error: f64,
}

impl PiEstimate {
    /// Binomial standard error of the estimate, `4·√(p̂(1 − p̂)/n)`.
    pub fn standard_error(&self) -> f64 {
        let p = self.inside as f64 / self.samples as f64;
        4.0 * (p * (1.0 - p) / self.samples as f64).sqrt()
    }
}

/// Estimates π from `samples` random points.
///
/// # Errors
/// `InvalidParameter` when `samples == 0`.
pub fn estimate_pi<R: Rng>(samples: usize, rng: &mut R) -> Result<PiEstimate> {
    if samples == 0 {
        return Err(ModelError::invalid("samples", "must be positive"));
    }
    let inside = (0..samples)
        .filter(|_| {
            let x: f64 = rng.random_range(-1.0..1.0);
            let y: f64 = rng.random_range(-1.0..1.0);
            x * x + y * y <= 1.0
        })
        .count();
    let estimate = 4.0 * inside as f64 / samples as f64;
    let abs_error = (estimate - PI).abs();
    tracing::debug!(samples, inside, estimate, abs_error, "Monte-Carlo π estimate");
    Ok(PiEstimate {
        estimate,
        inside,
        samples,
        abs_error,
    })
}

/// Independent runs for each sample size, in order, sharing one RNG.
///
/// # Errors
/// `InvalidParameter` when any size is zero.
pub fn pi_convergence<R: Rng>(sizes: &[usize], rng: &mut R) -> Result<Vec<PiEstimate>> {
    sizes.iter().map(|&n| estimate_pi(n, rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;

    #[test]
    fn test_estimate_within_five_standard_errors() {
        let mut rng = create_rng(7);
        let est = estimate_pi(200_000, &mut rng).unwrap();
        assert!(est.abs_error < 5.0 * est.standard_error());
        assert!((est.estimate - 4.0 * est.inside as f64 / 200_000.0).abs() < 1e-15);
    }

    #[test]
    fn test_reproducible_from_seed() {
        let a = estimate_pi(10_000, &mut create_rng(1)).unwrap();
        let b = estimate_pi(10_000, &mut create_rng(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_point() {
        let est = estimate_pi(1, &mut create_rng(3)).unwrap();
        assert!(est.estimate == 0.0 || est.estimate == 4.0);
    }

    #[test]
    fn test_convergence_sequence() {
        let mut rng = create_rng(11);
        let runs = pi_convergence(&[100, 10_000, 1_000_000], &mut rng).unwrap();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[2].samples, 1_000_000);
        assert!(runs[2].abs_error < 0.01);
        assert!(pi_convergence(&[10, 0], &mut rng).is_err());
    }

    #[test]
    fn test_zero_samples() {
        assert!(matches!(
            estimate_pi(0, &mut create_rng(0)),
            Err(ModelError::InvalidParameter { name: "samples", .. })
        ));
    }
}
