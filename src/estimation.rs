//! Parameter estimation: grid maximum likelihood, grid Bayesian posterior
//! and a one-dimensional Gaussian mixture fitted by EM.
//!
//! # Examples
//! ```
//! use u_modelkit::estimation::{bayes_grid, mle_grid};
//!
//! // Bernoulli sample with five successes in eight trials
//! let xs = [1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0];
//! let grid: Vec<f64> = (1..1000).map(|i| i as f64 / 1000.0).collect();
//! let (p_hat, _) = mle_grid(&xs, &grid, |x, p| if x == 1.0 { p } else { 1.0 - p }).unwrap();
//! assert!((p_hat - 0.625).abs() < 1e-12);
//!
//! let post = bayes_grid(&xs, &grid, |_| 1.0, |xs, p| {
//!     xs.iter().map(|&x| if x == 1.0 { p } else { 1.0 - p }).product()
//! })
//! .unwrap();
//! // Beta(6, 4) posterior mean
//! assert!((post.mean - 0.6).abs() < 1e-3);
//! ```

use std::f64::consts::PI;

use rand::Rng;

use crate::error::{ModelError, Result};
use crate::random::sample_indices;

// ============================================================================
// Grid maximum likelihood
// ============================================================================

/// Log-likelihood of `xs` under `density(x, θ)`; −∞ as soon as one
/// observation has a non-positive (or NaN) density.
fn log_likelihood<T: Copy, F: Fn(f64, T) -> f64>(xs: &[f64], theta: T, density: &F) -> f64 {
    let mut ll = 0.0;
    for &x in xs {
        let p = density(x, theta);
        if p.is_nan() || p <= 0.0 {
            return f64::NEG_INFINITY;
        }
        ll += p.ln();
    }
    ll
}

/// Grid-search maximum likelihood estimate.
///
/// Returns the grid point with the largest log-likelihood and that
/// log-likelihood; the first point wins ties. `θ` may be any `Copy` type,
/// so multi-parameter grids are grids of tuples.
///
/// # Errors
/// `EmptyInput` for an empty sample or grid, `InvalidParameter` when no
/// grid point gives every observation a positive density.
pub fn mle_grid<T, F>(xs: &[f64], grid: &[T], density: F) -> Result<(T, f64)>
where
    T: Copy,
    F: Fn(f64, T) -> f64,
{
    if xs.is_empty() {
        return Err(ModelError::EmptyInput("observations"));
    }
    if grid.is_empty() {
        return Err(ModelError::EmptyInput("parameter grid"));
    }
    let mut best: Option<(T, f64)> = None;
    for &theta in grid {
        let ll = log_likelihood(xs, theta, &density);
        if ll > best.map_or(f64::NEG_INFINITY, |(_, b)| b) {
            best = Some((theta, ll));
        }
    }
    best.ok_or_else(|| ModelError::invalid("grid", "no grid point has positive likelihood"))
}

// ============================================================================
// Grid Bayesian posterior
// ============================================================================

/// Discrete posterior over a parameter grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    pub thetas: Vec<f64>,
    /// Normalised posterior mass at each grid point.
    pub probs: Vec<f64>,
    /// Posterior mean `Σ θ·p(θ | x)`.
    pub mean: f64,
}

impl Posterior {
    /// Grid point with the largest posterior mass.
    pub fn mode(&self) -> f64 {
        self.thetas
            .iter()
            .zip(&self.probs)
            .fold((f64::NAN, f64::NEG_INFINITY), |best, (&t, &p)| {
                if p > best.1 {
                    (t, p)
                } else {
                    best
                }
            })
            .0
    }
}

/// Posterior `∝ prior(θ) · likelihood(xs, θ)` on `grid`.
///
/// # Errors
/// `EmptyInput` for an empty grid, `InvalidParameter` for a negative or
/// non-finite unnormalised mass, `Singular` when the total mass is zero.
pub fn bayes_grid<P, L>(xs: &[f64], grid: &[f64], prior: P, likelihood: L) -> Result<Posterior>
where
    P: Fn(f64) -> f64,
    L: Fn(&[f64], f64) -> f64,
{
    if grid.is_empty() {
        return Err(ModelError::EmptyInput("parameter grid"));
    }
    let mut probs = Vec::with_capacity(grid.len());
    for &theta in grid {
        let mass = prior(theta) * likelihood(xs, theta);
        if !mass.is_finite() || mass < 0.0 {
            return Err(ModelError::invalid(
                "posterior",
                format!("unnormalised mass {mass} at θ = {theta}"),
            ));
        }
        probs.push(mass);
    }
    let total: f64 = probs.iter().sum();
    if total <= 0.0 {
        return Err(ModelError::Singular("posterior has zero total mass".into()));
    }
    for p in &mut probs {
        *p /= total;
    }
    let mean = grid.iter().zip(&probs).map(|(t, p)| t * p).sum::<f64>();
    Ok(Posterior {
        thetas: grid.to_vec(),
        probs,
        mean,
    })
}

// ============================================================================
// Gaussian mixture EM
// ============================================================================

/// Floor applied to component variances.
const MIN_VARIANCE: f64 = 1e-6;

fn normal_pdf(x: f64, mean: f64, variance: f64) -> f64 {
    (-(x - mean).powi(2) / (2.0 * variance)).exp() / (2.0 * PI * variance).sqrt()
}

/// A fitted one-dimensional Gaussian mixture.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianMixture {
    pub weights: Vec<f64>,
    pub means: Vec<f64>,
    pub variances: Vec<f64>,
    /// Log-likelihood of the sample at the final parameters.
    pub log_likelihood: f64,
    pub iterations: usize,
    /// Whether the log-likelihood change fell below the tolerance.
    pub converged: bool,
}

impl GaussianMixture {
    pub fn components(&self) -> usize {
        self.weights.len()
    }

    /// Mixture density at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        (0..self.components())
            .map(|k| self.weights[k] * normal_pdf(x, self.means[k], self.variances[k]))
            .sum()
    }

    /// Index of the component with the largest responsibility for `x`.
    pub fn predict(&self, x: f64) -> usize {
        (0..self.components())
            .map(|k| (k, self.weights[k] * normal_pdf(x, self.means[k], self.variances[k])))
            .fold((0, f64::NEG_INFINITY), |best, c| if c.1 > best.1 { c } else { best })
            .0
    }
}

/// Fits a `components`-component Gaussian mixture to `xs` by EM.
///
/// Initial means are distinct sample points drawn with `rng`, variances
/// start at 1 and weights at `1/K`. An observation whose total density
/// underflows to zero is shared equally between the components. Iteration
/// stops once the log-likelihood changes by less than `tol`.
///
/// # Errors
/// `InvalidParameter` for zero components, zero `max_iter` or non-finite
/// data; `InsufficientData` with fewer observations than components.
pub fn em_gmm_1d<R: Rng>(
    xs: &[f64],
    components: usize,
    max_iter: usize,
    tol: f64,
    rng: &mut R,
) -> Result<GaussianMixture> {
    if components == 0 {
        return Err(ModelError::invalid("components", "must be positive"));
    }
    if max_iter == 0 {
        return Err(ModelError::invalid("max_iter", "must be positive"));
    }
    let n = xs.len();
    if n < components {
        return Err(ModelError::insufficient("Gaussian mixture", components, n));
    }
    if xs.iter().any(|x| !x.is_finite()) {
        return Err(ModelError::invalid("observations", "contains non-finite values"));
    }

    let k_count = components;
    let mut weights = vec![1.0 / k_count as f64; k_count];
    let mut means: Vec<f64> = sample_indices(n, k_count, rng).into_iter().map(|i| xs[i]).collect();
    let mut variances = vec![1.0; k_count];
    let mut resp = vec![0.0; n * k_count];
    let mut last_ll = f64::NAN;
    let mut ll = f64::NEG_INFINITY;
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..max_iter {
        iterations = iter + 1;

        // E-step
        for (i, &x) in xs.iter().enumerate() {
            let row = &mut resp[i * k_count..(i + 1) * k_count];
            for k in 0..k_count {
                row[k] = weights[k] * normal_pdf(x, means[k], variances[k]);
            }
            let total: f64 = row.iter().sum();
            if total > 0.0 {
                row.iter_mut().for_each(|r| *r /= total);
            } else {
                row.fill(1.0 / k_count as f64);
            }
        }

        // M-step
        for k in 0..k_count {
            let nk: f64 = (0..n).map(|i| resp[i * k_count + k]).sum();
            if nk <= f64::EPSILON {
                tracing::warn!(
                    component = k,
                    iter,
                    "mixture component collapsed; keeping its parameters"
                );
                weights[k] = 0.0;
                continue;
            }
            weights[k] = nk / n as f64;
            means[k] = (0..n).map(|i| resp[i * k_count + k] * xs[i]).sum::<f64>() / nk;
            let var = (0..n)
                .map(|i| resp[i * k_count + k] * (xs[i] - means[k]).powi(2))
                .sum::<f64>()
                / nk;
            if var < MIN_VARIANCE {
                tracing::warn!(component = k, iter, var, "mixture component variance collapsed");
            }
            variances[k] = var.max(MIN_VARIANCE);
        }

        ll = xs
            .iter()
            .map(|&x| {
                (0..k_count)
                    .map(|k| weights[k] * normal_pdf(x, means[k], variances[k]))
                    .sum::<f64>()
                    .ln()
            })
            .sum();
        tracing::debug!(iter, ll, "EM iteration");
        if iter > 0 && (ll - last_ll).abs() < tol {
            converged = true;
            break;
        }
        last_ll = ll;
    }

    if converged {
        tracing::debug!(iterations, ll, "EM converged");
    } else {
        tracing::warn!(max_iter, ll, "EM stopped at the iteration cap");
    }
    Ok(GaussianMixture {
        weights,
        means,
        variances,
        log_likelihood: ll,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{create_rng, normal};
    use crate::stats;

    #[test]
    fn test_mle_normal_mean() {
        let xs = [4.8, 5.1, 5.3, 4.9, 5.4];
        let grid: Vec<f64> = (0..=100).map(|i| 4.0 + i as f64 * 0.02).collect();
        let (mu, ll) = mle_grid(&xs, &grid, |x, m| normal_pdf(x, m, 1.0)).unwrap();
        // sample mean is 5.1
        assert!((mu - 5.1).abs() < 1e-9);
        assert!(ll.is_finite());
    }

    #[test]
    fn test_mle_tuple_grid() {
        let xs = [1.0, 3.0];
        let grid = [(0.0, 1.0), (2.0, 1.0), (2.0, 0.5)];
        let ((m, s), _) = mle_grid(&xs, &grid, |x, (m, s): (f64, f64)| {
            normal_pdf(x, m, s * s)
        })
        .unwrap();
        assert_eq!((m, s), (2.0, 1.0));
    }

    #[test]
    fn test_mle_zero_density() {
        // p = 0 cannot produce a success
        let xs = [1.0, 0.0];
        let grid = [0.0, 0.5];
        let (p, _) = mle_grid(&xs, &grid, |x, p| if x == 1.0 { p } else { 1.0 - p }).unwrap();
        assert_eq!(p, 0.5);
        assert!(mle_grid(&xs, &[0.0, 1.0], |x, p| if x == 1.0 { p } else { 1.0 - p }).is_err());
        assert!(matches!(
            mle_grid(&xs, &[] as &[f64], |_, p| p),
            Err(ModelError::EmptyInput(_))
        ));
        assert!(mle_grid(&[], &grid, |_, p| p).is_err());
    }

    #[test]
    fn test_bayes_uniform_prior() {
        // 5 successes in 20 trials
        let mut xs = vec![1.0; 5];
        xs.extend(vec![0.0; 15]);
        let grid: Vec<f64> = (1..100).map(|i| i as f64 / 100.0).collect();
        let post = bayes_grid(
            &xs,
            &grid,
            |p| if (0.0..=1.0).contains(&p) { 1.0 } else { 0.0 },
            |xs, p| {
                let s: f64 = xs.iter().sum();
                p.powf(s) * (1.0 - p).powf(xs.len() as f64 - s)
            },
        )
        .unwrap();
        assert!((post.probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        // Beta(6, 16) mean
        assert!((post.mean - 6.0 / 22.0).abs() < 1e-3);
        assert!((post.mode() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_bayes_errors() {
        let grid = [0.2, 0.4];
        assert!(matches!(
            bayes_grid(&[1.0], &grid, |_| 0.0, |_, p| p),
            Err(ModelError::Singular(_))
        ));
        assert!(bayes_grid(&[1.0], &grid, |_| -1.0, |_, p| p).is_err());
        assert!(bayes_grid(&[1.0], &[], |_| 1.0, |_, p| p).is_err());
    }

    #[test]
    fn test_em_single_component_is_closed_form() {
        let xs = [1.0, 2.0, 4.0, 7.0, 11.0];
        let mut rng = create_rng(3);
        let gm = em_gmm_1d(&xs, 1, 50, 1e-10, &mut rng).unwrap();
        assert_eq!(gm.weights, vec![1.0]);
        assert!((gm.means[0] - 5.0).abs() < 1e-12);
        let pop_var = stats::population_variance(&xs).unwrap();
        assert!((gm.variances[0] - pop_var).abs() < 1e-12);
        // parameters are fixed after the first M-step
        assert!(gm.converged);
        assert_eq!(gm.iterations, 2);
    }

    #[test]
    fn test_em_separates_two_clusters() {
        let mut data_rng = create_rng(42);
        let mut xs: Vec<f64> = (0..60).map(|_| normal(0.0, 1.0, &mut data_rng)).collect();
        xs.extend((0..60).map(|_| normal(8.0, 1.0, &mut data_rng)));

        // best of a few restarts, as is usual for EM
        let best = (0..5)
            .map(|seed| em_gmm_1d(&xs, 2, 500, 1e-8, &mut create_rng(seed)).unwrap())
            .max_by(|a, b| a.log_likelihood.total_cmp(&b.log_likelihood))
            .unwrap();
        let (lo, hi) = if best.means[0] < best.means[1] { (0, 1) } else { (1, 0) };
        assert!(best.means[lo].abs() < 0.6, "{:?}", best.means);
        assert!((best.means[hi] - 8.0).abs() < 0.6, "{:?}", best.means);
        assert!((best.weights[0] - 0.5).abs() < 0.1);
        assert!((best.weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_ne!(best.predict(-0.5), best.predict(8.5));
        assert!(best.pdf(0.0) > best.pdf(4.0));
    }

    #[test]
    fn test_em_validation() {
        let mut rng = create_rng(0);
        assert!(em_gmm_1d(&[1.0, 2.0], 0, 10, 1e-4, &mut rng).is_err());
        assert!(matches!(
            em_gmm_1d(&[1.0], 2, 10, 1e-4, &mut rng),
            Err(ModelError::InsufficientData { required: 2, got: 1, .. })
        ));
        assert!(em_gmm_1d(&[1.0, f64::NAN], 1, 10, 1e-4, &mut rng).is_err());
        assert!(em_gmm_1d(&[1.0, 2.0], 1, 0, 1e-4, &mut rng).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::random::create_rng;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn posterior_is_a_distribution(
            grid in prop::collection::vec(0.01_f64..0.99, 1..40),
            successes in 0usize..10,
            failures in 0usize..10,
        ) {
            let post = bayes_grid(&[], &grid, |_| 1.0, |_, p| {
                p.powi(successes as i32) * (1.0 - p).powi(failures as i32)
            }).unwrap();
            prop_assert!((post.probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            let lo = grid.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = grid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(post.mean >= lo - 1e-12 && post.mean <= hi + 1e-12);
        }

        #[test]
        fn mixture_weights_sum_to_one(
            xs in prop::collection::vec(-20.0_f64..20.0, 4..40),
            k in 1usize..4,
            seed in 0u64..1000,
        ) {
            let gm = em_gmm_1d(&xs, k, 30, 1e-6, &mut create_rng(seed)).unwrap();
            prop_assert!((gm.weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            prop_assert!(gm.variances.iter().all(|&v| v >= MIN_VARIANCE));
        }
    }
}
