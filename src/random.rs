//! Seeded randomness for the stochastic models.
//!
//! Every routine that draws random numbers takes `&mut R: Rng`, so a run
//! is reproducible from the seed passed to [`create_rng`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Creates a seeded `SmallRng`.
///
/// # Examples
/// ```
/// use rand::Rng;
/// use u_modelkit::random::create_rng;
/// let mut a = create_rng(42);
/// let mut b = create_rng(42);
/// assert_eq!(a.random::<u64>(), b.random::<u64>());
/// ```
pub fn create_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// In-place Fisher–Yates shuffle.
pub fn shuffle<T, R: Rng>(slice: &mut [T], rng: &mut R) {
    for i in (1..slice.len()).rev() {
        let j = rng.random_range(0..=i);
        slice.swap(i, j);
    }
}

/// Draws `k` distinct indices from `0..n` (partial Fisher–Yates).
///
/// The result is in draw order; `k` is capped at `n`.
///
/// ```
/// use u_modelkit::random::{create_rng, sample_indices};
/// let mut rng = create_rng(1);
/// let mut idx = sample_indices(10, 4, &mut rng);
/// idx.sort_unstable();
/// idx.dedup();
/// assert_eq!(idx.len(), 4);
/// assert!(idx.iter().all(|&i| i < 10));
/// ```
pub fn sample_indices<R: Rng>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    let k = k.min(n);
    let mut pool: Vec<usize> = (0..n).collect();
    for i in 0..k {
        let j = rng.random_range(i..n);
        pool.swap(i, j);
    }
    pool.truncate(k);
    pool
}

/// One standard normal draw (Box–Muller, cosine branch).
pub fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    // u1 in (0, 1] keeps ln finite
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// One draw from N(μ, σ²).
pub fn normal<R: Rng>(mu: f64, sigma: f64, rng: &mut R) -> f64 {
    mu + sigma * standard_normal(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats;

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = create_rng(3);
        let mut v: Vec<u32> = (0..50).collect();
        shuffle(&mut v, &mut rng);
        assert_ne!(v, (0..50).collect::<Vec<_>>());
        v.sort_unstable();
        assert_eq!(v, (0..50).collect::<Vec<_>>());

        let mut empty: [u8; 0] = [];
        shuffle(&mut empty, &mut rng);
    }

    #[test]
    fn test_sample_indices_caps_at_n() {
        let mut rng = create_rng(5);
        let mut all = sample_indices(6, 10, &mut rng);
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4, 5]);
        assert!(sample_indices(0, 3, &mut rng).is_empty());
    }

    #[test]
    fn test_normal_moments() {
        let mut rng = create_rng(42);
        let draws: Vec<f64> = (0..20_000).map(|_| normal(10.0, 2.0, &mut rng)).collect();
        let m = stats::mean(&draws).unwrap();
        let s = stats::std_dev(&draws).unwrap();
        assert!((m - 10.0).abs() < 0.1, "mean {m}");
        assert!((s - 2.0).abs() < 0.1, "sd {s}");
    }
}
