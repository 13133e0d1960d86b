//! Finite discrete-time Markov chains.
//!
//! State distributions are row vectors propagated as `πₖ₊₁ = πₖ · P`, where
//! row `i` of `P` holds the probabilities of leaving state `i`.
//!
//! # Examples
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use u_modelkit::forecast::MarkovChain;
//!
//! // sunny / rainy
//! let chain = MarkovChain::new(DMatrix::from_row_slice(2, 2, &[0.9, 0.1, 0.5, 0.5])).unwrap();
//! let path = chain.forecast(&DVector::from_vec(vec![1.0, 0.0]), 2).unwrap();
//! assert_eq!(path.len(), 3);
//! assert!((path[2][0] - 0.86).abs() < 1e-12);
//!
//! let pi = chain.stationary(1e-12, 10_000).unwrap();
//! assert!((pi[0] - 5.0 / 6.0).abs() < 1e-9);
//! ```

use nalgebra::{DMatrix, DVector};

use crate::error::{ModelError, Result};

const ROW_SUM_TOL: f64 = 1e-6;

/// A validated row-stochastic transition matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkovChain {
    transition: DMatrix<f64>,
}

impl MarkovChain {
    /// # Errors
    /// `NotSquare`, `EmptyInput`, `InvalidParameter` for negative or
    /// non-finite entries and rows not summing to 1 (±1e-6).
    pub fn new(transition: DMatrix<f64>) -> Result<Self> {
        if !transition.is_square() {
            return Err(ModelError::NotSquare {
                rows: transition.nrows(),
                cols: transition.ncols(),
            });
        }
        if transition.is_empty() {
            return Err(ModelError::EmptyInput("transition matrix"));
        }
        if transition.iter().any(|p| !(p.is_finite() && *p >= 0.0)) {
            return Err(ModelError::invalid(
                "transition matrix",
                "entries must be finite and non-negative",
            ));
        }
        for (i, row) in transition.row_iter().enumerate() {
            let sum = row.sum();
            if (sum - 1.0).abs() > ROW_SUM_TOL {
                return Err(ModelError::invalid(
                    "transition matrix",
                    format!("row {i} sums to {sum}"),
                ));
            }
        }
        Ok(Self { transition })
    }

    pub fn states(&self) -> usize {
        self.transition.nrows()
    }

    pub fn transition(&self) -> &DMatrix<f64> {
        &self.transition
    }

    /// One transition: `π · P`.
    pub fn step(&self, state: &DVector<f64>) -> Result<DVector<f64>> {
        self.check_state(state)?;
        Ok(self.transition.tr_mul(state))
    }

    /// Distributions for steps `0..=steps`; entry 0 is `initial`.
    pub fn forecast(&self, initial: &DVector<f64>, steps: usize) -> Result<Vec<DVector<f64>>> {
        self.check_state(initial)?;
        let mut path = Vec::with_capacity(steps + 1);
        path.push(initial.clone());
        for _ in 0..steps {
            let next = self.transition.tr_mul(&path[path.len() - 1]);
            path.push(next);
        }
        Ok(path)
    }

    /// `Pⁿ` by repeated squaring; `P⁰` is the identity.
    pub fn n_step_matrix(&self, steps: u32) -> DMatrix<f64> {
        let n = self.states();
        let mut result = DMatrix::identity(n, n);
        let mut base = self.transition.clone();
        let mut e = steps;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            base = &base * &base;
            e >>= 1;
        }
        result
    }

    /// Stationary distribution by power iteration from the uniform
    /// distribution.
    ///
    /// # Errors
    /// `NoConvergence` when successive iterates still differ by more than
    /// `tol` after `max_iter` steps (periodic chains started off their
    /// stationary distribution never settle).
    pub fn stationary(&self, tol: f64, max_iter: usize) -> Result<DVector<f64>> {
        let n = self.states();
        let mut pi = DVector::from_element(n, 1.0 / n as f64);
        for iter in 1..=max_iter {
            let next = self.transition.tr_mul(&pi);
            let delta = (&next - &pi).amax();
            pi = next;
            if delta < tol {
                tracing::debug!(iter, "stationary distribution converged");
                return Ok(&pi / pi.sum());
            }
        }
        Err(ModelError::NoConvergence {
            context: "stationary distribution",
            iterations: max_iter,
        })
    }

    fn check_state(&self, state: &DVector<f64>) -> Result<()> {
        if state.len() != self.states() {
            return Err(ModelError::mismatch("state vector", self.states(), state.len()));
        }
        if state.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::invalid("state vector", "contains non-finite values"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather() -> MarkovChain {
        MarkovChain::new(DMatrix::from_row_slice(3, 3, &[
            0.7, 0.2, 0.1, //
            0.3, 0.5, 0.2, //
            0.2, 0.3, 0.5,
        ]))
        .unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            MarkovChain::new(DMatrix::from_element(2, 3, 0.5)),
            Err(ModelError::NotSquare { rows: 2, cols: 3 })
        ));
        assert!(MarkovChain::new(DMatrix::from_row_slice(2, 2, &[0.5, 0.6, 0.5, 0.5])).is_err());
        assert!(MarkovChain::new(DMatrix::from_row_slice(2, 2, &[1.5, -0.5, 0.5, 0.5])).is_err());
        // within tolerance
        assert!(MarkovChain::new(DMatrix::from_row_slice(1, 1, &[1.000_000_5])).is_ok());
    }

    #[test]
    fn test_step_and_forecast() {
        let chain = weather();
        let s0 = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        let s1 = chain.step(&s0).unwrap();
        assert_eq!(s1.as_slice(), &[0.7, 0.2, 0.1]);
        let path = chain.forecast(&s0, 2).unwrap();
        assert_eq!(path[0], s0);
        assert_eq!(path[1], s1);
        // 0.7·0.7 + 0.2·0.3 + 0.1·0.2
        assert!((path[2][0] - 0.57).abs() < 1e-12);
        assert!(chain.step(&DVector::from_vec(vec![1.0, 0.0])).is_err());
    }

    #[test]
    fn test_n_step_matrix() {
        let chain = weather();
        assert_eq!(chain.n_step_matrix(0), DMatrix::identity(3, 3));
        let p3 = chain.n_step_matrix(3);
        let direct = chain.transition() * chain.transition() * chain.transition();
        assert!((p3 - direct).amax() < 1e-12);
        let s0 = DVector::from_vec(vec![0.2, 0.3, 0.5]);
        let via_path = chain.forecast(&s0, 3).unwrap().pop().unwrap();
        let via_power = chain.n_step_matrix(3).tr_mul(&s0);
        assert!((via_path - via_power).amax() < 1e-12);
    }

    #[test]
    fn test_stationary_is_fixed_point() {
        let chain = weather();
        let pi = chain.stationary(1e-14, 10_000).unwrap();
        assert!((pi.sum() - 1.0).abs() < 1e-12);
        let again = chain.step(&pi).unwrap();
        assert!((again - &pi).amax() < 1e-10);
    }

    #[test]
    fn test_periodic_chain_from_uniform() {
        let flip = MarkovChain::new(DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0])).unwrap();
        let pi = flip.stationary(1e-12, 10).unwrap();
        assert_eq!(pi.as_slice(), &[0.5, 0.5]);
        let path = flip.forecast(&DVector::from_vec(vec![1.0, 0.0]), 3).unwrap();
        assert_eq!(path[3].as_slice(), &[0.0, 1.0]);
    }
}
