//! Multi-criteria evaluation models.
//!
//! All models take an `alternatives × indicators` decision matrix
//! (`nalgebra::DMatrix<f64>`, one row per alternative) and produce one
//! score per alternative.
//!
//! - [`ahp`]: Analytic Hierarchy Process from pairwise comparisons
//! - [`entropy`]: entropy weight method
//! - [`topsis`]: entropy-weighted TOPSIS with four indicator kinds
//! - [`grey_relational`]: grey relational analysis
//! - [`fuzzy`]: fuzzy comprehensive evaluation with trapezoid grades

pub mod ahp;
pub mod entropy;
pub mod fuzzy;
pub mod grey_relational;
pub mod topsis;

use nalgebra::DMatrix;

use crate::error::{ModelError, Result};

/// Whether larger or smaller indicator values are preferable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Benefit,
    Cost,
}

/// Indices sorted by descending score; ties keep index order.
pub(crate) fn rank_descending(scores: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    idx
}

/// Checks a decision matrix is non-empty, finite and has `indicators`
/// columns.
pub(crate) fn check_decision_matrix(data: &DMatrix<f64>, indicators: usize) -> Result<()> {
    if data.is_empty() {
        return Err(ModelError::EmptyInput("decision matrix"));
    }
    if data.ncols() != indicators {
        return Err(ModelError::mismatch("indicators", indicators, data.ncols()));
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(ModelError::invalid("decision matrix", "contains non-finite values"));
    }
    Ok(())
}
