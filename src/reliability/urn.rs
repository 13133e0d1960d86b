//! Pólya urn models.
//!
//! An urn holds `first` balls of type 1 and `second` balls of type 2.
//! Each function gives the probability of drawing `m` type-1 and `n`
//! type-2 balls under a different replacement rule:
//!
//! | Model | After each draw |
//! |---|---|
//! | without replacement | ball removed |
//! | with replacement | ball returned |
//! | contagion | ball returned plus `c` balls of the same type |
//! | safety | ball returned plus `d` balls of the other type |

use std::fmt;

use crate::error::{ModelError, Result};
use crate::special::{choose, ln_choose};

/// Largest number of draw orderings [`urn_safety`] will enumerate.
pub const MAX_SAFETY_ORDERINGS: u64 = 1 << 20;

fn check_urn(first: u64, second: u64) -> Result<()> {
    if first + second == 0 {
        return Err(ModelError::invalid("urn", "must contain at least one ball"));
    }
    Ok(())
}

/// Hypergeometric probability `C(b, m)·C(r, n) / C(b + r, m + n)`.
///
/// ```
/// use u_modelkit::reliability::urn_without_replacement;
/// let p = urn_without_replacement(5, 6, 2, 3).unwrap();
/// assert!((p - 0.432_900_432_900_432_9).abs() < 1e-12);
/// ```
pub fn urn_without_replacement(first: u64, second: u64, m: u64, n: u64) -> Result<f64> {
    check_urn(first, second)?;
    if m > first || n > second {
        return Err(ModelError::invalid(
            "draws",
            format!("cannot draw {m}/{n} balls from an urn with {first}/{second}"),
        ));
    }
    let ln_p = ln_choose(first, m) + ln_choose(second, n) - ln_choose(first + second, m + n);
    Ok(ln_p.exp().min(1.0))
}

/// `k·ln x`, taking `0·ln 0` as 0.
fn ln_power(ln_x: f64, k: u64) -> f64 {
    if k == 0 {
        0.0
    } else {
        k as f64 * ln_x
    }
}

/// Binomial probability `C(m + n, m)·pᵐ(1 − p)ⁿ` with `p = b/(b + r)`.
pub fn urn_with_replacement(first: u64, second: u64, m: u64, n: u64) -> Result<f64> {
    check_urn(first, second)?;
    let ln_total = ((first + second) as f64).ln();
    let ln_p = ln_power((first as f64).ln() - ln_total, m);
    let ln_q = ln_power((second as f64).ln() - ln_total, n);
    Ok((ln_choose(m + n, m) + ln_p + ln_q).exp().min(1.0))
}

/// Contagion model: each drawn ball is returned with `c` more of its type.
///
/// The probability does not depend on the draw order:
/// `C(m+n, m)·Π_{i<m}(b + ic)·Π_{j<n}(r + jc) / Π_{k<m+n}(b + r + kc)`.
///
/// ```
/// use u_modelkit::reliability::urn_contagion;
/// let p = urn_contagion(5, 6, 1, 2, 3).unwrap();
/// assert!((p - 0.309_396_485_867_074_1).abs() < 1e-12);
/// ```
pub fn urn_contagion(first: u64, second: u64, m: u64, n: u64, c: u64) -> Result<f64> {
    check_urn(first, second)?;
    let (b, r, c) = (first as f64, second as f64, c as f64);
    let mut ln_p = ln_choose(m + n, m);
    for i in 0..m {
        let i = i as f64;
        ln_p += ((b + i * c) / (b + r + i * c)).ln();
    }
    for j in 0..n {
        let j_f = j as f64;
        ln_p += ((r + j_f * c) / (b + r + (m + j) as f64 * c)).ln();
    }
    Ok(ln_p.exp().min(1.0))
}

/// Colour of a single draw in a safety-model ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrnDraw {
    First,
    Second,
}

/// Per-ordering terms of the safety model and their total.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyBreakdown {
    /// Every distinct draw order with its probability.
    pub orderings: Vec<(Vec<UrnDraw>, f64)>,
    pub total: f64,
}

impl fmt::Display for SafetyBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (order, p) in &self.orderings {
            let labels: Vec<&str> = order
                .iter()
                .map(|d| match d {
                    UrnDraw::First => "1",
                    UrnDraw::Second => "2",
                })
                .collect();
            writeln!(f, "{}: {p:.6}", labels.join(" "))?;
        }
        write!(f, "total: {:.6}", self.total)
    }
}

/// Safety model: each drawn ball is returned with `d` balls of the other
/// type.
///
/// The probability depends on the draw order, so all `C(m+n, m)` distinct
/// orderings are enumerated and summed.
///
/// # Errors
/// `InvalidParameter` for an empty urn or when `C(m+n, m)` exceeds
/// [`MAX_SAFETY_ORDERINGS`].
///
/// ```
/// use u_modelkit::reliability::urn_safety;
/// let s = urn_safety(5, 6, 1, 2, 3).unwrap();
/// assert_eq!(s.orderings.len(), 3);
/// assert!((s.total - 0.470_970_206_264_323_84).abs() < 1e-12);
/// ```
pub fn urn_safety(first: u64, second: u64, m: u64, n: u64, d: u64) -> Result<SafetyBreakdown> {
    check_urn(first, second)?;
    let count = choose(m + n, m);
    if count > MAX_SAFETY_ORDERINGS as f64 {
        return Err(ModelError::invalid(
            "draws",
            format!("{count} orderings exceed the limit of {MAX_SAFETY_ORDERINGS}"),
        ));
    }
    let mut orderings = Vec::new();
    let mut prefix = Vec::with_capacity((m + n) as usize);
    enumerate_orderings(m, n, &mut prefix, &mut orderings);

    let terms: Vec<(Vec<UrnDraw>, f64)> = orderings
        .into_iter()
        .map(|order| {
            let (mut b, mut r) = (first as f64, second as f64);
            let mut p = 1.0;
            for draw in &order {
                match draw {
                    UrnDraw::First => {
                        p *= b / (b + r);
                        r += d as f64;
                    }
                    UrnDraw::Second => {
                        p *= r / (b + r);
                        b += d as f64;
                    }
                }
            }
            (order, p)
        })
        .collect();
    let total = terms.iter().map(|(_, p)| p).sum();
    tracing::debug!(orderings = terms.len(), total, "safety model enumerated");
    Ok(SafetyBreakdown {
        orderings: terms,
        total,
    })
}

fn enumerate_orderings(
    m: u64,
    n: u64,
    prefix: &mut Vec<UrnDraw>,
    out: &mut Vec<Vec<UrnDraw>>,
) {
    if m == 0 && n == 0 {
        out.push(prefix.clone());
        return;
    }
    if m > 0 {
        prefix.push(UrnDraw::First);
        enumerate_orderings(m - 1, n, prefix, out);
        prefix.pop();
    }
    if n > 0 {
        prefix.push(UrnDraw::Second);
        enumerate_orderings(m, n - 1, prefix, out);
        prefix.pop();
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn urn_probabilities_in_unit_interval(
            first in 0u64..10_000,
            second in 1u64..10_000,
            m_frac in 0.0_f64..=1.0,
            n_frac in 0.0_f64..=1.0,
            c in 0u64..50,
        ) {
            let m = (first as f64 * m_frac) as u64;
            let n = (second as f64 * n_frac) as u64;
            let probs = [
                urn_without_replacement(first, second, m, n).unwrap(),
                urn_with_replacement(first, second, m, n).unwrap(),
                urn_contagion(first, second, m, n, c).unwrap(),
            ];
            for p in probs {
                prop_assert!((0.0..=1.0).contains(&p), "p = {p} for {first}/{second}, {m}/{n}");
            }
        }
    }
}
