//! Poisson distribution functions and fitting of the rate parameter to CDF anchors.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::opt::{grid_search, GridSearchConfig};

/// Upper limit on the count returned by [`quantile`].
pub const MAX_QUANTILE: u32 = 1_000;

/// P(X = `k`) for X ~ Poisson(`lambda`).
#[inline]
pub fn univariate(k: u32, lambda: f64) -> f64 {
    let mut term = f64::exp(-lambda);
    for i in 1..=k {
        term *= lambda / i as f64;
    }
    term
}

/// P(X ≤ `k`) for X ~ Poisson(`lambda`).
pub fn cdf(k: u32, lambda: f64) -> f64 {
    let mut term = f64::exp(-lambda);
    let mut sum = term;
    for i in 1..=k {
        term *= lambda / i as f64;
        sum += term;
    }
    sum
}

/// The smallest count `k` for which P(X ≤ k) ≥ `q`, capped at `max_k`.
pub fn quantile(q: f64, lambda: f64, max_k: u32) -> u32 {
    let mut k = 0;
    let mut term = f64::exp(-lambda);
    let mut sum = term;
    while sum < q && k < max_k {
        k += 1;
        term *= lambda / k as f64;
        sum += term;
    }
    k
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LambdaSearch {
    pub resolution: usize,
    pub max_steps: u64,
}
impl Default for LambdaSearch {
    fn default() -> Self {
        Self {
            resolution: 60,
            max_steps: 2,
        }
    }
}

/// Fits the rate whose CDF best matches the `(k, F(k))` anchors in the least-squares sense, searching
/// a range scaled to the largest anchored count.
pub fn fit_lambda(anchors: &[(u32, f64)], search: &LambdaSearch) -> Result<f64, anyhow::Error> {
    let Some(max_k) = anchors.iter().map(|(k, _)| *k).max() else {
        bail!("no anchors to fit");
    };
    let max_k = max_k as f64;
    let lower = f64::max(0.1, 0.3 * max_k);
    let upper = f64::max(1.0, 2.5 * max_k + 1.0);
    let outcome = grid_search(
        &GridSearchConfig {
            bounds: lower..=upper,
            resolution: search.resolution,
            max_steps: search.max_steps,
            acceptable_residual: 0.0,
        },
        |lambda| {
            anchors
                .iter()
                .map(|&(k, prob)| (cdf(k, lambda) - prob).powi(2))
                .sum()
        },
    )?;
    trace!(
        "fitted lambda {:.4} to {} anchor(s) in {} evaluations, residual {:.3e}",
        outcome.optimal_value,
        anchors.len(),
        outcome.evaluations,
        outcome.optimal_residual
    );
    Ok(outcome.optimal_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn univariate_values() {
        assert_float_relative_eq!(0.36787944117144233, univariate(0, 1.0), 1e-12);
        assert_float_relative_eq!(0.36787944117144233, univariate(1, 1.0), 1e-12);
        assert_float_relative_eq!(0.18393972058572117, univariate(2, 1.0), 1e-12);
        assert_float_relative_eq!(0.0820849986238988, univariate(0, 2.5), 1e-12);
        assert_float_relative_eq!(0.205212496559747, univariate(1, 2.5), 1e-12);
        assert_float_relative_eq!(0.25651562069968376, univariate(2, 2.5), 1e-12);
    }

    #[test]
    fn cdf_values() {
        assert_float_relative_eq!(0.0820849986238988, cdf(0, 2.5), 1e-12);
        assert_float_relative_eq!(0.2872974951836458, cdf(1, 2.5), 1e-12);
        assert_float_relative_eq!(0.5438131158833296, cdf(2, 2.5), 1e-12);
        assert_float_absolute_eq!(1.0, cdf(100, 2.5), 1e-12);
    }

    #[test]
    fn quantile_values() {
        assert_eq!(0, quantile(0.0, 2.5, MAX_QUANTILE));
        assert_eq!(1, quantile(0.15, 2.5, MAX_QUANTILE));
        assert_eq!(2, quantile(0.5, 2.5, MAX_QUANTILE));
        assert_eq!(4, quantile(0.85, 2.5, MAX_QUANTILE));
    }

    #[test]
    fn quantile_capped() {
        assert_eq!(MAX_QUANTILE, quantile(0.85, 5_000.0, MAX_QUANTILE));
        assert_eq!(3, quantile(0.99, 40.0, 3));
    }

    #[test]
    fn fit_lambda_recovers_rate() {
        let anchors: Vec<_> = (1..=3).map(|k| (k, cdf(k, 2.5))).collect();
        let lambda = fit_lambda(&anchors, &LambdaSearch::default()).unwrap();
        assert_float_absolute_eq!(2.5, lambda, 0.01);
    }

    #[test]
    fn fit_lambda_zero_count() {
        let lambda = fit_lambda(&[(0, cdf(0, 0.4))], &LambdaSearch::default()).unwrap();
        assert_float_absolute_eq!(0.4, lambda, 0.01);
    }

    #[test]
    fn fit_lambda_no_anchors() {
        assert_eq!(
            "no anchors to fit",
            fit_lambda(&[], &LambdaSearch::default()).unwrap_err().to_string()
        );
    }
}
