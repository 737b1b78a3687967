//! Conversion of bookmaker prices to fair probabilities by removing the overround.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::opt::{univariate_descent, UnivariateDescentConfig};
use crate::probs::SliceExt;

#[derive(Debug, Clone, PartialEq)]
pub struct Overround {
    pub method: OverroundMethod,
    pub value: f64,
}
impl Overround {
    pub fn fair() -> Self {
        Self {
            method: OverroundMethod::Multiplicative,
            value: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverroundMethod {
    /// Scales the implied probabilities so that they sum to the fair booksum.
    #[default]
    Multiplicative,

    /// Raises the implied probabilities to a common exponent so that they sum to the fair booksum.
    Power,
}

/// The implied probability of a decimal `price`, provided that it lies strictly inside the unit interval.
/// Prices at or below 1.0, and non-finite prices, carry no information.
#[inline]
pub fn implied_prob(price: f64) -> Option<f64> {
    if price.is_finite() && price > 1.0 {
        Some(1.0 / price)
    } else {
        None
    }
}

#[derive(Debug)]
pub struct Market {
    pub probs: Vec<f64>,
    pub prices: Vec<f64>,
    pub overround: Overround,
}
impl Market {
    /// Fits fair probabilities to a complete set of `prices`, such that the probabilities sum to `fair_sum`.
    pub fn fit(method: &OverroundMethod, prices: Vec<f64>, fair_sum: f64) -> Result<Self, anyhow::Error> {
        match method {
            OverroundMethod::Multiplicative => Ok(Self::fit_multiplicative(prices, fair_sum)),
            OverroundMethod::Power => Self::fit_power(prices, fair_sum),
        }
    }

    fn fit_multiplicative(prices: Vec<f64>, fair_sum: f64) -> Self {
        let mut probs: Vec<_> = prices.invert().collect();
        let overround = probs.normalise(fair_sum) / fair_sum;
        Self {
            probs,
            prices,
            overround: Overround {
                method: OverroundMethod::Multiplicative,
                value: overround,
            },
        }
    }

    fn fit_power(prices: Vec<f64>, fair_sum: f64) -> Result<Self, anyhow::Error> {
        let implied: Vec<_> = prices.invert().collect();
        let overround = implied.sum() / fair_sum;
        let outcome = univariate_descent(
            &UnivariateDescentConfig {
                init_value: 1.0,
                init_step: 0.1,
                min_step: 1e-7,
                max_steps: 1_000,
                acceptable_residual: 1e-12,
            },
            |exponent| {
                let sum: f64 = implied.iter().map(|prob| prob.powf(exponent)).sum();
                (sum - fair_sum).powi(2)
            },
        )?;
        trace!(
            "power overround exponent {:.6} after {} steps",
            outcome.optimal_value,
            outcome.steps
        );
        let probs = implied
            .iter()
            .map(|prob| prob.powf(outcome.optimal_value))
            .collect();
        Ok(Self {
            probs,
            prices,
            overround: Overround {
                method: OverroundMethod::Power,
                value: overround,
            },
        })
    }
}
