use std::error::Error;

use anyhow::anyhow;
use linesman::market::OverroundMethod;
use linesman::poisson::LambdaSearch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::distribution::ModelKind;
use crate::quantiles::QuantileLevels;

/// Newton iterations are capped to bound the cost of a PCHIP inversion.
pub const MAX_NEWTON_STEPS: usize = 8;

/// Cap on the number of CDF evaluations spent fitting a Poisson tail.
pub const MAX_LAMBDA_EVALUATIONS: u64 = 120;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(#[from] pub Box<dyn Error + Send + Sync>);

impl From<anyhow::Error> for ConfigError {
    fn from(value: anyhow::Error) -> Self {
        ConfigError(value.into())
    }
}

/// Tunables of the projection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model: ModelKind,
    pub overround_method: OverroundMethod,
    pub levels: QuantileLevels,

    /// Shift of the weighted mean away from the threshold, as a fraction of the threshold per unit of
    /// over/under probability imbalance.
    pub mean_scaling: f64,

    /// Over-probability of a yes/no market that was never quoted.
    pub default_over_prob: f64,

    /// Sigma of a 50/50 line, as a fraction of its threshold.
    pub flat_sigma_fraction: f64,
    pub min_flat_sigma: f64,

    /// Half-width of the naive band around the mean of a market that has no consensus.
    pub fallback_band: f64,

    /// Fraction below a milestone over which its bonus ramps in linearly, when no sigma is known.
    pub bonus_proximity: f64,

    pub min_anchors: usize,
    pub min_tail_anchors: usize,
    pub max_newton_steps: usize,
    pub lambda_search: LambdaSearch,
}
impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::default(),
            overround_method: OverroundMethod::default(),
            levels: QuantileLevels::default(),
            mean_scaling: 0.5,
            default_over_prob: 0.5,
            flat_sigma_fraction: 0.25,
            min_flat_sigma: 1.0,
            fallback_band: 0.2,
            bonus_proximity: 0.2,
            min_anchors: 3,
            min_tail_anchors: 4,
            max_newton_steps: MAX_NEWTON_STEPS,
            lambda_search: LambdaSearch::default(),
        }
    }
}
impl ModelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let levels = &self.levels;
        if !(0.0 < levels.floor && levels.floor < levels.mid && levels.mid < levels.ceiling && levels.ceiling < 1.0) {
            return Err(anyhow!("quantile levels {levels:?} must be strictly increasing inside (0, 1)").into());
        }
        if !self.mean_scaling.is_finite() || self.mean_scaling < 0.0 {
            return Err(anyhow!("mean scaling must be a non-negative number").into());
        }
        if !(self.default_over_prob > 0.0 && self.default_over_prob < 1.0) {
            return Err(anyhow!("default over probability must lie in (0, 1)").into());
        }
        if !(self.flat_sigma_fraction > 0.0) || !(self.min_flat_sigma > 0.0) {
            return Err(anyhow!("flat-line sigma parameters must be positive").into());
        }
        if !(0.0..1.0).contains(&self.fallback_band) {
            return Err(anyhow!("fallback band must lie in [0, 1)").into());
        }
        if !(self.bonus_proximity > 0.0 && self.bonus_proximity <= 1.0) {
            return Err(anyhow!("bonus proximity must lie in (0, 1]").into());
        }

        const MIN_ANCHORS: usize = 2;
        if self.min_anchors < MIN_ANCHORS {
            return Err(anyhow!("min anchors cannot be less than {MIN_ANCHORS}").into());
        }
        if self.min_tail_anchors < self.min_anchors {
            return Err(anyhow!("min tail anchors cannot be less than min anchors ({})", self.min_anchors).into());
        }
        if self.max_newton_steps > MAX_NEWTON_STEPS {
            return Err(anyhow!("Newton steps cannot exceed {MAX_NEWTON_STEPS}").into());
        }

        let search = &self.lambda_search;
        if search.resolution < 3 || search.max_steps == 0 {
            return Err(anyhow!("lambda search needs at least one step of at least 3 points").into());
        }
        if search.resolution as u64 * search.max_steps > MAX_LAMBDA_EVALUATIONS {
            return Err(anyhow!("lambda search cannot exceed {MAX_LAMBDA_EVALUATIONS} evaluations").into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ModelConfig::default();
        config.validate().unwrap();
        assert_eq!(ModelKind::Tails, config.model);
        assert_eq!(120, config.lambda_search.resolution as u64 * config.lambda_search.max_steps);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let config: ModelConfig = serde_json::from_str(r#"{"model": "pchip", "fallback_band": 0.25}"#).unwrap();
        assert_eq!(ModelKind::Pchip, config.model);
        assert_eq!(0.25, config.fallback_band);
        assert_eq!(0.5, config.mean_scaling);
        assert_eq!(OverroundMethod::Multiplicative, config.overround_method);
        config.validate().unwrap();

        let config: ModelConfig = serde_json::from_str(r#"{"overround_method": "power"}"#).unwrap();
        assert_eq!(OverroundMethod::Power, config.overround_method);
    }

    #[test]
    fn invalid_levels() {
        let config = ModelConfig {
            levels: QuantileLevels {
                floor: 0.5,
                mid: 0.5,
                ceiling: 0.85,
            },
            ..ModelConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.starts_with("quantile levels"), "{err}");
    }

    #[test]
    fn invalid_newton_cap() {
        let config = ModelConfig {
            max_newton_steps: 9,
            ..ModelConfig::default()
        };
        assert_eq!("Newton steps cannot exceed 8", config.validate().unwrap_err().to_string());
    }

    #[test]
    fn invalid_lambda_search() {
        let config = ModelConfig {
            lambda_search: LambdaSearch {
                resolution: 61,
                max_steps: 2,
            },
            ..ModelConfig::default()
        };
        assert_eq!(
            "lambda search cannot exceed 120 evaluations",
            config.validate().unwrap_err().to_string()
        );
    }

    #[test]
    fn invalid_probabilities() {
        let config = ModelConfig {
            default_over_prob: 1.0,
            ..ModelConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ModelConfig {
            fallback_band: 1.0,
            ..ModelConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ModelConfig {
            bonus_proximity: 0.0,
            ..ModelConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_anchor_minimums() {
        let config = ModelConfig {
            min_anchors: 1,
            ..ModelConfig::default()
        };
        assert_eq!("min anchors cannot be less than 2", config.validate().unwrap_err().to_string());

        let config = ModelConfig {
            min_anchors: 5,
            ..ModelConfig::default()
        };
        assert_eq!(
            "min tail anchors cannot be less than min anchors (5)",
            config.validate().unwrap_err().to_string()
        );
    }
}
