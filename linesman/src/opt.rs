use std::ops::RangeInclusive;

use anyhow::bail;

#[derive(Clone, Debug)]
pub struct UnivariateDescentConfig {
    pub init_value: f64,
    pub init_step: f64,
    pub min_step: f64,
    pub max_steps: u64,
    pub acceptable_residual: f64,
}
impl UnivariateDescentConfig {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.min_step <= 0.0 {
            bail!("min step must be positive")
        }
        if self.acceptable_residual < 0.0 {
            bail!("acceptable residual must be non-negative")
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct UnivariateDescentOutcome {
    pub steps: u64,
    pub optimal_value: f64,
    pub optimal_residual: f64,
}

/// Univariate, derivative-free search.
pub fn univariate_descent(
    config: &UnivariateDescentConfig,
    mut loss_f: impl FnMut(f64) -> f64,
) -> Result<UnivariateDescentOutcome, anyhow::Error> {
    config.validate()?;

    let mut steps = 0;
    let mut residual = loss_f(config.init_value);
    if residual <= config.acceptable_residual {
        return Ok(UnivariateDescentOutcome {
            steps: 0,
            optimal_value: config.init_value,
            optimal_residual: residual,
        });
    }

    let (mut value, mut step) = (config.init_value, config.init_step);
    let (mut optimal_value, mut optimal_residual) = (value, residual);
    while steps < config.max_steps {
        steps += 1;
        let new_value = value + step;
        let new_residual = loss_f(new_value);

        if new_residual > residual {
            step = -step * 0.5;
            if step.abs() < config.min_step {
                break;
            }
        } else if new_residual < optimal_residual {
            optimal_residual = new_residual;
            optimal_value = new_value;

            if optimal_residual <= config.acceptable_residual {
                break;
            }
        }
        residual = new_residual;
        value = new_value;
    }
    Ok(UnivariateDescentOutcome {
        steps,
        optimal_value,
        optimal_residual,
    })
}

#[derive(Clone, Debug)]
pub struct GridSearchConfig {
    pub bounds: RangeInclusive<f64>,
    pub resolution: usize,
    pub max_steps: u64,
    pub acceptable_residual: f64,
}
impl GridSearchConfig {
    const MIN_RESOLUTION: usize = 3;

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_steps == 0 {
            bail!("at least one step must be specified")
        }
        if self.acceptable_residual < 0.0 {
            bail!("acceptable residual must be non-negative")
        }
        if !self.bounds.start().is_finite()
            || !self.bounds.end().is_finite()
            || self.bounds.start() >= self.bounds.end()
        {
            bail!("search bounds {:?} must be finite and non-empty", self.bounds)
        }
        if self.resolution < Self::MIN_RESOLUTION {
            bail!("search resolution must be at least {}", Self::MIN_RESOLUTION)
        }
        Ok(())
    }

    /// Upper limit on the number of times the loss function is evaluated.
    pub fn max_evaluations(&self) -> u64 {
        self.max_steps * self.resolution as u64
    }
}

#[derive(Debug)]
pub struct GridSearchOutcome {
    pub steps: u64,
    pub evaluations: u64,
    pub optimal_value: f64,
    pub optimal_residual: f64,
}

/// Coarse-to-fine univariate grid search. Each step evaluates `resolution` evenly spaced points across
/// the current bounds, then narrows the bounds to one grid spacing either side of the best point found so
/// far, never leaving the initial bounds. Non-finite residuals are skipped.
pub fn grid_search(
    config: &GridSearchConfig,
    mut loss_f: impl FnMut(f64) -> f64,
) -> Result<GridSearchOutcome, anyhow::Error> {
    config.validate()?;

    let (hard_start, hard_end) = (*config.bounds.start(), *config.bounds.end());
    let (mut start, mut end) = (hard_start, hard_end);
    let inv_resolution = 1.0 / (config.resolution - 1) as f64;
    let mut steps = 0;
    let mut evaluations = 0;
    let mut optimal_value = start;
    let mut optimal_residual = f64::MAX;

    'outer: while steps < config.max_steps {
        steps += 1;
        let spacing = (end - start) * inv_resolution;
        for ordinal in 0..config.resolution {
            let value = start + ordinal as f64 * spacing;
            let residual = loss_f(value);
            evaluations += 1;
            if residual.is_finite() && residual < optimal_residual {
                optimal_residual = residual;
                optimal_value = value;

                if residual <= config.acceptable_residual {
                    break 'outer;
                }
            }
        }

        start = f64::max(hard_start, optimal_value - spacing);
        end = f64::min(hard_end, optimal_value + spacing);
        if end <= start {
            break;
        }
    }

    Ok(GridSearchOutcome {
        steps,
        evaluations,
        optimal_value,
        optimal_residual,
    })
}

#[cfg(test)]
mod tests;
