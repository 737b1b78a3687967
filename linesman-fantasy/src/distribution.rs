//! Construction of a per-market outcome distribution and the extraction of its floor, mid and ceiling.
//!
//! A yes/no market is always Bernoulli. Otherwise, the configured [`ModelKind`] is attempted first and,
//! should it fail for want of anchors or a usable fit, the next model in its fallback chain is tried.
//! Every chain terminates at [`ModelKind::Baseline`], which needs nothing beyond a consensus summary.

use linesman::interp::{check_anchors, linear_inverse, InterpError, Pchip};
use linesman::isotonic::pool_adjacent_violators;
use linesman::lognormal::LogNormal;
use linesman::market::OverroundMethod;
use linesman::normal;
use linesman::poisson::{self, MAX_QUANTILE};
use linesman::probs::{clamp_unit, SliceExt};
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};
use thiserror::Error;
use tracing::{debug, trace};

use crate::config::ModelConfig;
use crate::consensus::ConsensusSummary;
use crate::devig::extract;
use crate::domain::StatMarket;
use crate::lines::MarketObservations;
use crate::quantiles::StatRange;


/// Probabilities are kept this far from 0 and 1 before conversion to a z-score.
const Z_PROB_LIMIT: f64 = 1e-4;

/// A z-score smaller than this in magnitude marks a 50/50 line.
const FLAT_Z: f64 = 1e-6;

const MIN_SIGMA: f64 = 1e-6;

/// Slack when deciding whether a quantile level lies outside the anchored span.
const TAIL_SLACK: f64 = 1e-9;

/// Number of outermost anchors a Poisson tail is fitted to.
const POISSON_TAIL_ANCHORS: usize = 3;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Hash,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModelKind {
    /// Normal approximation around a single consensus line.
    Baseline,

    /// Linear interpolation through the anchored CDF.
    Linear,

    /// Monotone cubic interpolation through the anchored CDF.
    Pchip,

    /// Monotone cubic interpolation with parametric tails beyond the outermost anchors.
    #[default]
    Tails,
}
impl ModelKind {
    /// Models to attempt, in order, when this model is selected.
    pub fn fallbacks(&self) -> &'static [ModelKind] {
        match self {
            ModelKind::Baseline => &[ModelKind::Baseline],
            ModelKind::Linear => &[ModelKind::Linear, ModelKind::Baseline],
            ModelKind::Pchip => &[ModelKind::Pchip, ModelKind::Baseline],
            ModelKind::Tails => &[ModelKind::Tails, ModelKind::Pchip, ModelKind::Baseline],
        }
    }

    fn tier(&self) -> Tier {
        match self {
            ModelKind::Baseline => Tier::Normal,
            ModelKind::Linear => Tier::Linear,
            ModelKind::Pchip => Tier::Pchip,
            ModelKind::Tails => Tier::Tails,
        }
    }
}

/// The method that ultimately produced a market's range.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tier {
    Bernoulli,
    Normal,
    Linear,
    Pchip,
    Tails,

    /// Naive band around a best-effort mean, for markets without a consensus.
    Fallback,
}

#[derive(Debug, Error, PartialEq)]
pub enum DistributionError {
    #[error("{found} anchor(s) where {required} are required")]
    InsufficientAnchors { found: usize, required: usize },

    #[error("interpolation failed: {0}")]
    Interp(#[from] InterpError),

    #[error("tail fit failed: {0}")]
    TailFit(String),

    #[error("non-finite quantile")]
    NonFinite,
}

/// Monotone CDF anchors: thresholds in strictly increasing order and the CDF at each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Anchors {
    pub thresholds: Vec<f64>,
    pub cdf: Vec<f64>,
}
impl Anchors {
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

/// Collects an anchor from every line (primary and alternate) of every book, taking the median
/// survival probability at each distinct threshold. The resulting CDF is made non-decreasing by
/// isotonic regression.
pub fn collect_anchors(observations: &MarketObservations, method: &OverroundMethod) -> Anchors {
    let mut raw = vec![];
    for lines in observations.books.values() {
        for pair in lines.lines() {
            let Some(point) = pair.point().filter(|point| point.is_finite()) else {
                continue;
            };
            if let Some(survival) = extract(pair, method).survival() {
                raw.push((point, survival));
            }
        }
    }
    raw.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut thresholds = Vec::with_capacity(raw.len());
    let mut cdf = Vec::with_capacity(raw.len());
    let mut start = 0;
    while start < raw.len() {
        let point = raw[start].0;
        let end = start + raw[start..].iter().take_while(|(other, _)| *other == point).count();
        let survivals: Vec<_> = raw[start..end].iter().map(|(_, survival)| *survival).collect();
        if let Some(survival) = survivals.median() {
            thresholds.push(point);
            cdf.push(clamp_unit(1.0 - survival));
        }
        start = end;
    }

    let cdf = pool_adjacent_violators(&cdf).into_iter().map(clamp_unit).collect();
    Anchors { thresholds, cdf }
}

/// Point estimate of the stat: the threshold shifted towards the more likely side. For a yes/no
/// market, the probability of the event.
pub fn weighted_mean(market: StatMarket, summary: &ConsensusSummary, config: &ModelConfig) -> f64 {
    let (over, under) = summary.normalised(config.default_over_prob);
    if is_binary(market, summary) {
        return over;
    }
    summary.threshold + (over - under) * config.mean_scaling * summary.threshold
}

/// Standard deviation of the normal distribution with the given mean that places `p_over` of its
/// mass above `threshold`.
pub fn implied_sigma(mean: f64, threshold: f64, p_over: f64, config: &ModelConfig) -> f64 {
    let z = normal::inv_cdf(p_over.clamp(Z_PROB_LIMIT, 1.0 - Z_PROB_LIMIT));
    if z.abs() < FLAT_Z {
        return f64::max(threshold.abs() * config.flat_sigma_fraction, config.min_flat_sigma);
    }
    f64::max((mean - threshold).abs() / z.abs(), MIN_SIGMA)
}

fn is_binary(market: StatMarket, summary: &ConsensusSummary) -> bool {
    market.is_binary() || summary.threshold == 0.0
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tail {
    LogNormal(LogNormal),
    Poisson { lambda: f64 },
}
impl Tail {
    pub fn quantile(&self, q: f64) -> f64 {
        match self {
            Tail::LogNormal(lognormal) => lognormal.quantile(q),
            Tail::Poisson { lambda } => poisson::quantile(q, *lambda, MAX_QUANTILE) as f64,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Distribution {
    Bernoulli { p: f64 },
    Normal { mean: f64, sigma: f64 },
    Linear { thresholds: Vec<f64>, cdf: Vec<f64> },
    Pchip(Pchip),
    Tails {
        pchip: Pchip,
        lower: Option<Tail>,
        upper: Option<Tail>,
    },
}
impl Distribution {
    /// The smallest outcome whose CDF reaches `q`.
    pub fn quantile(&self, q: f64, max_newton_steps: usize) -> Result<f64, DistributionError> {
        let value = match self {
            Distribution::Bernoulli { p } => {
                if q <= 1.0 - p {
                    0.0
                } else {
                    1.0
                }
            }
            Distribution::Normal { mean, sigma } => mean + normal::inv_cdf(q) * sigma,
            Distribution::Linear { thresholds, cdf } => linear_inverse(thresholds, cdf, q)?,
            Distribution::Pchip(pchip) => pchip.inverse(q, max_newton_steps),
            Distribution::Tails { pchip, lower, upper } => {
                let ys = pchip.ys();
                match (lower, upper) {
                    (Some(lower), _) if q < ys[0] => lower.quantile(q),
                    (_, Some(upper)) if q > ys[ys.len() - 1] => upper.quantile(q),
                    _ => pchip.inverse(q, max_newton_steps),
                }
            }
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(DistributionError::NonFinite)
        }
    }

    /// The floor/mid/ceiling of the distribution, clamped to be non-negative and ordered. The mid of a
    /// Bernoulli is its probability and that of a normal is its mean; other distributions take the
    /// quantile at the mid level.
    pub fn range(&self, config: &ModelConfig) -> Result<StatRange, DistributionError> {
        let levels = &config.levels;
        let steps = config.max_newton_steps;
        let mid = match self {
            Distribution::Bernoulli { p } => *p,
            Distribution::Normal { mean, .. } => *mean,
            _ => self.quantile(levels.mid, steps)?,
        };
        let range = StatRange::new(self.quantile(levels.floor, steps)?, mid, self.quantile(levels.ceiling, steps)?);
        if range.is_finite() {
            Ok(range.clamped())
        } else {
            Err(DistributionError::NonFinite)
        }
    }
}

/// A market's fitted distribution together with its range.
#[derive(Debug, Clone)]
pub struct MarketFit {
    pub tier: Tier,
    pub distribution: Distribution,
    pub range: StatRange,

    /// Number of distinct thresholds anchoring the CDF.
    pub anchors: usize,

    /// Spread of the normal approximation around the mid, used for expected milestone bonuses.
    pub sigma: Option<f64>,
}

/// Fits a distribution to one market, working through the fallback chain of the configured model.
pub fn fit(
    market: StatMarket,
    observations: &MarketObservations,
    summary: &ConsensusSummary,
    config: &ModelConfig,
) -> MarketFit {
    let (p_over, _) = summary.normalised(config.default_over_prob);
    if is_binary(market, summary) {
        let distribution = Distribution::Bernoulli { p: p_over };
        let range = distribution.range(config).unwrap_or_default();
        return MarketFit {
            tier: Tier::Bernoulli,
            distribution,
            range,
            anchors: 0,
            sigma: None,
        };
    }

    let anchors = collect_anchors(observations, &config.overround_method);
    for kind in config.model.fallbacks() {
        let fitted = build(*kind, market, &anchors, summary, config)
            .and_then(|distribution| distribution.range(config).map(|range| (distribution, range)));
        match fitted {
            Ok((distribution, range)) => {
                let sigma = match &distribution {
                    Distribution::Normal { sigma, .. } => *sigma,
                    _ => implied_sigma(range.mid, summary.threshold, p_over, config),
                };
                trace!("{market} fitted by {kind} from {} anchor(s): {range:?}", anchors.len());
                return MarketFit {
                    tier: kind.tier(),
                    distribution,
                    range,
                    anchors: anchors.len(),
                    sigma: Some(sigma),
                };
            }
            Err(err) => debug!("{market}: {kind} model unusable: {err}"),
        }
    }

    // reached only for a non-finite summary
    let mean = weighted_mean(market, summary, config);
    MarketFit {
        tier: Tier::Fallback,
        distribution: Distribution::Normal { mean, sigma: 0.0 },
        range: StatRange::band(mean, config.fallback_band),
        anchors: anchors.len(),
        sigma: None,
    }
}

fn build(
    kind: ModelKind,
    market: StatMarket,
    anchors: &Anchors,
    summary: &ConsensusSummary,
    config: &ModelConfig,
) -> Result<Distribution, DistributionError> {
    match kind {
        ModelKind::Baseline => {
            let (p_over, _) = summary.normalised(config.default_over_prob);
            let mean = weighted_mean(market, summary, config);
            let sigma = implied_sigma(mean, summary.threshold, p_over, config);
            Ok(Distribution::Normal { mean, sigma })
        }
        ModelKind::Linear => {
            require(anchors, config.min_anchors)?;
            check_anchors(&anchors.thresholds, &anchors.cdf)?;
            Ok(Distribution::Linear {
                thresholds: anchors.thresholds.clone(),
                cdf: anchors.cdf.clone(),
            })
        }
        ModelKind::Pchip => {
            require(anchors, config.min_anchors)?;
            Ok(Distribution::Pchip(Pchip::new(anchors.thresholds.clone(), anchors.cdf.clone())?))
        }
        ModelKind::Tails => {
            require(anchors, config.min_tail_anchors)?;
            let pchip = Pchip::new(anchors.thresholds.clone(), anchors.cdf.clone())?;
            let (first, last) = (anchors.cdf[0], anchors.cdf[anchors.len() - 1]);
            let lower = if config.levels.floor < first - TAIL_SLACK {
                Some(fit_tail(market, anchors, TailSide::Lower, config)?)
            } else {
                None
            };
            let upper = if config.levels.ceiling > last + TAIL_SLACK {
                Some(fit_tail(market, anchors, TailSide::Upper, config)?)
            } else {
                None
            };
            Ok(Distribution::Tails { pchip, lower, upper })
        }
    }
}

fn require(anchors: &Anchors, required: usize) -> Result<(), DistributionError> {
    if anchors.len() < required {
        Err(DistributionError::InsufficientAnchors {
            found: anchors.len(),
            required,
        })
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum TailSide {
    Lower,
    Upper,
}

/// Fits a Poisson tail to the nearest few anchors of a count market, or a lognormal tail through the
/// two outermost anchors of a continuous one.
fn fit_tail(market: StatMarket, anchors: &Anchors, side: TailSide, config: &ModelConfig) -> Result<Tail, DistributionError> {
    let pairs: Vec<_> = anchors.thresholds.iter().copied().zip(anchors.cdf.iter().copied()).collect();
    if market.is_discrete() {
        let take = POISSON_TAIL_ANCHORS.min(pairs.len());
        let nearest = match side {
            TailSide::Lower => &pairs[..take],
            TailSide::Upper => &pairs[pairs.len() - take..],
        };
        // a count exceeds x.5 exactly when it exceeds x
        let counts: Vec<_> = nearest
            .iter()
            .map(|&(threshold, cdf)| (threshold.max(0.0).floor() as u32, cdf))
            .collect();
        let lambda = poisson::fit_lambda(&counts, &config.lambda_search)
            .map_err(|err| DistributionError::TailFit(err.to_string()))?;
        Ok(Tail::Poisson { lambda })
    } else {
        let (a, b) = match side {
            TailSide::Lower => (pairs[0], pairs[1]),
            TailSide::Upper => (pairs[pairs.len() - 2], pairs[pairs.len() - 1]),
        };
        LogNormal::fit_two_point(a, b)
            .map(Tail::LogNormal)
            .ok_or_else(|| DistributionError::TailFit(format!("no lognormal through {a:?} and {b:?}")))
    }
}
