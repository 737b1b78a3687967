//! Fantasy scoring rules: per-unit multipliers and milestone bonuses.

use std::sync::LazyLock;

use linesman::normal;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::trace;

use crate::domain::StatMarket;

static BONUS_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^bonus_([a-z_]+)_(\d+)$").unwrap());

const BONUS_PREFIX: &str = "bonus_";

/// A one-off bonus awarded when a stat reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Milestone {
    pub threshold: f64,
    pub bonus: f64,
}

/// How milestone bonuses are awarded for a stat value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BonusMode {
    /// The bonus of the highest milestone reached.
    Discrete,

    /// The sum of each milestone's bonus, weighted by the probability of reaching it under a normal
    /// distribution centred on the value.
    Expected { sigma: f64 },

    /// The sum of each milestone's bonus, ramped in linearly over the last `fraction` below it.
    Proximity { fraction: f64 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringRules {
    multipliers: FxHashMap<String, f64>,
    milestones: FxHashMap<String, Vec<Milestone>>,
}
impl ScoringRules {
    /// Builds the rules from short-codes. Codes of the form `bonus_<stat>_<threshold>` become milestones
    /// of `<stat>`; other `bonus_` codes and non-finite values are ignored.
    pub fn new(rules: impl IntoIterator<Item = (String, f64)>) -> Self {
        let mut multipliers = FxHashMap::default();
        let mut milestones: FxHashMap<String, Vec<Milestone>> = FxHashMap::default();
        for (code, value) in rules {
            if !value.is_finite() {
                trace!("ignoring non-finite rule {code}={value}");
                continue;
            }
            if !code.starts_with(BONUS_PREFIX) {
                multipliers.insert(code, value);
                continue;
            }
            match BONUS_CODE.captures(&code) {
                Some(captures) => {
                    let threshold = captures[2].parse::<f64>().unwrap_or(f64::NAN);
                    milestones.entry(captures[1].to_string()).or_default().push(Milestone {
                        threshold,
                        bonus: value,
                    });
                }
                None => trace!("ignoring unparseable bonus code {code}"),
            }
        }
        for tiers in milestones.values_mut() {
            tiers.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        }
        Self {
            multipliers,
            milestones,
        }
    }

    pub fn multiplier(&self, code: &str) -> Option<f64> {
        self.multipliers.get(code).copied()
    }

    /// Points-per-reception scoring.
    pub fn is_ppr(&self) -> bool {
        self.multiplier("rec").is_some_and(|points| points > 0.0)
    }

    /// Points per unit of the market's stat, taken from the first of its codes present in the rules.
    /// Interceptions always cost points, irrespective of the sign under which the penalty is stored.
    pub fn stat_multiplier(&self, market: StatMarket) -> Option<f64> {
        let multiplier = market.stat_codes().iter().find_map(|code| self.multiplier(code))?;
        match market {
            StatMarket::PassInterceptions => Some(-multiplier.abs()),
            _ => Some(multiplier),
        }
    }

    pub fn milestones(&self, market: StatMarket) -> &[Milestone] {
        market
            .stat_codes()
            .first()
            .and_then(|code| self.milestones.get(*code))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn base_points(&self, market: StatMarket, value: f64) -> f64 {
        self.stat_multiplier(market).unwrap_or_default() * value
    }

    pub fn bonus(&self, market: StatMarket, value: f64, mode: BonusMode) -> f64 {
        let milestones = self.milestones(market);
        match mode {
            BonusMode::Discrete => milestones
                .iter()
                .rev()
                .find(|milestone| value >= milestone.threshold)
                .map(|milestone| milestone.bonus)
                .unwrap_or_default(),
            BonusMode::Expected { sigma } => milestones
                .iter()
                .map(|milestone| milestone.bonus * normal::survival(milestone.threshold, value, sigma))
                .sum(),
            BonusMode::Proximity { fraction } => milestones
                .iter()
                .map(|milestone| milestone.bonus * proximity_ramp(value, milestone.threshold, fraction))
                .sum(),
        }
    }

    /// Fantasy points for a stat value, bonuses included.
    pub fn points(&self, market: StatMarket, value: f64, mode: BonusMode) -> f64 {
        self.base_points(market, value) + self.bonus(market, value, mode)
    }
}

/// 1 at or above `threshold`, 0 below `threshold·(1 − fraction)`, linear in between.
fn proximity_ramp(value: f64, threshold: f64, fraction: f64) -> f64 {
    if value >= threshold {
        return 1.0;
    }
    let start = threshold * (1.0 - fraction);
    let width = threshold * fraction;
    if value <= start || width <= 0.0 {
        0.0
    } else {
        (value - start) / width
    }
}
