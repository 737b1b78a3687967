//! Per-player orchestration: fits every market, scores the resulting ranges and records how much of
//! the projection rests on measured rather than assumed data.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use strum::{EnumCount, IntoEnumIterator};
use tracing::debug;

use crate::config::{ConfigError, ModelConfig};
use crate::consensus::{consensus, ConsensusSummary};
use crate::distribution::{fit, ModelKind, Tier};
use crate::domain::{MarketKey, PlayerIdentity, Position, Quantile, StatMarket};
use crate::lines::{MarketObservations, PlayerOdds};
use crate::quantiles::StatRange;
use crate::scoring::{BonusMode, ScoringRules};
use linesman::probs::SliceExt;


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketProjection {
    pub market: StatMarket,
    pub tier: Tier,
    pub range: StatRange,
    pub consensus: Option<ConsensusSummary>,
    pub anchors: usize,
    pub sigma: Option<f64>,

    /// Cleared for a market whose points are already counted through another market.
    pub scored: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Markets without any bookmaker data.
    pub missing_markets: BTreeSet<StatMarket>,

    /// Markets with data but no usable consensus, projected with the naive band.
    pub fallback_markets: BTreeSet<StatMarket>,

    /// Markets whose consensus assumed one side as the complement of the other.
    pub assumed_markets: BTreeSet<StatMarket>,

    pub missing_vital: BTreeSet<StatMarket>,
    pub missing_minor: BTreeSet<StatMarket>,
    pub fallback_vital: BTreeSet<StatMarket>,
    pub fallback_minor: BTreeSet<StatMarket>,
    pub is_critical: bool,
    pub books_used: usize,
    pub markets_used: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProjection {
    pub name: String,
    pub position: Position,
    pub team: Option<String>,
    pub floor: f64,
    pub mid: f64,
    pub ceiling: f64,
    pub markets: Vec<MarketProjection>,
    pub diagnostics: Diagnostics,
}

/// The markets whose absence matters for a position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Importance {
    pub vital: BTreeSet<StatMarket>,
    pub minor: BTreeSet<StatMarket>,
}

pub fn importance(position: &Position, ppr: bool) -> Importance {
    use StatMarket::*;
    let (vital, minor) = match position {
        Position::Quarterback => (vec![PassYards, PassTds, RushYards, AnytimeTd], vec![PassInterceptions]),
        Position::RunningBack => (vec![RushYards, AnytimeTd], vec![ReceptionYards]),
        Position::WideReceiver | Position::TightEnd => (vec![ReceptionYards, AnytimeTd], vec![RushYards]),
        Position::Other(_) => (vec![AnytimeTd], vec![]),
    };
    let mut importance = Importance {
        vital: vital.into_iter().collect(),
        minor: minor.into_iter().collect(),
    };
    if !matches!(position, Position::Quarterback | Position::Other(_)) {
        if ppr {
            importance.vital.insert(Receptions);
        } else {
            importance.minor.insert(Receptions);
        }
    }
    importance
}

#[derive(Debug)]
pub struct Projector {
    config: ModelConfig,
}
impl Projector {
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn project(&self, identity: &PlayerIdentity, odds: &PlayerOdds, rules: &ScoringRules) -> PlayerProjection {
        let summaries: BTreeMap<&MarketKey, ConsensusSummary> = odds
            .markets
            .iter()
            .filter_map(|(key, observations)| {
                consensus(observations, &self.config.overround_method).map(|summary| (key, summary))
            })
            .collect();

        let mut totals = [0.0; Quantile::COUNT];
        let mut markets = Vec::with_capacity(StatMarket::COUNT);
        let mut diagnostics = Diagnostics {
            books_used: odds.books().len(),
            markets_used: summaries.len(),
            ..Diagnostics::default()
        };
        let anytime_agreed = summaries.contains_key(&MarketKey::Stat(StatMarket::AnytimeTd));
        for market in StatMarket::iter() {
            let observations = odds.get(market);
            let summary = summaries.get(&MarketKey::Stat(market));
            let evidenced = |proxy: &StatMarket| odds.get(*proxy).is_some_and(MarketObservations::has_data);
            let available = observations.is_some_and(MarketObservations::has_data) || market.proxies().iter().any(evidenced);
            let agreed =
                summary.is_some() || market.proxies().iter().any(|proxy| summaries.contains_key(&MarketKey::Stat(*proxy)));
            if !available {
                diagnostics.missing_markets.insert(market);
            } else if !agreed {
                diagnostics.fallback_markets.insert(market);
            }
            if summary.is_some_and(ConsensusSummary::is_assumed) {
                diagnostics.assumed_markets.insert(market);
            }

            let mut projection = match (observations, summary) {
                (Some(observations), Some(summary)) => {
                    let fit = fit(market, observations, summary, &self.config);
                    MarketProjection {
                        market,
                        tier: fit.tier,
                        range: fit.range,
                        consensus: Some(summary.clone()),
                        anchors: fit.anchors,
                        sigma: fit.sigma,
                        scored: true,
                    }
                }
                _ => self.fallback(market, observations),
            };
            // touchdowns priced by the anytime market are not scored again per route
            projection.scored = !(anytime_agreed && StatMarket::AnytimeTd.proxies().contains(&market));
            if projection.scored {
                for quantile in Quantile::iter() {
                    totals[quantile.ordinal()] += self.score(rules, &projection, quantile);
                }
            }
            markets.push(projection);
        }

        let importance = importance(&identity.position, rules.is_ppr());
        let (missing_vital, missing_minor) = partition(&diagnostics.missing_markets, &importance.vital);
        let (fallback_vital, fallback_minor) = partition(&diagnostics.fallback_markets, &importance.vital);
        diagnostics.is_critical = !missing_vital.is_empty() || !fallback_vital.is_empty();
        diagnostics.missing_vital = missing_vital;
        diagnostics.missing_minor = missing_minor;
        diagnostics.fallback_vital = fallback_vital;
        diagnostics.fallback_minor = fallback_minor;

        // negatively scored stats can invert the totals
        let mid = totals[Quantile::Mid.ordinal()];
        let floor = f64::min(totals[Quantile::Floor.ordinal()], mid);
        let ceiling = f64::max(totals[Quantile::Ceiling.ordinal()], mid);
        debug!(
            "{} ({}): {floor:.2}/{mid:.2}/{ceiling:.2}, {} book(s), {} market(s), missing {:?}, fallback {:?}",
            identity.name,
            identity.position,
            diagnostics.books_used,
            diagnostics.markets_used,
            diagnostics.missing_markets,
            diagnostics.fallback_markets
        );
        PlayerProjection {
            name: identity.name.clone(),
            position: identity.position.clone(),
            team: identity.team.clone(),
            floor,
            mid,
            ceiling,
            markets,
            diagnostics,
        }
    }

    /// Projects every player, looking up their odds by alias. Players without odds are projected from no
    /// data at all. The result is ordered by descending mid, then by name.
    pub fn project_all<'a>(
        &self,
        players: &[PlayerIdentity],
        odds: impl Fn(&str) -> Option<&'a PlayerOdds>,
        rules: &ScoringRules,
    ) -> Vec<PlayerProjection> {
        let no_odds = PlayerOdds::default();
        let mut projections: Vec<_> = players
            .iter()
            .map(|player| self.project(player, odds(&player.alias).unwrap_or(&no_odds), rules))
            .collect();
        projections.sort_by(|a, b| b.mid.total_cmp(&a.mid).then_with(|| a.name.cmp(&b.name)));
        projections
    }

    /// A naive band around the median quoted threshold, or around zero if nothing was quoted.
    fn fallback(&self, market: StatMarket, observations: Option<&MarketObservations>) -> MarketProjection {
        let points: Vec<_> = observations
            .into_iter()
            .flat_map(|observations| observations.books.values())
            .flat_map(|lines| lines.lines())
            .filter_map(|pair| pair.point())
            .collect();
        let mean = points.median().unwrap_or_default();
        MarketProjection {
            market,
            tier: Tier::Fallback,
            range: StatRange::band(mean, self.config.fallback_band),
            consensus: None,
            anchors: 0,
            sigma: None,
            scored: true,
        }
    }

    /// Fantasy points of a market at one quantile. The ceiling, and every quantile of the baseline
    /// model, takes the discrete bonus. The floor and mid otherwise share the expected bonus around the
    /// mid, or a proximity ramp when the market has no spread.
    fn score(&self, rules: &ScoringRules, projection: &MarketProjection, quantile: Quantile) -> f64 {
        let market = projection.market;
        let value = projection.range.get(quantile);
        let bonus = if quantile == Quantile::Ceiling || self.config.model == ModelKind::Baseline {
            rules.bonus(market, value, BonusMode::Discrete)
        } else if let Some(sigma) = projection.sigma {
            rules.bonus(market, projection.range.mid, BonusMode::Expected { sigma })
        } else {
            let fraction = self.config.bonus_proximity;
            rules.bonus(market, value, BonusMode::Proximity { fraction })
        };
        rules.base_points(market, value) + bonus
    }
}

impl TryFrom<ModelConfig> for Projector {
    type Error = ConfigError;

    fn try_from(config: ModelConfig) -> Result<Self, Self::Error> {
        config.validate()?;
        Ok(Self { config })
    }
}

fn partition(
    markets: &BTreeSet<StatMarket>,
    vital: &BTreeSet<StatMarket>,
) -> (BTreeSet<StatMarket>, BTreeSet<StatMarket>) {
    markets.iter().partition(|market| vital.contains(*market))
}
