//! Odds and roster payloads, and their conversion into per-player lines.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::Context;
use linesman::file::read_json;
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::domain::{MarketKey, PlayerIdentity, Position, Side};
use crate::lines::{PlayerOdds, Quote};
use crate::scoring::ScoringRules;

static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.'`\-]").unwrap());
static NON_ALPHANUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9 ]").unwrap());

const NAME_SUFFIXES: [&str; 6] = ["jr", "sr", "ii", "iii", "iv", "v"];

/// One sporting event as served by an odds provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventOdds {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
    #[serde(default)]
    pub bookmakers: Vec<BookmakerOdds>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmakerOdds {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub markets: Vec<MarketOdds>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketOdds {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<OutcomeOdds>,
}

/// A single priced outcome. Player props carry the side in `name` and the player in `description`;
/// single-sided markets may instead carry the player in `name`. Prices and points are kept as raw
/// JSON, as providers are not consistent in how they encode them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeOdds {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub point: Value,
}
impl OutcomeOdds {
    /// The player the outcome is for and the side it backs, if the outcome names a player.
    pub fn player_and_side(&self) -> Option<(&str, Side)> {
        match self.description.as_deref().map(str::trim).filter(|player| !player.is_empty()) {
            Some(player) => Some((player, Side::from_label(&self.name))),
            None => {
                let name = self.name.trim();
                let named = !name.is_empty() && name.parse::<Side>().is_err();
                named.then_some((name, Side::Over))
            }
        }
    }

    pub fn quote(&self) -> Quote {
        Quote {
            price: parse_number(&self.price),
            point: parse_number(&self.point),
        }
    }
}

/// A file may hold a single event or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EventsPayload {
    Many(Vec<EventOdds>),
    One(EventOdds),
}
impl EventsPayload {
    pub fn into_events(self) -> Vec<EventOdds> {
        match self {
            EventsPayload::Many(events) => events,
            EventsPayload::One(event) => vec![event],
        }
    }
}

/// A finite number, from either a JSON number or a numeric string.
pub fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(string) => string.trim().parse().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Canonical form of a player name for matching across providers: lowercase alphanumerics separated by
/// single spaces, without generational suffixes.
pub fn normalise_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let spaced = PUNCTUATION.replace_all(&lower, " ");
    let stripped = NON_ALPHANUMERIC.replace_all(&spaced, "");
    stripped
        .split_whitespace()
        .filter(|token| !NAME_SUFFIXES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lines for every player across a set of events, keyed by normalised name.
#[derive(Debug, Default)]
pub struct OddsBoard {
    players: FxHashMap<String, PlayerOdds>,
}
impl OddsBoard {
    /// Records every outcome of the event. A repeated outcome for the same player, bookmaker, market,
    /// side and (for alternates) point replaces the one recorded earlier.
    pub fn ingest(&mut self, event: &EventOdds) {
        let mut outcomes = 0;
        for book in &event.bookmakers {
            for market in &book.markets {
                let (key, alternate) = MarketKey::parse_raw(&market.key);
                for outcome in &market.outcomes {
                    let Some((player, side)) = outcome.player_and_side() else {
                        trace!("skipping outcome without a player in {} {}", book.key, market.key);
                        continue;
                    };
                    let player = normalise_name(player);
                    if player.is_empty() {
                        trace!("skipping outcome for unnamed player '{}'", outcome.name);
                        continue;
                    }
                    self.players
                        .entry(player)
                        .or_default()
                        .record(&book.key, key.clone(), alternate, side, outcome.quote());
                    outcomes += 1;
                }
            }
        }
        debug!("ingested {outcomes} outcome(s) from event {}", event.id);
    }

    pub fn read_files(paths: &[PathBuf]) -> Result<Self, anyhow::Error> {
        let mut board = Self::default();
        for path in paths {
            let payload: EventsPayload =
                read_json(path).with_context(|| format!("reading odds from {}", path.display()))?;
            for event in payload.into_events() {
                board.ingest(&event);
            }
        }
        Ok(board)
    }

    /// The lines of the player quoted under `alias`, matched by normalised name.
    pub fn get(&self, alias: &str) -> Option<&PlayerOdds> {
        self.players.get(&normalise_name(alias))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

/// Roster names mapped to the names under which odds providers quote the players.
pub type AliasTable = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterPlayer {
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Players to project and the league's scoring short-codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub players: Vec<RosterPlayer>,
    #[serde(default)]
    pub scoring_rules: BTreeMap<String, Value>,
}
impl Roster {
    /// Numeric scoring rules; anything else is skipped.
    pub fn scoring_rules(&self) -> ScoringRules {
        ScoringRules::new(self.scoring_rules.iter().filter_map(|(code, value)| match parse_number(value) {
            Some(points) => Some((code.clone(), points)),
            None => {
                warn!("ignoring non-numeric scoring rule {code}={value}");
                None
            }
        }))
    }

    /// Player identities with their odds-provider aliases resolved: an alias given on the roster wins over
    /// one from `aliases`, which wins over the player's own name.
    pub fn identities(&self, aliases: &AliasTable) -> Vec<PlayerIdentity> {
        self.players
            .iter()
            .map(|player| {
                let alias = player
                    .alias
                    .as_ref()
                    .or_else(|| aliases.get(&player.name))
                    .cloned()
                    .unwrap_or_else(|| player.name.clone());
                PlayerIdentity::new(player.name.clone(), player.position.clone(), player.team.clone()).with_alias(alias)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatMarket;
    use serde_json::json;

    fn event() -> EventOdds {
        serde_json::from_value(json!({
            "id": "e1",
            "home_team": "Detroit Lions",
            "away_team": "Chicago Bears",
            "bookmakers": [
                {
                    "key": "fanduel",
                    "title": "FanDuel",
                    "markets": [
                        {
                            "key": "player_reception_yds",
                            "outcomes": [
                                {"name": "Over", "description": "Amon-Ra St. Brown", "price": 1.87, "point": 79.5},
                                {"name": "Under", "description": "Amon-Ra St. Brown", "price": "1.93", "point": "79.5"},
                                {"name": "Over", "description": "Amon-Ra St. Brown", "price": 1.9, "point": 80.5}
                            ]
                        },
                        {
                            "key": "player_reception_yds_alternate",
                            "outcomes": [
                                {"name": "Over", "description": "Amon-Ra St. Brown", "price": 1.3, "point": 59.5},
                                {"name": "Under", "description": "Amon-Ra St. Brown", "price": 3.2, "point": 59.5}
                            ]
                        },
                        {
                            "key": "player_anytime_td",
                            "outcomes": [
                                {"name": "Yes", "description": "Amon-Ra St. Brown", "price": 2.1},
                                {"name": "D'Andre Swift", "price": "n/a"}
                            ]
                        }
                    ]
                },
                {
                    "key": "draftkings",
                    "markets": [
                        {
                            "key": "player_rush_attempts",
                            "outcomes": [
                                {"name": "Over", "description": "D'Andre Swift", "price": 1.9, "point": 14.5},
                                {"name": "Over", "description": "", "price": 1.9, "point": 14.5}
                            ]
                        }
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn numbers_from_json() {
        assert_eq!(Some(1.91), parse_number(&json!(1.91)));
        assert_eq!(Some(-110.0), parse_number(&json!(-110)));
        assert_eq!(Some(65.5), parse_number(&json!(" 65.5 ")));
        assert_eq!(None, parse_number(&json!("n/a")));
        assert_eq!(None, parse_number(&json!("NaN")));
        assert_eq!(None, parse_number(&Value::Null));
        assert_eq!(None, parse_number(&json!([1.0])));
    }

    #[test]
    fn normalised_names() {
        assert_eq!("amon ra st brown", normalise_name("Amon-Ra St. Brown"));
        assert_eq!("amon ra st brown", normalise_name("Amon-Ra St.Brown"));
        assert_eq!("marvin harrison", normalise_name("Marvin Harrison Jr."));
        assert_eq!("kenneth walker", normalise_name("Kenneth Walker III"));
        assert_eq!("dandre swift", normalise_name("D’Andre Swift"));
        assert_eq!("d andre swift", normalise_name("D'Andre  Swift"));
        assert_eq!("", normalise_name("  ."));
    }

    #[test]
    fn outcome_player_and_side() {
        let outcome = OutcomeOdds {
            name: "Under".into(),
            description: Some("Josh Allen".into()),
            ..OutcomeOdds::default()
        };
        assert_eq!(Some(("Josh Allen", Side::Under)), outcome.player_and_side());
        let outcome = OutcomeOdds {
            name: " Josh Allen ".into(),
            ..OutcomeOdds::default()
        };
        assert_eq!(Some(("Josh Allen", Side::Over)), outcome.player_and_side());
        let outcome = OutcomeOdds {
            name: "Over".into(),
            description: Some(" ".into()),
            ..OutcomeOdds::default()
        };
        assert_eq!(None, outcome.player_and_side());
    }

    #[test]
    fn ingest_event() {
        let mut board = OddsBoard::default();
        board.ingest(&event());
        assert_eq!(2, board.len());

        let odds = board.get("Amon-Ra St.Brown").unwrap();
        let receiving = &odds.get(StatMarket::ReceptionYards).unwrap().books["fanduel"];
        assert_eq!(Some(Quote::new(1.9, 80.5)), receiving.primary.over);
        // the under side was quoted at the superseded line
        assert_eq!(None, receiving.primary.under);
        assert_eq!(1, receiving.alternates.len());
        assert_eq!(Some(59.5), receiving.alternates[0].point());
        let anytime = &odds.get(StatMarket::AnytimeTd).unwrap().books["fanduel"];
        assert_eq!(Some(Quote::unpointed(2.1)), anytime.primary.over);

        let swift = board.get("D'Andre Swift").unwrap();
        let anytime = &swift.get(StatMarket::AnytimeTd).unwrap().books["fanduel"];
        assert_eq!(Some(Quote::default()), anytime.primary.over);
        assert!(swift.markets.contains_key(&MarketKey::Other("player_rush_attempts".into())));
        assert_eq!(None, board.get("Jared Goff"));
    }

    #[test]
    fn events_payload_shapes() {
        let one: EventsPayload = serde_json::from_value(json!({"id": "e1", "bookmakers": []})).unwrap();
        assert_eq!(1, one.into_events().len());
        let many: EventsPayload = serde_json::from_value(json!([{"id": "e1"}, {"id": "e2"}])).unwrap();
        assert_eq!(2, many.into_events().len());
    }

    #[test]
    fn roster_rules_and_aliases() {
        let roster: Roster = serde_json::from_value(json!({
            "players": [
                {"name": "Amon-Ra St. Brown", "position": "WR", "team": "DET"},
                {"name": "Kenneth Walker III", "position": "rb", "alias": "Ken Walker"},
                {"name": "Justin Tucker", "position": "K"}
            ],
            "scoring_rules": {"rec": 0.5, "rush_yd": "0.1", "bonus_rush_yd_100": 3, "notes": "half ppr"}
        }))
        .unwrap();

        let rules = roster.scoring_rules();
        assert!(rules.is_ppr());
        assert_eq!(Some(0.1), rules.multiplier("rush_yd"));
        assert_eq!(None, rules.multiplier("notes"));
        assert_eq!(1, rules.milestones(StatMarket::RushYards).len());

        let aliases = AliasTable::from([
            ("Amon-Ra St. Brown".to_string(), "Amon-Ra St.Brown".to_string()),
            ("Kenneth Walker III".to_string(), "Kenneth Walker".to_string()),
        ]);
        let identities = roster.identities(&aliases);
        assert_eq!("Amon-Ra St.Brown", identities[0].alias);
        assert_eq!(Position::WideReceiver, identities[0].position);
        assert_eq!("Ken Walker", identities[1].alias);
        assert_eq!(Position::RunningBack, identities[1].position);
        assert_eq!("Justin Tucker", identities[2].alias);
        assert_eq!(None, identities[2].team);
    }
}
