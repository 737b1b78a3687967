use std::fmt::{Display, Formatter};
use std::str::FromStr;

use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum_macros::{EnumCount, EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

/// Suffix that marks a market carrying alternate lines of a base market.
pub const ALTERNATE_SUFFIX: &str = "_alternate";

/// Player markets that feed the fantasy projection, keyed the way odds providers key them.
#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumCount,
    EnumString,
    IntoStaticStr,
    strum_macros::Display,
)]
pub enum StatMarket {
    #[strum(serialize = "player_pass_yds")]
    #[serde(rename = "player_pass_yds")]
    PassYards,

    #[strum(serialize = "player_pass_tds")]
    #[serde(rename = "player_pass_tds")]
    PassTds,

    #[strum(serialize = "player_pass_interceptions")]
    #[serde(rename = "player_pass_interceptions")]
    PassInterceptions,

    #[strum(serialize = "player_rush_yds")]
    #[serde(rename = "player_rush_yds")]
    RushYards,

    #[strum(serialize = "player_rush_tds")]
    #[serde(rename = "player_rush_tds")]
    RushTds,

    #[strum(serialize = "player_receptions")]
    #[serde(rename = "player_receptions")]
    Receptions,

    #[strum(serialize = "player_reception_yds")]
    #[serde(rename = "player_reception_yds")]
    ReceptionYards,

    #[strum(serialize = "player_reception_tds")]
    #[serde(rename = "player_reception_tds")]
    ReceptionTds,

    #[strum(serialize = "player_anytime_td")]
    #[serde(rename = "player_anytime_td")]
    AnytimeTd,
}
impl StatMarket {
    pub fn key(&self) -> &'static str {
        self.into()
    }

    /// Scoring short-codes that price one unit of this market, in order of preference.
    pub fn stat_codes(&self) -> &'static [&'static str] {
        match self {
            StatMarket::PassYards => &["pass_yd"],
            StatMarket::PassTds => &["pass_td"],
            StatMarket::PassInterceptions => &["pass_int"],
            StatMarket::RushYards => &["rush_yd"],
            StatMarket::RushTds => &["rush_td"],
            StatMarket::Receptions => &["rec"],
            StatMarket::ReceptionYards => &["rec_yd"],
            StatMarket::ReceptionTds => &["rec_td"],
            StatMarket::AnytimeTd => &["td", "rush_td", "rec_td"],
        }
    }

    /// Count-valued markets, whose tails are modelled as Poisson rather than lognormal.
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            StatMarket::PassTds
                | StatMarket::PassInterceptions
                | StatMarket::RushTds
                | StatMarket::Receptions
                | StatMarket::ReceptionTds
        )
    }

    /// Yes/no markets, modelled as Bernoulli.
    pub fn is_binary(&self) -> bool {
        matches!(self, StatMarket::AnytimeTd)
    }

    /// Markets whose data also evidences this market's availability.
    pub fn proxies(&self) -> &'static [StatMarket] {
        match self {
            StatMarket::AnytimeTd => &[StatMarket::RushTds, StatMarket::ReceptionTds],
            _ => &[],
        }
    }
}

/// A market as keyed in an odds payload. Markets outside [`StatMarket`] are retained so that they still
/// count towards consensus and diagnostics.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum MarketKey {
    Stat(StatMarket),
    Other(String),
}
impl MarketKey {
    /// Parses a raw payload key, folding `<base>_alternate` into `<base>`. The flag is set if the key
    /// named an alternate market.
    pub fn parse_raw(raw: &str) -> (Self, bool) {
        let raw = raw.trim();
        match raw.strip_suffix(ALTERNATE_SUFFIX) {
            Some(base) => (Self::from(base), true),
            None => (Self::from(raw), false),
        }
    }

    pub fn stat(&self) -> Option<StatMarket> {
        match self {
            MarketKey::Stat(market) => Some(*market),
            MarketKey::Other(_) => None,
        }
    }
}

impl From<StatMarket> for MarketKey {
    fn from(market: StatMarket) -> Self {
        MarketKey::Stat(market)
    }
}

impl From<&str> for MarketKey {
    fn from(key: &str) -> Self {
        match StatMarket::from_str(key) {
            Ok(market) => MarketKey::Stat(market),
            Err(_) => MarketKey::Other(key.to_string()),
        }
    }
}

impl From<String> for MarketKey {
    fn from(key: String) -> Self {
        Self::from(key.as_str())
    }
}

impl From<MarketKey> for String {
    fn from(key: MarketKey) -> Self {
        key.to_string()
    }
}

impl Display for MarketKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketKey::Stat(market) => write!(f, "{market}"),
            MarketKey::Other(key) => write!(f, "{key}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Over,
    Under,
}
impl Side {
    /// Lenient classification of an outcome label. Labels that are neither an over nor an under
    /// (single-sided "yes" markets often carry the player's name) are taken as the over side.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or(Side::Over)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid side label '{0}'")]
pub struct InvalidSide(pub String);

impl FromStr for Side {
    type Err = InvalidSide;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label.trim().to_ascii_lowercase().as_str() {
            "over" | "yes" => Ok(Side::Over),
            "under" | "no" => Ok(Side::Under),
            _ => Err(InvalidSide(label.to_string())),
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Other(String),
}

impl From<&str> for Position {
    fn from(code: &str) -> Self {
        let code = code.trim();
        match code.to_ascii_uppercase().as_str() {
            "QB" => Position::Quarterback,
            "RB" => Position::RunningBack,
            "WR" => Position::WideReceiver,
            "TE" => Position::TightEnd,
            _ => Position::Other(code.to_string()),
        }
    }
}

impl From<String> for Position {
    fn from(code: String) -> Self {
        Self::from(code.as_str())
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.to_string()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Quarterback => write!(f, "QB"),
            Position::RunningBack => write!(f, "RB"),
            Position::WideReceiver => write!(f, "WR"),
            Position::TightEnd => write!(f, "TE"),
            Position::Other(code) => write!(f, "{code}"),
        }
    }
}

/// The three points of a projected range.
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Ordinal, EnumCount, EnumIter, strum_macros::Display,
)]
pub enum Quantile {
    Floor,
    Mid,
    Ceiling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    pub name: String,
    pub position: Position,
    pub team: Option<String>,

    /// The name under which the player is quoted by odds providers.
    pub alias: String,
}
impl PlayerIdentity {
    pub fn new(name: impl Into<String>, position: Position, team: Option<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            position,
            team,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }
}
