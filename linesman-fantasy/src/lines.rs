//! Bookmaker lines for one player, organised by market and bookmaker.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{MarketKey, Side, StatMarket};

/// One side of a line. Either field may be absent in a malformed or single-sided quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Option<f64>,
    pub point: Option<f64>,
}
impl Quote {
    pub fn new(price: f64, point: f64) -> Self {
        Self {
            price: Some(price),
            point: Some(point),
        }
    }

    pub fn unpointed(price: f64) -> Self {
        Self {
            price: Some(price),
            point: None,
        }
    }
}

/// The over and under sides of a line at a single threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotePair {
    pub over: Option<Quote>,
    pub under: Option<Quote>,
}
impl QuotePair {
    pub fn new(over: Option<Quote>, under: Option<Quote>) -> Self {
        Self { over, under }
    }

    pub fn get(&self, side: Side) -> Option<&Quote> {
        match side {
            Side::Over => self.over.as_ref(),
            Side::Under => self.under.as_ref(),
        }
    }

    /// Replaces the quote on the given `side`.
    pub fn set(&mut self, side: Side, quote: Quote) {
        match side {
            Side::Over => self.over = Some(quote),
            Side::Under => self.under = Some(quote),
        }
    }

    pub fn clear(&mut self, side: Side) {
        match side {
            Side::Over => self.over = None,
            Side::Under => self.under = None,
        }
    }

    /// The threshold of the line, taken from the over side where it has one.
    pub fn point(&self) -> Option<f64> {
        self.over
            .and_then(|quote| quote.point)
            .or_else(|| self.under.and_then(|quote| quote.point))
    }

    pub fn is_empty(&self) -> bool {
        self.over.is_none() && self.under.is_none()
    }
}

/// A bookmaker's lines in one market: the primary line and any alternates at other thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookLines {
    pub primary: QuotePair,
    pub alternates: Vec<QuotePair>,
}
impl BookLines {
    /// Records a primary-line quote. An opposite side quoted at another point is dropped, so that the
    /// primary pair always describes a single threshold.
    pub fn set_primary(&mut self, side: Side, quote: Quote) {
        let other = opposite(side);
        if self.primary.get(other).is_some_and(|existing| existing.point != quote.point) {
            self.primary.clear(other);
        }
        self.primary.set(side, quote);
    }

    /// Records an alternate-line quote, pairing it with the opposite side quoted at the same point.
    pub fn set_alternate(&mut self, side: Side, quote: Quote) {
        let existing = self.alternates.iter_mut().find(|pair| {
            let point = pair
                .get(side)
                .or(pair.get(opposite(side)))
                .and_then(|paired| paired.point);
            point.is_some() && point == quote.point
        });
        match existing {
            Some(pair) => pair.set(side, quote),
            None => {
                let mut pair = QuotePair::default();
                pair.set(side, quote);
                self.alternates.push(pair);
            }
        }
    }

    /// All lines, primary first.
    pub fn lines(&self) -> impl Iterator<Item = &QuotePair> {
        std::iter::once(&self.primary).chain(self.alternates.iter())
    }

    pub fn has_data(&self) -> bool {
        self.lines().any(|pair| !pair.is_empty())
    }

    fn merge(&mut self, other: BookLines) {
        if let Some(over) = other.primary.over {
            self.set_primary(Side::Over, over);
        }
        if let Some(under) = other.primary.under {
            self.set_primary(Side::Under, under);
        }
        for pair in other.alternates {
            if let Some(over) = pair.over {
                self.set_alternate(Side::Over, over);
            }
            if let Some(under) = pair.under {
                self.set_alternate(Side::Under, under);
            }
        }
    }
}

fn opposite(side: Side) -> Side {
    match side {
        Side::Over => Side::Under,
        Side::Under => Side::Over,
    }
}

/// Every bookmaker's lines for one player in one market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketObservations {
    pub books: BTreeMap<String, BookLines>,
}
impl MarketObservations {
    pub fn book_mut(&mut self, book: &str) -> &mut BookLines {
        self.books.entry(book.to_string()).or_default()
    }

    pub fn has_data(&self) -> bool {
        self.books.values().any(BookLines::has_data)
    }
}

/// A player's lines across all markets and bookmakers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerOdds {
    pub markets: BTreeMap<MarketKey, MarketObservations>,
}
impl PlayerOdds {
    /// Records a quote. A later quote for the same bookmaker, market, side and (for alternates) point
    /// replaces the earlier one. A primary quote that moves the line also discards the opposite side
    /// still quoted at the old point.
    pub fn record(&mut self, book: &str, market: MarketKey, alternate: bool, side: Side, quote: Quote) {
        let lines = self.markets.entry(market).or_default().book_mut(book);
        if alternate {
            lines.set_alternate(side, quote);
        } else {
            lines.set_primary(side, quote);
        }
    }

    pub fn get(&self, market: StatMarket) -> Option<&MarketObservations> {
        self.markets.get(&MarketKey::Stat(market))
    }

    /// Folds `other` into this set of lines, with `other` winning on conflicts.
    pub fn merge(&mut self, other: PlayerOdds) {
        for (market, observations) in other.markets {
            let existing = self.markets.entry(market).or_default();
            for (book, lines) in observations.books {
                existing.book_mut(&book).merge(lines);
            }
        }
    }

    /// Distinct bookmakers quoting the player in any market.
    pub fn books(&self) -> BTreeSet<&str> {
        self.markets
            .values()
            .flat_map(|observations| observations.books.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        !self.markets.values().any(MarketObservations::has_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_point_prefers_over() {
        let pair = QuotePair::new(Some(Quote::new(1.9, 65.5)), Some(Quote::new(1.9, 66.5)));
        assert_eq!(Some(65.5), pair.point());
        let pair = QuotePair::new(Some(Quote::unpointed(2.5)), Some(Quote::new(1.5, 0.5)));
        assert_eq!(Some(0.5), pair.point());
        assert_eq!(None, QuotePair::new(Some(Quote::unpointed(2.5)), None).point());
        assert!(QuotePair::default().is_empty());
    }

    #[test]
    fn record_last_write_wins() {
        let mut odds = PlayerOdds::default();
        let market = MarketKey::Stat(StatMarket::RushYards);
        odds.record("fanduel", market.clone(), false, Side::Over, Quote::new(1.87, 65.5));
        odds.record("fanduel", market.clone(), false, Side::Over, Quote::new(1.95, 64.5));
        odds.record("fanduel", market, false, Side::Under, Quote::new(1.85, 64.5));
        let lines = &odds.get(StatMarket::RushYards).unwrap().books["fanduel"];
        assert_eq!(Some(Quote::new(1.95, 64.5)), lines.primary.over);
        assert_eq!(Some(Quote::new(1.85, 64.5)), lines.primary.under);
        assert!(lines.alternates.is_empty());
    }

    #[test]
    fn moved_primary_line_drops_stale_side() {
        let mut odds = PlayerOdds::default();
        let market = MarketKey::Stat(StatMarket::ReceptionYards);
        odds.record("fanduel", market.clone(), false, Side::Over, Quote::new(1.87, 79.5));
        odds.record("fanduel", market.clone(), false, Side::Under, Quote::new(1.93, 79.5));
        odds.record("fanduel", market.clone(), false, Side::Over, Quote::new(1.9, 80.5));
        let lines = &odds.get(StatMarket::ReceptionYards).unwrap().books["fanduel"];
        assert_eq!(QuotePair::new(Some(Quote::new(1.9, 80.5)), None), lines.primary);

        odds.record("fanduel", market, false, Side::Under, Quote::new(1.95, 80.5));
        let lines = &odds.get(StatMarket::ReceptionYards).unwrap().books["fanduel"];
        assert_eq!(
            QuotePair::new(Some(Quote::new(1.9, 80.5)), Some(Quote::new(1.95, 80.5))),
            lines.primary
        );
    }

    #[test]
    fn alternates_paired_by_point() {
        let mut odds = PlayerOdds::default();
        let market = MarketKey::Stat(StatMarket::ReceptionYards);
        odds.record("draftkings", market.clone(), true, Side::Over, Quote::new(1.5, 49.5));
        odds.record("draftkings", market.clone(), true, Side::Over, Quote::new(2.4, 69.5));
        odds.record("draftkings", market.clone(), true, Side::Under, Quote::new(2.6, 49.5));
        odds.record("draftkings", market.clone(), true, Side::Under, Quote::new(1.3, 89.5));
        odds.record("draftkings", market, true, Side::Over, Quote::new(1.55, 49.5));

        let lines = &odds.get(StatMarket::ReceptionYards).unwrap().books["draftkings"];
        assert!(lines.primary.is_empty());
        assert_eq!(
            vec![
                QuotePair::new(Some(Quote::new(1.55, 49.5)), Some(Quote::new(2.6, 49.5))),
                QuotePair::new(Some(Quote::new(2.4, 69.5)), None),
                QuotePair::new(None, Some(Quote::new(1.3, 89.5))),
            ],
            lines.alternates
        );
        assert_eq!(4, lines.lines().count());
        assert!(lines.has_data());
    }

    #[test]
    fn merge_prefers_later() {
        let mut first = PlayerOdds::default();
        first.record("fanduel", StatMarket::Receptions.into(), false, Side::Over, Quote::new(1.8, 3.5));
        first.record("betmgm", StatMarket::Receptions.into(), false, Side::Over, Quote::new(1.9, 3.5));
        let mut second = PlayerOdds::default();
        second.record("fanduel", StatMarket::Receptions.into(), false, Side::Over, Quote::new(1.7, 4.5));
        second.record("fanduel", MarketKey::Other("player_rush_attempts".into()), false, Side::Under, Quote::new(1.9, 12.5));
        first.merge(second);

        let receptions = first.get(StatMarket::Receptions).unwrap();
        assert_eq!(Some(Quote::new(1.7, 4.5)), receptions.books["fanduel"].primary.over);
        assert_eq!(Some(Quote::new(1.9, 3.5)), receptions.books["betmgm"].primary.over);
        assert_eq!(2, first.markets.len());
        assert_eq!(BTreeSet::from(["betmgm", "fanduel"]), first.books());
    }

    #[test]
    fn empty_odds() {
        let mut odds = PlayerOdds::default();
        assert!(odds.is_empty());
        odds.markets.entry(StatMarket::PassYards.into()).or_default().book_mut("fanduel");
        assert!(odds.is_empty());
        assert!(!odds.get(StatMarket::PassYards).unwrap().has_data());
    }
}
