//! Per-bookmaker extraction of fair probabilities from a line.

use linesman::market::{implied_prob, Market, OverroundMethod};
use linesman::probs::clamp_unit;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::lines::{Quote, QuotePair};

#[derive(Debug, Error, PartialEq)]
pub enum InvalidQuote {
    #[error("missing price")]
    MissingPrice,

    #[error("price {0} does not imply a probability")]
    UnusablePrice(f64),
}

/// The implied probability of a single quote.
pub fn implied(quote: &Quote) -> Result<f64, InvalidQuote> {
    let price = quote.price.ok_or(InvalidQuote::MissingPrice)?;
    implied_prob(price).ok_or(InvalidQuote::UnusablePrice(price))
}

/// Over and under probabilities extracted from one line. A side is absent when it was not quoted
/// or its quote was unusable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SideProbs {
    pub over: Option<f64>,
    pub under: Option<f64>,
}
impl SideProbs {
    pub fn is_empty(&self) -> bool {
        self.over.is_none() && self.under.is_none()
    }

    pub fn is_two_sided(&self) -> bool {
        self.over.is_some() && self.under.is_some()
    }

    /// P(X > point), the survival anchor for this line. A one-sided over quote is taken at face
    /// value; a one-sided under quote is complemented.
    pub fn survival(&self) -> Option<f64> {
        match (self.over, self.under) {
            (Some(over), _) => Some(clamp_unit(over)),
            (None, Some(under)) => Some(clamp_unit(1.0 - under)),
            (None, None) => None,
        }
    }
}

/// Extracts de-vigged probabilities from a line. Two usable sides are fitted with `method` so that they
/// sum to one; a lone usable side keeps its raw implied probability and leaves the other side unknown.
pub fn extract(pair: &QuotePair, method: &OverroundMethod) -> SideProbs {
    let over = usable(pair.over.as_ref(), "over");
    let under = usable(pair.under.as_ref(), "under");
    match (over, under) {
        (Some((over_price, over_prob)), Some((under_price, under_prob))) => {
            match Market::fit(method, vec![over_price, under_price], 1.0) {
                Ok(market) => SideProbs {
                    over: Some(market.probs[0]),
                    under: Some(market.probs[1]),
                },
                Err(err) => {
                    trace!("falling back to multiplicative overround: {err}");
                    let sum = over_prob + under_prob;
                    SideProbs {
                        over: Some(over_prob / sum),
                        under: Some(under_prob / sum),
                    }
                }
            }
        }
        (over, under) => SideProbs {
            over: over.map(|(_, prob)| prob),
            under: under.map(|(_, prob)| prob),
        },
    }
}

/// The price and implied probability of a quote, if usable.
fn usable(quote: Option<&Quote>, side: &str) -> Option<(f64, f64)> {
    let quote = quote?;
    match implied(quote) {
        Ok(prob) => quote.price.map(|price| (price, prob)),
        Err(err) => {
            trace!("rejected {side} quote {quote:?}: {err}");
            None
        }
    }
}
