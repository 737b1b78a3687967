//! Cross-bookmaker consensus over the lines of a market.

use linesman::market::OverroundMethod;
use linesman::probs::{clamp_unit, SliceExt};
use serde::Serialize;
use tracing::{debug, trace};

use crate::devig::extract;
use crate::lines::{BookLines, MarketObservations, QuotePair};

/// Median de-vigged probabilities and threshold across the bookmakers quoting a market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsensusSummary {
    /// Median over-probability, across the books that quoted a usable over side.
    pub over_prob: Option<f64>,

    /// Median under-probability, across the books that quoted a usable under side.
    pub under_prob: Option<f64>,

    /// Median threshold; zero when no book quoted a point (yes/no markets).
    pub threshold: f64,

    /// Number of books contributing at least one usable side.
    pub samples: usize,
}
impl ConsensusSummary {
    /// Set when one side was never observed and [`Self::normalised`] must assume its complement.
    pub fn is_assumed(&self) -> bool {
        self.over_prob.is_none() || self.under_prob.is_none()
    }

    /// Over and under probabilities scaled to sum to one. A missing side is assumed to be the
    /// complement of the observed side; `default_over` applies when neither side was observed.
    pub fn normalised(&self, default_over: f64) -> (f64, f64) {
        match (self.over_prob, self.under_prob) {
            (Some(over), Some(under)) if over + under > 0.0 => (over / (over + under), under / (over + under)),
            (Some(over), _) => {
                let over = clamp_unit(over);
                (over, 1.0 - over)
            }
            (None, Some(under)) => {
                let under = clamp_unit(under);
                (1.0 - under, under)
            }
            (None, None) => (default_over, 1.0 - default_over),
        }
    }
}

/// Combines the primary lines of every bookmaker quoting a market. A market quoted only through
/// alternate lines is summarised over those instead. Returns `None` if no book quoted a usable side.
pub fn consensus(observations: &MarketObservations, method: &OverroundMethod) -> Option<ConsensusSummary> {
    summarise(observations, method, |lines| vec![&lines.primary]).or_else(|| {
        let summary = summarise(observations, method, |lines| lines.alternates.iter().collect());
        if summary.is_some() {
            debug!("no usable primary line; consensus taken over alternates");
        }
        summary
    })
}

fn summarise<'a>(
    observations: &'a MarketObservations,
    method: &OverroundMethod,
    select: impl Fn(&'a BookLines) -> Vec<&'a QuotePair>,
) -> Option<ConsensusSummary> {
    let mut overs = Vec::with_capacity(observations.books.len());
    let mut unders = Vec::with_capacity(observations.books.len());
    let mut points = Vec::with_capacity(observations.books.len());
    let mut samples = 0;
    for (book, lines) in &observations.books {
        let mut usable = false;
        for pair in select(lines) {
            let probs = extract(pair, method);
            if probs.is_empty() {
                continue;
            }
            usable = true;
            overs.extend(probs.over);
            unders.extend(probs.under);
            points.extend(pair.point());
        }
        if usable {
            samples += 1;
        } else {
            trace!("{book} contributes no usable line");
        }
    }
    if samples == 0 {
        return None;
    }

    Some(ConsensusSummary {
        over_prob: overs.median(),
        under_prob: unders.median(),
        threshold: points.median().unwrap_or(0.0),
        samples,
    })
}
