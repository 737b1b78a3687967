//! Floor/mid/ceiling ranges and the quantile levels that define them.

use serde::{Deserialize, Serialize};

use crate::domain::Quantile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileLevels {
    pub floor: f64,
    pub mid: f64,
    pub ceiling: f64,
}
impl QuantileLevels {
    pub fn get(&self, quantile: Quantile) -> f64 {
        match quantile {
            Quantile::Floor => self.floor,
            Quantile::Mid => self.mid,
            Quantile::Ceiling => self.ceiling,
        }
    }
}
impl Default for QuantileLevels {
    fn default() -> Self {
        Self {
            floor: 0.15,
            mid: 0.5,
            ceiling: 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatRange {
    pub floor: f64,
    pub mid: f64,
    pub ceiling: f64,
}
impl StatRange {
    pub fn new(floor: f64, mid: f64, ceiling: f64) -> Self {
        Self { floor, mid, ceiling }
    }

    /// A naive band of ±`fraction` around `mean`.
    pub fn band(mean: f64, fraction: f64) -> Self {
        Self {
            floor: mean * (1.0 - fraction),
            mid: mean,
            ceiling: mean * (1.0 + fraction),
        }
        .clamped()
    }

    pub fn get(&self, quantile: Quantile) -> f64 {
        match quantile {
            Quantile::Floor => self.floor,
            Quantile::Mid => self.mid,
            Quantile::Ceiling => self.ceiling,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.floor.is_finite() && self.mid.is_finite() && self.ceiling.is_finite()
    }

    /// Clamps every point to be non-negative, then widens the floor and ceiling as needed so that
    /// `floor ≤ mid ≤ ceiling`.
    pub fn clamped(self) -> Self {
        let (floor, mid, ceiling) = (self.floor.max(0.0), self.mid.max(0.0), self.ceiling.max(0.0));
        Self {
            floor: floor.min(mid),
            mid,
            ceiling: ceiling.max(mid),
        }
    }
}
