//! Testing helpers.

use assert_float_eq::*;
use tinyrand::{Rand, StdRand};

pub fn assert_slice_f64_near(expected: &[f64], actual: &[f64], distance: u32) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_f64_near!(expected, actual, distance);
        }
    }
}

pub fn assert_slice_f64_relative(expected: &[f64], actual: &[f64], epsilon: f64) {
    assert_eq!(
        expected.len(),
        actual.len(),
        "lengths do not match: {} ≠ {}",
        expected.len(),
        actual.len()
    );
    for (index, &expected) in expected.iter().enumerate() {
        let actual = actual[index];
        if actual != expected {
            assert_float_relative_eq!(expected, actual, epsilon);
        }
    }
}

/// Asserts that every element is no smaller than its predecessor.
pub fn assert_nondecreasing(values: &[f64]) {
    for window in values.windows(2) {
        assert!(
            window[0] <= window[1],
            "sequence decreases from {} to {} in {values:?}",
            window[0],
            window[1]
        );
    }
}

/// Deterministic source of uniform draws in `[0, 1)` for property-style tests.
pub struct UnitRand(StdRand);

impl Default for UnitRand {
    fn default() -> Self {
        Self(StdRand::default())
    }
}

impl UnitRand {
    pub fn next_f64(&mut self) -> f64 {
        // the top 53 bits fill the mantissa exactly, so the result stays below 1
        (self.0.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn next_between(&mut self, low: f64, high: f64) -> f64 {
        low + self.next_f64() * (high - low)
    }
}
