//! Standard normal distribution functions.

use std::f64::consts::SQRT_2;

use statrs::function::erf::{erfc, erfc_inv};

/// Φ⁻¹(p), the standard normal quantile. Returns ±∞ at the bounds of the unit interval and `NaN`
/// outside it.
#[inline]
pub fn inv_cdf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        f64::NAN
    } else if p == 0.0 {
        f64::NEG_INFINITY
    } else if p == 1.0 {
        f64::INFINITY
    } else {
        -SQRT_2 * erfc_inv(2.0 * p)
    }
}

/// Φ(x), the standard normal cumulative distribution function.
#[inline]
pub fn cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// P(X ≥ `threshold`) for X ~ N(`mean`, `sigma`²). A non-positive `sigma` degenerates to a point mass
/// at the mean.
pub fn survival(threshold: f64, mean: f64, sigma: f64) -> f64 {
    if sigma <= 0.0 {
        return if mean >= threshold { 1.0 } else { 0.0 };
    }
    cdf((mean - threshold) / sigma)
}
