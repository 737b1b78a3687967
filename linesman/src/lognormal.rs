//! Two-point lognormal fitting, used to extrapolate a CDF beyond its outermost anchors.

use crate::normal;

/// Smallest value admitted into the logarithm; also bounds the CDF levels away from 0 and 1.
pub const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct LogNormal {
    pub mu: f64,
    pub sigma: f64,
}
impl LogNormal {
    /// Fits the lognormal whose CDF passes through `(x1, f1)` and `(x2, f2)`. Returns `None` when the two
    /// levels coincide (after clamping) or the fit is not finite.
    pub fn fit_two_point((x1, f1): (f64, f64), (x2, f2): (f64, f64)) -> Option<Self> {
        let z1 = normal::inv_cdf(f1.clamp(EPSILON, 1.0 - EPSILON));
        let z2 = normal::inv_cdf(f2.clamp(EPSILON, 1.0 - EPSILON));
        if z1 == z2 {
            return None;
        }
        let lx1 = f64::max(x1, EPSILON).ln();
        let lx2 = f64::max(x2, EPSILON).ln();
        let sigma = ((lx2 - lx1) / (z2 - z1)).abs();
        let mu = lx1 - sigma * z1;
        if mu.is_finite() && sigma.is_finite() {
            Some(Self { mu, sigma })
        } else {
            None
        }
    }

    pub fn quantile(&self, q: f64) -> f64 {
        let z = normal::inv_cdf(q.clamp(EPSILON, 1.0 - EPSILON));
        (self.mu + self.sigma * z).exp()
    }

    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        if self.sigma == 0.0 {
            return if x.ln() >= self.mu { 1.0 } else { 0.0 };
        }
        normal::cdf((x.ln() - self.mu) / self.sigma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn fit_passes_through_anchors() {
        let fitted = LogNormal::fit_two_point((40.0, 0.3), (60.0, 0.6)).unwrap();
        assert!(fitted.sigma > 0.0);
        assert_float_absolute_eq!(0.3, fitted.cdf(40.0), 1e-7);
        assert_float_absolute_eq!(0.6, fitted.cdf(60.0), 1e-7);
        assert_float_relative_eq!(40.0, fitted.quantile(0.3), 1e-7);
        assert_float_relative_eq!(60.0, fitted.quantile(0.6), 1e-7);
    }

    #[test]
    fn fit_extrapolates_tails() {
        let fitted = LogNormal::fit_two_point((40.0, 0.3), (60.0, 0.6)).unwrap();
        assert!(fitted.quantile(0.15) < 40.0);
        assert!(fitted.quantile(0.85) > 60.0);
    }

    #[test]
    fn fit_median() {
        let fitted = LogNormal::fit_two_point((50.0, 0.5), (100.0, 0.841344746068543)).unwrap();
        assert_float_absolute_eq!(50f64.ln(), fitted.mu, 1e-6);
        assert_float_absolute_eq!(2f64.ln(), fitted.sigma, 1e-6);
    }

    #[test]
    fn fit_reversed_levels_takes_absolute_sigma() {
        let fitted = LogNormal::fit_two_point((40.0, 0.6), (60.0, 0.3)).unwrap();
        assert!(fitted.sigma > 0.0);
    }

    #[test]
    fn fit_degenerate() {
        assert_eq!(None, LogNormal::fit_two_point((40.0, 0.5), (60.0, 0.5)));
        // both levels clamp to the same bound
        assert_eq!(None, LogNormal::fit_two_point((40.0, 0.0), (60.0, -1.0)));
    }

    #[test]
    fn fit_clamps_non_positive_abscissae() {
        let fitted = LogNormal::fit_two_point((0.0, 0.1), (10.0, 0.5)).unwrap();
        assert!(fitted.mu.is_finite());
        assert!(fitted.quantile(0.85).is_finite());
    }
}
