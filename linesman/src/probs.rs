//! Utilities for working with probabilities.

pub trait SliceExt {
    fn sum(&self) -> f64;
    fn normalise(&mut self, target: f64) -> f64;
    fn scale(&mut self, factor: f64);
    fn invert(&self) -> impl Iterator<Item = f64> + '_;
    fn median(&self) -> Option<f64>;
}
impl SliceExt for [f64] {
    fn sum(&self) -> f64 {
        self.iter().sum()
    }

    fn normalise(&mut self, target: f64) -> f64 {
        let sum = self.sum();
        self.scale(target / sum);
        sum
    }

    fn scale(&mut self, factor: f64) {
        for element in self {
            *element *= factor;
        }
    }

    fn invert(&self) -> impl Iterator<Item = f64> + '_ {
        self.iter().map(|value| 1.0 / value)
    }

    /// Middle value of the slice; the mean of the two middle values for an even-length slice.
    /// `NaN`s are ignored.
    fn median(&self) -> Option<f64> {
        let mut sorted: Vec<_> = self.iter().copied().filter(|value| !value.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }
}

/// Clamps `prob` into the closed unit interval.
#[inline]
pub fn clamp_unit(prob: f64) -> f64 {
    prob.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;
    use linesman_testing::assert_slice_f64_near;

    #[test]
    fn sum() {
        let data = [0.0, 0.1, 0.2];
        assert_f64_near!(0.3, data.sum(), 1);
    }

    #[test]
    fn normalise() {
        let mut data = [0.05, 0.1, 0.15, 0.2];
        let sum = data.normalise(1.0);
        assert_f64_near!(0.5, sum, 1);
        assert_slice_f64_near(&[0.1, 0.2, 0.3, 0.4], &data, 1);
    }

    #[test]
    fn invert() {
        let prices = [2.0, 4.0, 1.25];
        let probs: Vec<_> = prices.invert().collect();
        assert_slice_f64_near(&[0.5, 0.25, 0.8], &probs, 1);
    }

    #[test]
    fn median_odd() {
        assert_eq!(Some(0.55), [0.6, 0.5, 0.55].median());
    }

    #[test]
    fn median_even() {
        assert_f64_near!(0.525, [0.6, 0.5, 0.55, 0.45].median().unwrap(), 2);
    }

    #[test]
    fn median_ignores_nan() {
        assert_eq!(Some(2.0), [f64::NAN, 1.0, 3.0, 2.0].median());
    }

    #[test]
    fn median_empty() {
        let empty: [f64; 0] = [];
        assert_eq!(None, empty.median());
        assert_eq!(None, [f64::NAN].median());
    }

    #[test]
    fn clamp_unit_bounds() {
        assert_eq!(0.0, clamp_unit(-0.2));
        assert_eq!(0.3, clamp_unit(0.3));
        assert_eq!(1.0, clamp_unit(1.7));
    }
}
