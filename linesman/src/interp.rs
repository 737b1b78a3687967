//! Interpolation through monotone anchor points and inversion of the interpolant.
//!
//! Anchors are `(x, y)` pairs with strictly increasing abscissae. The inverses assume that the
//! ordinates are non-decreasing, as is the case for a cumulative distribution function that has been
//! passed through [`crate::isotonic::pool_adjacent_violators`]. Queries outside the ordinate range
//! saturate at the outermost abscissae.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InterpError {
    #[error("no anchors")]
    NoAnchors,

    #[error("{abscissae} abscissae but {ordinates} ordinates")]
    LengthMismatch { abscissae: usize, ordinates: usize },

    #[error("non-finite anchor at index {0}")]
    NonFinite(usize),

    #[error("abscissae must be strictly increasing (violated at index {0})")]
    Unordered(usize),
}

pub fn check_anchors(xs: &[f64], ys: &[f64]) -> Result<(), InterpError> {
    if xs.len() != ys.len() {
        return Err(InterpError::LengthMismatch {
            abscissae: xs.len(),
            ordinates: ys.len(),
        });
    }
    if xs.is_empty() {
        return Err(InterpError::NoAnchors);
    }
    for (index, (x, y)) in xs.iter().zip(ys).enumerate() {
        if !x.is_finite() || !y.is_finite() {
            return Err(InterpError::NonFinite(index));
        }
        if index > 0 && *x <= xs[index - 1] {
            return Err(InterpError::Unordered(index));
        }
    }
    Ok(())
}

/// Inverts the piecewise-linear interpolant at ordinate `q`. Within a flat segment, the right-hand
/// abscissa is returned.
pub fn linear_inverse(xs: &[f64], ys: &[f64], q: f64) -> Result<f64, InterpError> {
    check_anchors(xs, ys)?;
    let last = xs.len() - 1;
    if q <= ys[0] {
        return Ok(xs[0]);
    }
    if q >= ys[last] {
        return Ok(xs[last]);
    }
    for index in 1..=last {
        if ys[index] >= q {
            let (x0, x1) = (xs[index - 1], xs[index]);
            let (y0, y1) = (ys[index - 1], ys[index]);
            if y1 == y0 {
                return Ok(x1);
            }
            let t = (q - y0) / (y1 - y0);
            return Ok(x0 + t * (x1 - x0));
        }
    }
    Ok(xs[last])
}

/// Piecewise cubic Hermite interpolant with Fritsch–Carlson slopes, which preserves the
/// monotonicity of the anchors between them.
#[derive(Debug, Clone)]
pub struct Pchip {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}
impl Pchip {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, InterpError> {
        check_anchors(&xs, &ys)?;
        let slopes = fritsch_carlson_slopes(&xs, &ys);
        Ok(Self { xs, ys, slopes })
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn slopes(&self) -> &[f64] {
        &self.slopes
    }

    /// Evaluates the interpolant at `x`, saturating at the outermost anchors.
    pub fn eval(&self, x: f64) -> f64 {
        let last = self.xs.len() - 1;
        if x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[last] {
            return self.ys[last];
        }
        let segment = self.xs.partition_point(|&anchor| anchor <= x) - 1;
        let h = self.xs[segment + 1] - self.xs[segment];
        let t = (x - self.xs[segment]) / h;
        self.hermite(segment, h, t).0
    }

    /// Solves `eval(x) = q` by Newton iteration in the parametric coordinate of the segment that
    /// brackets `q`, starting from the linear estimate. At most `max_newton_steps` steps are taken;
    /// the coordinate is kept inside `[0, 1]` throughout.
    pub fn inverse(&self, q: f64, max_newton_steps: usize) -> f64 {
        let last = self.xs.len() - 1;
        if last == 0 || q <= self.ys[0] {
            return self.xs[0];
        }
        if q >= self.ys[last] {
            return self.xs[last];
        }
        let segment = (0..last)
            .find(|&index| self.ys[index] <= q && q <= self.ys[index + 1])
            .unwrap_or(0);
        let (x0, x1) = (self.xs[segment], self.xs[segment + 1]);
        let (y0, y1) = (self.ys[segment], self.ys[segment + 1]);
        if y1 == y0 {
            return x1;
        }

        let h = x1 - x0;
        let mut t = ((q - y0) / (y1 - y0)).clamp(0.0, 1.0);
        for _ in 0..max_newton_steps {
            let (y_t, dy_dt) = self.hermite(segment, h, t);
            if dy_dt == 0.0 {
                break;
            }
            t = (t - (y_t - q) / dy_dt).clamp(0.0, 1.0);
        }
        x0 + t * h
    }

    /// Value and parametric derivative of the Hermite cubic on `segment` at coordinate `t`.
    #[inline]
    fn hermite(&self, segment: usize, h: f64, t: f64) -> (f64, f64) {
        let (y0, y1) = (self.ys[segment], self.ys[segment + 1]);
        let (m0, m1) = (self.slopes[segment] * h, self.slopes[segment + 1] * h);
        let t2 = t * t;
        let t3 = t2 * t;
        let value = (2.0 * t3 - 3.0 * t2 + 1.0) * y0
            + (t3 - 2.0 * t2 + t) * m0
            + (-2.0 * t3 + 3.0 * t2) * y1
            + (t3 - t2) * m1;
        let derivative = 6.0 * (t2 - t) * y0
            + (3.0 * t2 - 4.0 * t + 1.0) * m0
            + 6.0 * (t - t2) * y1
            + (3.0 * t2 - 2.0 * t) * m1;
        (value, derivative)
    }
}

fn fritsch_carlson_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    if n <= 1 {
        return vec![0.0; n];
    }
    let h: Vec<_> = xs.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let delta: Vec<_> = ys
        .windows(2)
        .zip(&h)
        .map(|(pair, h)| (pair[1] - pair[0]) / h)
        .collect();

    let mut slopes = vec![0.0; n];
    for i in 1..n - 1 {
        if delta[i - 1] * delta[i] > 0.0 {
            let w1 = 2.0 * h[i] + h[i - 1];
            let w2 = h[i] + 2.0 * h[i - 1];
            slopes[i] = (w1 + w2) / (w1 / delta[i - 1] + w2 / delta[i]);
        }
    }

    if n == 2 {
        slopes[0] = delta[0];
        slopes[1] = delta[0];
    } else {
        slopes[0] = endpoint_slope(h[0], h[1], delta[0], delta[1]);
        slopes[n - 1] = endpoint_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    }
    slopes
}

/// Three-point endpoint slope, limited so that it neither reverses the sign of the adjacent secant
/// nor exceeds three times its magnitude.
#[inline]
fn endpoint_slope(h_near: f64, h_far: f64, delta_near: f64, delta_far: f64) -> f64 {
    let slope = ((2.0 * h_near + h_far) * delta_near - h_near * delta_far) / (h_near + h_far);
    if slope * delta_near < 0.0 {
        0.0
    } else if slope.abs() > 3.0 * delta_near.abs() {
        3.0 * delta_near
    } else {
        slope
    }
}
