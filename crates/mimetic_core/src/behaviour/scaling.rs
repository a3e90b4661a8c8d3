//! Numeric normalisation shared by every controller input and output.

/// Maps `v` from `[min, max]` onto `[-1, 1]`. A degenerate range yields 0.
#[must_use]
pub fn scale(v: f64, min: f64, max: f64) -> f64 {
    if min == max {
        return 0.0;
    }
    2.0 * (v - min) / (max - min) - 1.0
}

const SQUASH_LIMIT: f64 = 1.0 - f64::EPSILON;

/// Logistic curve onto the open interval `(-1, 1)`. NaN maps to 0.
#[must_use]
pub fn squash(v: f64) -> f64 {
    if v.is_nan() {
        return 0.0;
    }
    (v / 2.0).tanh().clamp(-SQUASH_LIMIT, SQUASH_LIMIT)
}

/// Running min/max normaliser for fitness values.
///
/// On tick 0 every value scales to 0 and collapses the bounds onto itself,
/// so the last value seen on that tick seeds the range. From tick 1 on the
/// bounds only ever widen.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FitnessScaler {
    bounds: Option<(f64, f64)>,
}

impl FitnessScaler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Widens the bounds with `v`, then scales it.
    pub fn scale(&mut self, tick: u64, v: f64) -> f64 {
        if tick == 0 {
            if v.is_finite() {
                self.bounds = Some((v, v));
            }
            return 0.0;
        }
        if !v.is_finite() {
            return self.bounds.map_or(0.0, |(min, max)| scale(v, min, max));
        }
        let (min, max) = match self.bounds {
            None => (v, v),
            Some((min, max)) => (min.min(v), max.max(v)),
        };
        self.bounds = Some((min, max));
        scale(v, min, max)
    }

    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }

    pub fn reset(&mut self) {
        self.bounds = None;
    }
}
